//! Axum server setup and configuration

use crate::api::rate_limit::{limit_by_ip, RateLimiter};
use crate::api::routes;
use crate::broker::BrokerClient;
use crate::config::Config;
use crate::errors::ApiError;
use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<BrokerClient>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let broker = BrokerClient::from_config(config)?;
        Ok(Self::with_broker(Arc::new(broker), config.proxy.rate_limit_per_minute))
    }

    pub fn with_broker(broker: Arc<BrokerClient>, rate_limit_per_minute: u32) -> Self {
        Self {
            broker,
            limiter: Arc::new(RateLimiter::per_minute(rate_limit_per_minute)),
        }
    }
}

/// Create the Axum application with all routes
///
/// The rate limiter reads the peer address, so the router must be served
/// with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let proxy_routes = Router::new()
        .route("/fetch_account", get(routes::account::fetch_account))
        .route("/crypto_account_details", get(routes::account::crypto_account_details))
        .route("/crypto_holdings", get(routes::account::crypto_holdings))
        .route("/crypto_orders", get(routes::orders::crypto_orders))
        .route("/place_order", post(routes::orders::place_order))
        .route("/best_bid_ask", get(routes::market_data::best_bid_ask))
        .route_layer(middleware::from_fn_with_state(state.clone(), limit_by_ip));

    Router::new()
        .route("/", get(home))
        .nest("/proxy", proxy_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness check
async fn home() -> Json<Value> {
    Json(json!({ "message": "Crypto trading proxy is live" }))
}
