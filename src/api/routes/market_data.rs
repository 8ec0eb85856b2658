//! Market data proxy endpoints

use super::{upstream_error, RouteError};
use crate::api::server::AppState;
use crate::market_data::MarketDataClient;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct BestBidAskQuery {
    pub symbol: Option<String>,
}

/// Raw best bid/ask response for `symbol` (BTC-USD when omitted)
pub async fn best_bid_ask(
    State(state): State<AppState>,
    Query(query): Query<BestBidAskQuery>,
) -> Result<Json<Value>, RouteError> {
    let symbol = query
        .symbol
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "BTC-USD".to_string());
    info!("Fetching best bid/ask for {}", symbol);

    let quote: Value = state
        .broker
        .get(&MarketDataClient::quote_path(&symbol))
        .await
        .map_err(|e| upstream_error("Failed to fetch market data", e))?;

    Ok(Json(quote))
}
