//! Order history and order placement proxy endpoints

use super::{bad_request, upstream_error, RouteError};
use crate::api::server::AppState;
use crate::broker::endpoints;
use crate::types::{validate_amount, OrderRequest, OrderType, Side, TimeInForce};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

/// Order history filters, forwarded only when supplied
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub created_at_start: Option<String>,
    pub created_at_end: Option<String>,
    pub symbol: Option<String>,
    pub id: Option<String>,
    pub side: Option<String>,
    pub state: Option<String>,
    #[serde(rename = "type")]
    pub order_type: Option<String>,
    pub updated_at_start: Option<String>,
    pub updated_at_end: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<String>,
}

impl OrdersQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        super::supplied(&[
            ("created_at_start", &self.created_at_start),
            ("created_at_end", &self.created_at_end),
            ("symbol", &self.symbol),
            ("id", &self.id),
            ("side", &self.side),
            ("state", &self.state),
            ("type", &self.order_type),
            ("updated_at_start", &self.updated_at_start),
            ("updated_at_end", &self.updated_at_end),
            ("cursor", &self.cursor),
            ("limit", &self.limit),
        ])
    }
}

pub async fn crypto_orders(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Value>, RouteError> {
    let path = endpoints::with_query(endpoints::ORDERS, &query.params());
    info!("Fetching crypto orders: {}", path);

    let orders: Value = state
        .broker
        .get(&path)
        .await
        .map_err(|e| upstream_error("Failed to fetch crypto orders", e))?;

    Ok(Json(orders))
}

/// Body of `POST /proxy/place_order`
#[derive(Debug, Deserialize)]
pub struct PlaceOrderBody {
    pub symbol: Option<String>,
    pub side: Option<String>,
    #[serde(rename = "type")]
    pub order_type: Option<String>,
    pub usd_amount: Option<f64>,
    pub limit_price: Option<f64>,
    pub time_in_force: Option<String>,
}

impl PlaceOrderBody {
    /// Validate and build the outgoing order. Errors are client mistakes.
    pub fn into_order(self) -> Result<OrderRequest, String> {
        let symbol = required(self.symbol, "symbol")?.to_uppercase();
        let side = required(self.side, "side")?;
        let order_type = required(self.order_type, "type")?;

        let side = side.parse::<Side>().map_err(|e| e.to_string())?;
        let order_type = order_type
            .parse::<OrderType>()
            .map_err(|_| "Unsupported order type".to_string())?;

        match order_type {
            OrderType::Market => {
                let usd_amount = self
                    .usd_amount
                    .ok_or_else(|| "usd_amount required for market orders".to_string())?;
                validate_amount("usd_amount", usd_amount).map_err(|e| e.to_string())?;
                Ok(OrderRequest::market_quote(&symbol, side, usd_amount))
            }
            OrderType::Limit => {
                let limit_price = self
                    .limit_price
                    .ok_or_else(|| "Missing field: limit_price".to_string())?;
                let usd_amount = self
                    .usd_amount
                    .ok_or_else(|| "Missing field: usd_amount".to_string())?;
                validate_amount("limit_price", limit_price).map_err(|e| e.to_string())?;
                validate_amount("usd_amount", usd_amount).map_err(|e| e.to_string())?;

                let time_in_force = match self.time_in_force.as_deref() {
                    Some(raw) => raw.parse::<TimeInForce>().map_err(|e| e.to_string())?,
                    None => TimeInForce::default(),
                };
                Ok(OrderRequest::limit(&symbol, side, limit_price, usd_amount, time_in_force))
            }
        }
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("Missing field: {}", field))
}

/// Place a market (quote amount) or limit order
pub async fn place_order(
    State(state): State<AppState>,
    payload: Result<Json<PlaceOrderBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), RouteError> {
    let Json(body) = payload.map_err(|e| bad_request(format!("No JSON body provided: {}", e.body_text())))?;
    let order = body.into_order().map_err(bad_request)?;

    let payload = serde_json::to_string(&order)
        .map_err(|e| upstream_error("Order failed", e))?;
    info!(
        "Placing {} {:?} order for {} client_order_id={}",
        order.side, order.order_type, order.symbol, order.client_order_id
    );

    match state.broker.post::<Value>(endpoints::ORDERS, &payload).await {
        Ok(response) => {
            info!("Order placed: {}", response);
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(e) => {
            error!("Order failed: {}", e);
            Err(upstream_error("Order failed", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::server::testing::*;
    use crate::broker::testing::ScriptedTransport;
    use crate::errors::ApiError;
    use axum::http::StatusCode;
    use serde_json::Value;
    use uuid::Uuid;

    const ACCEPTED: &str = r#"{"id":"497d-order","state":"open"}"#;

    async fn place(transport: std::sync::Arc<ScriptedTransport>, body: &str) -> (StatusCode, Value) {
        send(app(transport, 10), post_json("/proxy/place_order", body)).await
    }

    #[tokio::test]
    async fn test_market_order_uses_quote_amount() {
        let transport = ScriptedTransport::new(vec![Ok(ACCEPTED.to_string())]);
        let (status, body) = place(
            transport.clone(),
            r#"{"symbol":"btc-usd","side":"BUY","type":"Market","usd_amount":5}"#,
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "497d-order");

        let sent = &transport.recorded()[0];
        assert_eq!(sent.path, "/api/v1/crypto/trading/orders/");
        let order: Value = serde_json::from_str(&sent.body).unwrap();
        assert_eq!(order["symbol"], "BTC-USD");
        assert_eq!(order["side"], "buy");
        assert_eq!(order["type"], "market");
        assert_eq!(order["market_order_config"]["quote_amount"], "5.00");
        assert!(order["market_order_config"].get("asset_quantity").is_none());
        assert!(Uuid::parse_str(order["client_order_id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_limit_order_defaults_to_gtc() {
        let transport = ScriptedTransport::new(vec![Ok(ACCEPTED.to_string())]);
        let (status, _) = place(
            transport.clone(),
            r#"{"symbol":"ETH-USD","side":"sell","type":"limit","usd_amount":25.5,"limit_price":3150.126}"#,
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        let order: Value = serde_json::from_str(&transport.recorded()[0].body).unwrap();
        assert_eq!(order["type"], "limit");
        assert_eq!(order["limit_order_config"]["limit_price"], "3150.13");
        assert_eq!(order["limit_order_config"]["quote_amount"], "25.50");
        assert_eq!(order["limit_order_config"]["time_in_force"], "gtc");
    }

    #[tokio::test]
    async fn test_client_errors_are_400_without_network() {
        let cases = [
            (r#"{"side":"buy","type":"market","usd_amount":5}"#, "Missing field: symbol"),
            (r#"{"symbol":"BTC-USD","type":"market","usd_amount":5}"#, "Missing field: side"),
            (r#"{"symbol":"BTC-USD","side":"buy","usd_amount":5}"#, "Missing field: type"),
            (r#"{"symbol":"BTC-USD","side":"buy","type":"stop_loss","usd_amount":5}"#, "Unsupported order type"),
            (r#"{"symbol":"BTC-USD","side":"buy","type":"market"}"#, "usd_amount required for market orders"),
            (r#"{"symbol":"BTC-USD","side":"buy","type":"limit","usd_amount":5}"#, "Missing field: limit_price"),
        ];

        for (request, expected) in cases {
            let transport = ScriptedTransport::new(vec![]);
            let (status, body) = place(transport.clone(), request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", request);
            assert_eq!(body["error"], expected);
            assert!(transport.recorded().is_empty());
        }
    }

    #[tokio::test]
    async fn test_bad_side_and_amount_rejected() {
        for request in [
            r#"{"symbol":"BTC-USD","side":"hold","type":"market","usd_amount":5}"#,
            r#"{"symbol":"BTC-USD","side":"buy","type":"market","usd_amount":0}"#,
        ] {
            let (status, _) = place(ScriptedTransport::new(vec![]), request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_missing_body_is_400() {
        let (status, body) = send(
            app(ScriptedTransport::new(vec![]), 10),
            post_json("/proxy/place_order", ""),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("No JSON body provided"));
    }

    #[tokio::test]
    async fn test_rejected_order_is_500_with_details() {
        let transport = ScriptedTransport::new(vec![Err(ApiError::from_response(
            400,
            r#"{"errors":[{"detail":"Insufficient buying power"}]}"#,
        ))]);
        let (status, body) = place(
            transport,
            r#"{"symbol":"BTC-USD","side":"buy","type":"market","usd_amount":5}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Order failed");
        assert!(body["details"].as_str().unwrap().contains("Insufficient buying power"));
    }

    #[tokio::test]
    async fn test_order_history_forwards_filters() {
        let transport = ScriptedTransport::new(vec![Ok(r#"{"results":[],"next":null}"#.to_string())]);
        let (status, _) = send(
            app(transport.clone(), 10),
            get_request("/proxy/crypto_orders?symbol=BTC-USD&type=limit&limit=20"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            transport.recorded()[0].path,
            "/api/v1/crypto/trading/orders/?symbol=BTC-USD&type=limit&limit=20"
        );
    }
}
