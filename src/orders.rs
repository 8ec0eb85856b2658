//! Order submission for the trading API

use crate::broker::{endpoints, BrokerClient};
use crate::config::QuotePricing;
use crate::errors::OrderError;
use crate::market_data::PriceFeed;
use crate::types::{format_quantity, validate_amount, OrderRequest, OrderResult, Side};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};

/// Places USD-denominated market orders
#[async_trait]
pub trait OrderPlacer: Send + Sync {
    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        usd_amount: f64,
    ) -> Result<OrderResult, OrderError>;
}

/// Asset quantity worth `usd_amount` at `price`
pub fn quantity_for(usd_amount: f64, price: f64) -> f64 {
    usd_amount / price
}

/// Order client over the signed trading API
pub struct OrderClient {
    broker: Arc<BrokerClient>,
    feed: Arc<dyn PriceFeed>,
    pricing: QuotePricing,
}

impl OrderClient {
    pub fn new(broker: Arc<BrokerClient>, feed: Arc<dyn PriceFeed>, pricing: QuotePricing) -> Self {
        Self {
            broker,
            feed,
            pricing,
        }
    }

    /// Submit a market order for `usd_amount` worth of `symbol`.
    ///
    /// Prices the order from a fresh quote; the caller's own price is never
    /// reused because execution price may differ from the signal price.
    pub async fn submit(
        &self,
        symbol: &str,
        side: Side,
        usd_amount: f64,
    ) -> Result<OrderResult, OrderError> {
        if symbol.trim().is_empty() {
            return Err(OrderError::Validation("symbol must not be empty".to_string()));
        }
        validate_amount("usd_amount", usd_amount)?;

        let quote = self.feed.fetch_quote(symbol).await?;
        let price = quote.price_for(side, self.pricing)?;
        let quantity = quantity_for(usd_amount, price);

        let formatted = format_quantity(quantity);
        if formatted.parse::<f64>().map_or(true, |q| q <= 0.0) {
            return Err(OrderError::Validation(format!(
                "${} of {} at {} rounds to a zero quantity ({})",
                usd_amount, symbol, price, formatted
            )));
        }

        let request = OrderRequest::market_quantity(symbol, side, quantity);
        info!(
            "Placing {} order: {} {:.8} at ~{} (${}) client_order_id={}",
            side, symbol, quantity, price, usd_amount, request.client_order_id
        );

        let result: OrderResult = self.place(&request).await?;
        info!("Order accepted: id={} status={}", result.order_id, result.status);
        Ok(result)
    }

    /// POST a prepared order body and decode the response as `T`
    pub async fn place<T: DeserializeOwned>(&self, request: &OrderRequest) -> Result<T, OrderError> {
        let body = serde_json::to_string(request)
            .map_err(|e| OrderError::Validation(format!("order body not serializable: {}", e)))?;
        debug!("Order payload: {}", body);

        Ok(self.broker.post(endpoints::ORDERS, &body).await?)
    }
}

#[async_trait]
impl OrderPlacer for OrderClient {
    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        usd_amount: f64,
    ) -> Result<OrderResult, OrderError> {
        self.submit(symbol, side, usd_amount).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::testing::{broker, ScriptedTransport, TEST_SEED};
    use crate::errors::ApiError;
    use crate::market_data::MarketDataClient;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use ed25519_dalek::{Signature, Verifier};
    use reqwest::Method;
    use serde_json::Value;
    use uuid::Uuid;

    const QUOTE: &str = r#"{"results":[{"symbol":"BTC-USD","ask_inclusive_of_buy_spread":"60000.00","bid_inclusive_of_sell_spread":"50000.00"}]}"#;
    const ACCEPTED: &str = r#"{"id":"4f2c-order","state":"open","side":"buy"}"#;

    fn client(transport: Arc<ScriptedTransport>, pricing: QuotePricing) -> OrderClient {
        let broker = broker(transport);
        let feed = Arc::new(MarketDataClient::new(broker.clone()));
        OrderClient::new(broker, feed, pricing)
    }

    #[tokio::test]
    async fn test_submit_fetches_fresh_price_then_posts() {
        let transport = ScriptedTransport::new(vec![Ok(QUOTE.to_string()), Ok(ACCEPTED.to_string())]);
        let orders = client(transport.clone(), QuotePricing::AskOnly);

        let result = orders.submit("BTC-USD", Side::Buy, 5.0).await.unwrap();
        assert_eq!(result.order_id, "4f2c-order");
        assert_eq!(result.status, "open");

        let recorded = transport.recorded();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].method, Method::GET);
        assert_eq!(recorded[1].method, Method::POST);
        assert_eq!(recorded[1].path, "/api/v1/crypto/trading/orders/");

        let body: Value = serde_json::from_str(&recorded[1].body).unwrap();
        assert_eq!(body["side"], "buy");
        assert_eq!(body["symbol"], "BTC-USD");
        assert_eq!(body["type"], "market");
        assert_eq!(body["market_order_config"]["asset_quantity"], "0.00008333");
        assert!(Uuid::parse_str(body["client_order_id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_order_signature_covers_body() {
        let transport = ScriptedTransport::new(vec![Ok(QUOTE.to_string()), Ok(ACCEPTED.to_string())]);
        let orders = client(transport.clone(), QuotePricing::AskOnly);
        orders.submit("BTC-USD", Side::Buy, 5.0).await.unwrap();

        let post = &transport.recorded()[1];
        let expected_message = format!(
            "rh-api-test{}/api/v1/crypto/trading/orders/POST{}",
            post.timestamp, post.body
        );
        assert_eq!(post.message(), expected_message);

        let verifying = ed25519_dalek::SigningKey::from_bytes(&TEST_SEED).verifying_key();
        let raw = STANDARD.decode(&post.signature).unwrap();
        let signature = Signature::from_slice(&raw).unwrap();
        assert!(verifying.verify(expected_message.as_bytes(), &signature).is_ok());
    }

    #[tokio::test]
    async fn test_sell_uses_bid_when_pricing_by_side() {
        let transport = ScriptedTransport::new(vec![Ok(QUOTE.to_string()), Ok(ACCEPTED.to_string())]);
        let orders = client(transport.clone(), QuotePricing::BySide);
        orders.submit("BTC-USD", Side::Sell, 5.0).await.unwrap();

        let body: Value = serde_json::from_str(&transport.recorded()[1].body).unwrap();
        assert_eq!(body["side"], "sell");
        assert_eq!(body["market_order_config"]["asset_quantity"], "0.00010000");
    }

    #[tokio::test]
    async fn test_each_submission_gets_new_client_order_id() {
        let transport = ScriptedTransport::new(vec![
            Ok(QUOTE.to_string()),
            Ok(ACCEPTED.to_string()),
            Ok(QUOTE.to_string()),
            Ok(ACCEPTED.to_string()),
        ]);
        let orders = client(transport.clone(), QuotePricing::AskOnly);
        orders.submit("BTC-USD", Side::Buy, 5.0).await.unwrap();
        orders.submit("BTC-USD", Side::Buy, 5.0).await.unwrap();

        let recorded = transport.recorded();
        let first: Value = serde_json::from_str(&recorded[1].body).unwrap();
        let second: Value = serde_json::from_str(&recorded[3].body).unwrap();
        assert_ne!(first["client_order_id"], second["client_order_id"]);
    }

    #[tokio::test]
    async fn test_validation_happens_before_network() {
        let transport = ScriptedTransport::new(vec![]);
        let orders = client(transport.clone(), QuotePricing::AskOnly);

        assert!(matches!(
            orders.submit("BTC-USD", Side::Buy, 0.0).await,
            Err(OrderError::Validation(_))
        ));
        assert!(matches!(
            orders.submit("BTC-USD", Side::Sell, -5.0).await,
            Err(OrderError::Validation(_))
        ));
        assert!(matches!(
            orders.submit("  ", Side::Buy, 5.0).await,
            Err(OrderError::Validation(_))
        ));
        assert!(transport.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_order_carries_upstream_diagnostic() {
        let transport = ScriptedTransport::new(vec![
            Ok(QUOTE.to_string()),
            Err(ApiError::from_response(400, r#"{"errors":[{"detail":"Insufficient buying power"}]}"#)),
        ]);
        let orders = client(transport, QuotePricing::AskOnly);

        let err = orders.submit("BTC-USD", Side::Buy, 5.0).await.unwrap_err();
        assert!(err.to_string().contains("Insufficient buying power"));
    }

    #[tokio::test]
    async fn test_price_failure_aborts_before_post() {
        let transport = ScriptedTransport::new(vec![Ok(r#"{"results":[]}"#.to_string())]);
        let orders = client(transport.clone(), QuotePricing::AskOnly);

        let err = orders.submit("BTC-USD", Side::Buy, 5.0).await.unwrap_err();
        assert!(matches!(err, OrderError::Api(ApiError::MarketData(_))));
        assert_eq!(transport.recorded().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected_before_post() {
        let quote = r#"{"results":[{"ask_inclusive_of_buy_spread":"10000000000000.00"}]}"#;
        let transport = ScriptedTransport::new(vec![Ok(quote.to_string()), Ok(ACCEPTED.to_string())]);
        let orders = client(transport.clone(), QuotePricing::AskOnly);

        let err = orders.submit("BTC-USD", Side::Buy, 5.0).await.unwrap_err();
        assert!(matches!(err, OrderError::Validation(ref m) if m.contains("0.00000000")));
        assert_eq!(transport.recorded().len(), 1);
    }

    #[tokio::test]
    async fn test_unusable_bid_ignored_when_pricing_from_ask() {
        let quote = r#"{"results":[{"ask_inclusive_of_buy_spread":"60000.00","bid_inclusive_of_sell_spread":"0"}]}"#;
        let transport = ScriptedTransport::new(vec![Ok(quote.to_string()), Ok(ACCEPTED.to_string())]);
        let orders = client(transport.clone(), QuotePricing::AskOnly);

        orders.submit("BTC-USD", Side::Sell, 6.0).await.unwrap();
        let body: Value = serde_json::from_str(&transport.recorded()[1].body).unwrap();
        assert_eq!(body["market_order_config"]["asset_quantity"], "0.00010000");
    }

    #[test]
    fn test_quantity_round_trip() {
        for &price in &[0.0123, 1.0, 8.0, 13.37, 250.0, 3150.5, 60123.45, 98765.4321] {
            for &usd in &[1.0, 5.0, 25.0, 1000.0] {
                let quantity = quantity_for(usd, price);
                assert!((quantity * price - usd).abs() < 1e-6, "price={} usd={}", price, usd);

                // 8-decimal formatting moves the notional by at most half a unit in the last place
                let formatted: f64 = crate::types::format_quantity(quantity).parse().unwrap();
                assert!((formatted * price - usd).abs() <= price * 5e-9 + 1e-9);
            }
        }
    }
}
