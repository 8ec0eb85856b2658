//! Best bid/ask quotes from the trading API

use crate::broker::{endpoints, BrokerClient};
use crate::config::QuotePricing;
use crate::errors::ApiError;
use crate::types::Side;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Raw response of `GET /api/v1/crypto/marketdata/best_bid_ask/`
#[derive(Debug, Deserialize)]
pub struct BestBidAskResponse {
    #[serde(default)]
    pub results: Vec<BestBidAsk>,
}

#[derive(Debug, Deserialize)]
pub struct BestBidAsk {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub ask_inclusive_of_buy_spread: Option<RawPrice>,
    #[serde(default)]
    pub bid_inclusive_of_sell_spread: Option<RawPrice>,
}

/// Prices arrive either as JSON numbers or decimal strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RawPrice {
    fn to_positive(&self, field: &str) -> Result<f64, ApiError> {
        let value = match self {
            RawPrice::Number(n) => *n,
            RawPrice::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ApiError::MarketData(format!("{} is not a number: '{}'", field, s)))?,
            RawPrice::Other(v) => {
                return Err(ApiError::MarketData(format!("{} is not a price: {}", field, v)))
            }
        };
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(ApiError::MarketData(format!("{} must be positive, got {}", field, value)))
        }
    }
}

/// A validated quote. `ask` is always present and positive.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub ask: f64,
    pub bid: Option<f64>,
}

impl Quote {
    /// Price used to size an order on `side`
    pub fn price_for(&self, side: Side, pricing: QuotePricing) -> Result<f64, ApiError> {
        match (pricing, side) {
            (QuotePricing::BySide, Side::Sell) => self.bid.ok_or_else(|| {
                ApiError::MarketData(format!("no usable bid price in quote for {}", self.symbol))
            }),
            _ => Ok(self.ask),
        }
    }
}

impl BestBidAskResponse {
    /// First result of the response as a validated quote
    pub fn into_quote(self, symbol: &str) -> Result<Quote, ApiError> {
        let first = self
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::MarketData(format!("empty quote result set for {}", symbol)))?;

        let ask = first
            .ask_inclusive_of_buy_spread
            .as_ref()
            .ok_or_else(|| ApiError::MarketData(format!("no ask price in quote for {}", symbol)))?
            .to_positive("ask_inclusive_of_buy_spread")?;

        // Only sells priced by side read the bid, so a bad one is dropped here
        let bid = first
            .bid_inclusive_of_sell_spread
            .as_ref()
            .and_then(|raw| match raw.to_positive("bid_inclusive_of_sell_spread") {
                Ok(bid) => Some(bid),
                Err(e) => {
                    debug!("Ignoring bid for {}: {}", symbol, e);
                    None
                }
            });

        Ok(Quote {
            symbol: first.symbol.unwrap_or_else(|| symbol.to_string()),
            ask,
            bid,
        })
    }
}

/// Source of current prices for a symbol
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, ApiError>;

    /// Current ask price
    async fn fetch_price(&self, symbol: &str) -> Result<f64, ApiError> {
        Ok(self.fetch_quote(symbol).await?.ask)
    }
}

/// Quotes over the signed trading API
pub struct MarketDataClient {
    broker: Arc<BrokerClient>,
}

impl MarketDataClient {
    pub fn new(broker: Arc<BrokerClient>) -> Self {
        Self { broker }
    }

    pub fn quote_path(symbol: &str) -> String {
        endpoints::with_query(endpoints::BEST_BID_ASK, &[("symbol", symbol.to_string())])
    }
}

#[async_trait]
impl PriceFeed for MarketDataClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, ApiError> {
        let response: BestBidAskResponse = self.broker.get(&Self::quote_path(symbol)).await?;
        let quote = response.into_quote(symbol)?;
        debug!("Quote {}: ask={} bid={:?}", quote.symbol, quote.ask, quote.bid);
        Ok(quote)
    }
}
