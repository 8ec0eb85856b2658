//! Core types for the trading bot

use crate::errors::OrderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(OrderError::Validation(format!("unsupported side: {}", other))),
        }
    }
}

/// Whether the loop believes it holds the asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long,
}

impl Position {
    /// The only side that can act on this position
    pub fn actionable_side(&self) -> Side {
        match self {
            Position::Flat => Side::Buy,
            Position::Long => Side::Sell,
        }
    }

    /// Position after a filled order on `side`
    pub fn after(&self, side: Side) -> Position {
        match side {
            Side::Buy => Position::Long,
            Side::Sell => Position::Flat,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Flat => write!(f, "FLAT"),
            Position::Long => write!(f, "LONG"),
        }
    }
}

/// Raw strategy output, before position gating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn side(&self) -> Option<Side> {
        match self {
            Signal::Buy => Some(Side::Buy),
            Signal::Sell => Some(Side::Sell),
            Signal::Hold => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

impl FromStr for OrderType {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "market" => Ok(OrderType::Market),
            "limit" => Ok(OrderType::Limit),
            other => Err(OrderError::Validation(format!("unsupported order type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    #[default]
    Gtc,
    Gfd,
    Gfw,
    Gfm,
}

impl FromStr for TimeInForce {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gtc" => Ok(TimeInForce::Gtc),
            "gfd" => Ok(TimeInForce::Gfd),
            "gfw" => Ok(TimeInForce::Gfw),
            "gfm" => Ok(TimeInForce::Gfm),
            other => Err(OrderError::Validation(format!("unsupported time in force: {}", other))),
        }
    }
}

/// Market order sizing, either in asset units or in quote currency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketOrderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_amount: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitOrderConfig {
    pub limit_price: String,
    pub quote_amount: String,
    pub time_in_force: TimeInForce,
}

/// Serialized as `market_order_config: {...}` or `limit_order_config: {...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderConfig {
    MarketOrderConfig(MarketOrderConfig),
    LimitOrderConfig(LimitOrderConfig),
}

/// Body of `POST /api/v1/crypto/trading/orders/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub client_order_id: Uuid,
    pub side: Side,
    pub symbol: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(flatten)]
    pub config: OrderConfig,
}

impl OrderRequest {
    /// Market order for a fixed asset quantity. Gets a fresh client order id.
    pub fn market_quantity(symbol: &str, side: Side, quantity: f64) -> Self {
        Self {
            client_order_id: Uuid::new_v4(),
            side,
            symbol: symbol.to_string(),
            order_type: OrderType::Market,
            config: OrderConfig::MarketOrderConfig(MarketOrderConfig {
                asset_quantity: Some(format_quantity(quantity)),
                quote_amount: None,
            }),
        }
    }

    /// Market order for a quote-currency amount
    pub fn market_quote(symbol: &str, side: Side, usd_amount: f64) -> Self {
        Self {
            client_order_id: Uuid::new_v4(),
            side,
            symbol: symbol.to_string(),
            order_type: OrderType::Market,
            config: OrderConfig::MarketOrderConfig(MarketOrderConfig {
                asset_quantity: None,
                quote_amount: Some(format_amount(usd_amount)),
            }),
        }
    }

    pub fn limit(
        symbol: &str,
        side: Side,
        limit_price: f64,
        usd_amount: f64,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            client_order_id: Uuid::new_v4(),
            side,
            symbol: symbol.to_string(),
            order_type: OrderType::Limit,
            config: OrderConfig::LimitOrderConfig(LimitOrderConfig {
                limit_price: format_amount(limit_price),
                quote_amount: format_amount(usd_amount),
                time_in_force,
            }),
        }
    }
}

/// Parsed success response of an order submission
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderResult {
    #[serde(alias = "id")]
    pub order_id: String,
    #[serde(alias = "state")]
    pub status: String,
}

/// Fixed 8-decimal asset quantity, never scientific notation
pub fn format_quantity(quantity: f64) -> String {
    format!("{:.8}", quantity)
}

/// Fixed 2-decimal quote amount or price
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Positive, finite amount check shared by every order constructor caller
pub fn validate_amount(name: &str, value: f64) -> Result<(), OrderError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(OrderError::Validation(format!("{} must be positive, got {}", name, value)))
    }
}
