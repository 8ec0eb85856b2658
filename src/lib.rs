//! Crypto Trading Bot Library
//!
//! Automated spot trading against a signed crypto brokerage API with two
//! polling strategies:
//!
//! 1. **Moving Average Crossover**: buy when the short average crosses above
//!    the long one, sell on the reverse cross.
//!
//! 2. **Trend**: buy when the latest price is above the price `window`
//!    samples back, sell when it is below.
//!
//! Every request is signed over `api_key + timestamp + path + method + body`.
//! The [`api`] module exposes the same signed calls as an HTTP proxy.

pub mod api;
pub mod broker;
pub mod config;
pub mod errors;
pub mod history;
pub mod market_data;
pub mod orders;
pub mod signer;
pub mod strategies;
pub mod trader;
pub mod transport;
pub mod types;

pub use broker::BrokerClient;
pub use config::{Config, Iterations, PositionPolicy, QuotePricing};
pub use errors::{ApiError, ConfigError, OrderError};
pub use history::PriceHistory;
pub use market_data::{MarketDataClient, PriceFeed, Quote};
pub use orders::{OrderClient, OrderPlacer};
pub use signer::{RequestSigner, SignatureScheme, SignedRequest, SigningKey};
pub use strategies::{CrossoverStrategy, SignalStrategy, StrategyKind, TrendStrategy};
pub use trader::{CycleOutcome, LoopSettings, LoopSummary, TradingLoop};
pub use transport::{HttpTransport, Transport};
pub use types::{OrderRequest, OrderResult, Position, Side, Signal};
