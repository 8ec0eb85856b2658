//! Configuration management for the trading bot
//!
//! Everything is read once at startup into an immutable [`Config`] which is
//! then passed by reference. Invalid credentials are fatal here, before any
//! request is signed.

use crate::errors::ConfigError;
use crate::signer::{RequestSigner, SignatureScheme, SigningKey};
use std::env;
use std::str::FromStr;

pub const DEFAULT_BASE_URL: &str = "https://trading.robinhood.com";

/// Bot configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Trading API key, sent as `x-api-key`
    pub api_key: String,

    /// Decoded private key used for every request signature
    pub signing_key: SigningKey,

    /// Trading API base URL (no trailing slash)
    pub base_url: String,

    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,

    /// Settings shared by both automated loops
    pub trading: TradingConfig,

    /// Moving average crossover settings
    pub crossover: CrossoverConfig,

    /// Trend strategy settings
    pub trend: TrendConfig,

    /// Proxy server settings
    pub proxy: ProxyConfig,
}

/// How many cycles a trading loop runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Iterations {
    /// Run until the process is terminated
    #[default]
    Unbounded,
    /// Run exactly this many cycles, then return
    Bounded(u32),
}

impl Iterations {
    pub fn from_option(count: Option<u32>) -> Self {
        count.map(Iterations::Bounded).unwrap_or(Iterations::Unbounded)
    }

    /// Whether another cycle may start after `completed` cycles
    pub fn allows(&self, completed: u32) -> bool {
        match self {
            Iterations::Unbounded => true,
            Iterations::Bounded(limit) => completed < *limit,
        }
    }
}

/// When the loop flips its position after an order attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionPolicy {
    /// Only after the trading API accepted the order
    #[default]
    ConfirmFirst,
    /// Regardless of the submission outcome
    Optimistic,
}

impl FromStr for PositionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "confirm" | "confirm-first" => Ok(PositionPolicy::ConfirmFirst),
            "optimistic" => Ok(PositionPolicy::Optimistic),
            other => Err(ConfigError::Invalid {
                var: "POSITION_POLICY",
                reason: format!("expected 'confirm' or 'optimistic', got '{}'", other),
            }),
        }
    }
}

/// Which side of the book sizes an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuotePricing {
    /// Ask price for both buys and sells
    #[default]
    AskOnly,
    /// Ask for buys, bid for sells
    BySide,
}

impl FromStr for QuotePricing {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ask" | "ask-only" => Ok(QuotePricing::AskOnly),
            "side" | "by-side" => Ok(QuotePricing::BySide),
            other => Err(ConfigError::Invalid {
                var: "QUOTE_PRICING",
                reason: format!("expected 'ask' or 'by-side', got '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TradingConfig {
    /// Trading pair, e.g. BTC-USD
    pub symbol: String,
    /// USD notional per order
    pub usd_amount: f64,
    pub iterations: Iterations,
    pub position_policy: PositionPolicy,
    pub quote_pricing: QuotePricing,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            symbol: "BTC-USD".to_string(),
            usd_amount: 5.0,
            iterations: Iterations::Unbounded,
            position_policy: PositionPolicy::ConfirmFirst,
            quote_pricing: QuotePricing::AskOnly,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrossoverConfig {
    /// Samples in the short moving average
    pub short_window: usize,
    /// Samples in the long moving average
    pub long_window: usize,
    /// Seconds between price checks
    pub interval_secs: u64,
}

impl Default for CrossoverConfig {
    fn default() -> Self {
        Self {
            short_window: 3,
            long_window: 7,
            interval_secs: 60,
        }
    }
}

impl CrossoverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.short_window == 0 {
            return Err(ConfigError::Invalid {
                var: "CROSSOVER_SHORT_WINDOW",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.short_window >= self.long_window {
            return Err(ConfigError::Invalid {
                var: "CROSSOVER_LONG_WINDOW",
                reason: format!(
                    "must be greater than the short window ({} >= {})",
                    self.short_window, self.long_window
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TrendConfig {
    /// Distance in samples between the reference and latest price
    pub window: usize,
    /// Seconds between price checks
    pub interval_secs: u64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window: 5,
            interval_secs: 600,
        }
    }
}

impl TrendConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::Invalid {
                var: "TREND_WINDOW",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub bind_addr: String,
    /// Requests per client IP per minute on /proxy routes
    pub rate_limit_per_minute: u32,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            rate_limit_per_minute: 10,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Parse configuration from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("API_KEY").ok_or(ConfigError::Missing("API_KEY"))?;

        let scheme: SignatureScheme = parse_or(&get, "SIGNATURE_SCHEME", SignatureScheme::default())?;
        let encoded_key = get("PRIVATE_KEY_BASE64").ok_or(ConfigError::Missing("PRIVATE_KEY_BASE64"))?;
        let signing_key = SigningKey::from_base64(scheme, &encoded_key)?;

        let base_url = get("BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let request_timeout_secs = parse_or(&get, "REQUEST_TIMEOUT_SECS", 10)?;

        let trading_defaults = TradingConfig::default();
        let trading = TradingConfig {
            symbol: get("TRADE_SYMBOL").unwrap_or(trading_defaults.symbol),
            usd_amount: parse_or(&get, "TRADE_USD_AMOUNT", trading_defaults.usd_amount)?,
            iterations: Iterations::from_option(parse_opt(&get, "TRADE_ITERATIONS")?),
            position_policy: parse_or(&get, "POSITION_POLICY", trading_defaults.position_policy)?,
            quote_pricing: parse_or(&get, "QUOTE_PRICING", trading_defaults.quote_pricing)?,
        };

        let crossover_defaults = CrossoverConfig::default();
        let crossover = CrossoverConfig {
            short_window: parse_or(&get, "CROSSOVER_SHORT_WINDOW", crossover_defaults.short_window)?,
            long_window: parse_or(&get, "CROSSOVER_LONG_WINDOW", crossover_defaults.long_window)?,
            interval_secs: parse_or(&get, "CROSSOVER_INTERVAL_SECS", crossover_defaults.interval_secs)?,
        };

        let trend_defaults = TrendConfig::default();
        let trend = TrendConfig {
            window: parse_or(&get, "TREND_WINDOW", trend_defaults.window)?,
            interval_secs: parse_or(&get, "TREND_INTERVAL_SECS", trend_defaults.interval_secs)?,
        };

        let proxy_defaults = ProxyConfig::default();
        let proxy = ProxyConfig {
            bind_addr: get("PROXY_BIND_ADDR").unwrap_or(proxy_defaults.bind_addr),
            rate_limit_per_minute: parse_or(
                &get,
                "PROXY_RATE_LIMIT_PER_MINUTE",
                proxy_defaults.rate_limit_per_minute,
            )?,
        };

        let config = Self {
            api_key,
            signing_key,
            base_url,
            request_timeout_secs,
            trading,
            crossover,
            trend,
            proxy,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints. Called again after CLI overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.trading.usd_amount.is_finite() && self.trading.usd_amount > 0.0) {
            return Err(ConfigError::Invalid {
                var: "TRADE_USD_AMOUNT",
                reason: format!("must be positive, got {}", self.trading.usd_amount),
            });
        }
        if self.proxy.rate_limit_per_minute == 0 {
            return Err(ConfigError::Invalid {
                var: "PROXY_RATE_LIMIT_PER_MINUTE",
                reason: "must be at least 1".to_string(),
            });
        }
        self.crossover.validate()?;
        self.trend.validate()
    }

    /// Build the request signer for this configuration
    pub fn signer(&self) -> RequestSigner {
        RequestSigner::new(self.api_key.clone(), self.signing_key.clone())
    }
}

fn parse_opt<T, G>(get: &G, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(var)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                var,
                reason: format!("'{}': {}", raw, e),
            })
        })
        .transpose()
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, var)?.unwrap_or(default))
}
