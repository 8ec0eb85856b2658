//! Signed JSON client for the trading API
//!
//! Each call is signed immediately before it is handed to the transport so
//! timestamps are never reused across requests.

use crate::config::Config;
use crate::errors::ApiError;
use crate::signer::RequestSigner;
use crate::transport::{HttpTransport, Transport};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Trading API request paths
pub mod endpoints {
    pub const ACCOUNTS: &str = "/api/v1/crypto/trading/accounts/";
    pub const HOLDINGS: &str = "/api/v1/crypto/trading/holdings/";
    pub const ORDERS: &str = "/api/v1/crypto/trading/orders/";
    pub const BEST_BID_ASK: &str = "/api/v1/crypto/marketdata/best_bid_ask/";

    /// Append `key=value` pairs (values URL-encoded) to `path`, skipping it when empty
    pub fn with_query(path: &str, params: &[(&str, String)]) -> String {
        if params.is_empty() {
            return path.to_string();
        }
        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", path, query)
    }
}

pub struct BrokerClient {
    signer: RequestSigner,
    transport: Arc<dyn Transport>,
}

impl BrokerClient {
    pub fn new(signer: RequestSigner, transport: Arc<dyn Transport>) -> Self {
        Self { signer, transport }
    }

    /// Client over HTTP for a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::new(config.signer(), Arc::new(transport)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, "").await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: &str) -> Result<T, ApiError> {
        self.request(Method::POST, path, body).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &str,
    ) -> Result<T, ApiError> {
        let signed = self.signer.sign(path, method, body);
        debug!(
            "Signed {} {} (api_key={}, timestamp={})",
            signed.method, signed.path, signed.api_key, signed.timestamp
        );

        let text = self.transport.send(&signed).await?;

        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("{} {}: {} (body: {})", signed.method, path, e, text))
        })
    }
}
