//! Raw HTTP boundary to the trading API

use crate::errors::ApiError;
use crate::signer::SignedRequest;
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::{debug, warn};

/// Sends an already-signed request and returns the 2xx response body.
///
/// Non-2xx responses and transport failures both come back as [`ApiError`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &SignedRequest) -> Result<String, ApiError>;
}

/// reqwest-backed transport against a fixed base URL
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("crypto-trader/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &SignedRequest) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self.client.request(request.method.clone(), &url);
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }
        if request.method != Method::GET {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_network_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_network_error(&e))?;

        debug!("{} {} -> {}", request.method, request.path, status);

        if !status.is_success() {
            warn!("{} {} failed with {}: {}", request.method, request.path, status, body);
            return Err(ApiError::from_response(status.as_u16(), &body));
        }

        Ok(body)
    }
}
