//! Request signing for the trading API
//!
//! Every outbound call carries `x-api-key`, `x-timestamp` and `x-signature`
//! headers. The signature covers the exact concatenation
//! `api_key + timestamp + path + method + body` with no separators, and is
//! computed fresh for each request because the API enforces a freshness
//! window on the timestamp.

use crate::errors::ConfigError;
use base64::{engine::general_purpose::STANDARD, Engine};
use ed25519_dalek::Signer as _;
use hmac::{Hmac, Mac};
use reqwest::Method;
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

type HmacSha256 = Hmac<Sha256>;

/// Ed25519 seed length in bytes
pub const ED25519_SEED_LEN: usize = 32;

pub const HEADER_API_KEY: &str = "x-api-key";
pub const HEADER_SIGNATURE: &str = "x-signature";
pub const HEADER_TIMESTAMP: &str = "x-timestamp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureScheme {
    #[default]
    Ed25519,
    HmacSha256,
}

impl FromStr for SignatureScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ed25519" => Ok(SignatureScheme::Ed25519),
            "hmac-sha256" | "hmac" => Ok(SignatureScheme::HmacSha256),
            other => Err(ConfigError::Invalid {
                var: "SIGNATURE_SCHEME",
                reason: format!("unknown scheme '{}'", other),
            }),
        }
    }
}

/// Decoded private key material, loaded once at startup
#[derive(Clone)]
pub enum SigningKey {
    Ed25519(ed25519_dalek::SigningKey),
    /// Keyed once at load; each signature starts from a clone
    HmacSha256(HmacSha256),
}

impl SigningKey {
    /// Decode a base64 key for `scheme`.
    ///
    /// Ed25519 seeds must be exactly [`ED25519_SEED_LEN`] bytes.
    pub fn from_base64(scheme: SignatureScheme, encoded: &str) -> Result<Self, ConfigError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ConfigError::InvalidKey(format!("not valid base64: {}", e)))?;

        match scheme {
            SignatureScheme::Ed25519 => {
                let seed: [u8; ED25519_SEED_LEN] = bytes.as_slice().try_into().map_err(|_| {
                    ConfigError::InvalidKey(format!(
                        "ed25519 seed must be {} bytes, got {}",
                        ED25519_SEED_LEN,
                        bytes.len()
                    ))
                })?;
                Ok(SigningKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(&seed)))
            }
            SignatureScheme::HmacSha256 => {
                if bytes.is_empty() {
                    return Err(ConfigError::InvalidKey("hmac secret is empty".to_string()));
                }
                let mac = HmacSha256::new_from_slice(&bytes)
                    .map_err(|e| ConfigError::InvalidKey(format!("hmac secret rejected: {}", e)))?;
                Ok(SigningKey::HmacSha256(mac))
            }
        }
    }

    pub fn scheme(&self) -> SignatureScheme {
        match self {
            SigningKey::Ed25519(_) => SignatureScheme::Ed25519,
            SigningKey::HmacSha256(_) => SignatureScheme::HmacSha256,
        }
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            SigningKey::Ed25519(key) => key.sign(message).to_bytes().to_vec(),
            SigningKey::HmacSha256(keyed) => {
                let mut mac = keyed.clone();
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey({:?}, <redacted>)", self.scheme())
    }
}

/// A request ready to hand to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub api_key: String,
    /// Unix seconds at signing time
    pub timestamp: i64,
    pub path: String,
    pub method: Method,
    pub body: String,
    /// Base64-encoded signature over [`SignedRequest::message`]
    pub signature: String,
}

impl SignedRequest {
    /// Canonical string the signature covers
    pub fn message(&self) -> String {
        canonical_message(&self.api_key, self.timestamp, &self.path, &self.method, &self.body)
    }

    /// The four headers every request carries
    pub fn headers(&self) -> [(&'static str, String); 4] {
        [
            (HEADER_API_KEY, self.api_key.clone()),
            (HEADER_SIGNATURE, self.signature.clone()),
            (HEADER_TIMESTAMP, self.timestamp.to_string()),
            ("Content-Type", "application/json".to_string()),
        ]
    }
}

fn canonical_message(api_key: &str, timestamp: i64, path: &str, method: &Method, body: &str) -> String {
    format!("{}{}{}{}{}", api_key, timestamp, path, method.as_str(), body)
}

/// Signs outbound requests with the configured key
#[derive(Debug, Clone)]
pub struct RequestSigner {
    api_key: String,
    key: SigningKey,
}

impl RequestSigner {
    pub fn new(api_key: impl Into<String>, key: SigningKey) -> Self {
        Self {
            api_key: api_key.into(),
            key,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Sign with the current wall-clock time
    pub fn sign(&self, path: &str, method: Method, body: &str) -> SignedRequest {
        self.sign_at(chrono::Utc::now().timestamp(), path, method, body)
    }

    /// Sign with an explicit timestamp. Deterministic for a fixed key.
    pub fn sign_at(&self, timestamp: i64, path: &str, method: Method, body: &str) -> SignedRequest {
        let message = canonical_message(&self.api_key, timestamp, path, &method, body);
        let signature = STANDARD.encode(self.key.sign(message.as_bytes()));

        SignedRequest {
            api_key: self.api_key.clone(),
            timestamp,
            path: path.to_string(),
            method,
            body: body.to_string(),
            signature,
        }
    }
}
