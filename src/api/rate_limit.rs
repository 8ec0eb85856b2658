//! Per-client rate limiting for the proxy routes
//!
//! One token bucket per client IP. A bucket holds `per_minute` tokens and
//! refills continuously, so a client may burst up to the limit and then
//! proceeds at the steady rate.
//!
//! Buckets that have refilled completely carry no state worth keeping, so
//! they are swept at most once per window. The number of tracked clients is
//! capped; a new client arriving while the table is full of active buckets is
//! refused until a sweep frees room.

use crate::api::server::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::warn;

/// Most client buckets held at once
const MAX_CLIENTS: usize = 4096;

struct TokenBucket {
    tokens: f64,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
    last_refill: Instant,
}

impl TokenBucket {
    fn new(max_tokens: f64, window: Duration) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_rate: max_tokens / window.as_secs_f64(),
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn is_full(&mut self) -> bool {
        self.refill();
        self.tokens >= self.max_tokens
    }
}

struct Clients {
    buckets: HashMap<IpAddr, TokenBucket>,
    last_prune: Instant,
}

impl Clients {
    fn prune(&mut self) {
        self.buckets.retain(|_, bucket| !bucket.is_full());
        self.last_prune = Instant::now();
    }
}

pub struct RateLimiter {
    clients: Mutex<Clients>,
    max_tokens: f64,
    window: Duration,
    max_clients: usize,
}

impl RateLimiter {
    pub fn per_minute(limit: u32) -> Self {
        Self::with_max_clients(limit, MAX_CLIENTS)
    }

    fn with_max_clients(limit: u32, max_clients: usize) -> Self {
        Self {
            clients: Mutex::new(Clients {
                buckets: HashMap::new(),
                last_prune: Instant::now(),
            }),
            max_tokens: limit.max(1) as f64,
            window: Duration::from_secs(60),
            max_clients: max_clients.max(1),
        }
    }

    /// Take one token for `client`. Returns false when the client is over its limit
    /// or when it is new and the client table is full.
    pub async fn try_acquire(&self, client: IpAddr) -> bool {
        let mut clients = self.clients.lock().await;

        if clients.last_prune.elapsed() >= self.window {
            clients.prune();
        }

        if let Some(bucket) = clients.buckets.get_mut(&client) {
            return bucket.try_acquire();
        }

        if clients.buckets.len() >= self.max_clients {
            warn!(
                "Rate limiter tracking {} clients, refusing new client {}",
                clients.buckets.len(),
                client
            );
            return false;
        }

        let mut bucket = TokenBucket::new(self.max_tokens, self.window);
        let acquired = bucket.try_acquire();
        clients.buckets.insert(client, bucket);
        acquired
    }
}

/// Middleware rejecting over-limit clients with 429
pub async fn limit_by_ip(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if state.limiter.try_acquire(addr.ip()).await {
        return next.run(request).await;
    }

    warn!("Rate limit exceeded for {} on {}", addr.ip(), request.uri().path());
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "error": "Rate limit exceeded",
            "details": format!("at most {} requests per minute", state.limiter.max_tokens as u32),
        })),
    )
        .into_response()
}
