//! HTTP proxy over the signed trading API
//!
//! Lets clients without signing credentials read account data and place
//! orders; every forwarded call is signed server-side.

pub mod rate_limit;
pub mod routes;
pub mod server;

pub use rate_limit::RateLimiter;
pub use server::{create_app, AppState};
