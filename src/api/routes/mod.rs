//! Proxy route handlers

pub mod account;
pub mod market_data;
pub mod orders;

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};
use std::fmt::Display;

/// Error half of every handler result: a status and a JSON body
pub type RouteError = (StatusCode, Json<Value>);

pub fn bad_request(message: impl Into<String>) -> RouteError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message.into() })))
}

/// 500 carrying the upstream diagnostic
pub fn upstream_error(context: &str, details: impl Display) -> RouteError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": context, "details": details.to_string() })),
    )
}

/// Query parameters that were supplied with a non-empty value, in order
pub fn supplied(params: &[(&'static str, &Option<String>)]) -> Vec<(&'static str, String)> {
    params
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (*key, v.to_string()))
        })
        .collect()
}
