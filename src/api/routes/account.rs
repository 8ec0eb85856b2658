//! Account and holdings proxy endpoints

use super::{upstream_error, RouteError};
use crate::api::server::AppState;
use crate::broker::endpoints;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct HoldingsQuery {
    pub asset_code: Option<String>,
    pub limit: Option<String>,
    pub cursor: Option<String>,
}

impl HoldingsQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        super::supplied(&[
            ("asset_code", &self.asset_code),
            ("limit", &self.limit),
            ("cursor", &self.cursor),
        ])
    }
}

/// Account details wrapped as `{"response_data": ...}`
pub async fn fetch_account(State(state): State<AppState>) -> Result<Json<Value>, RouteError> {
    info!("Fetching account details");
    let account: Value = state
        .broker
        .get(endpoints::ACCOUNTS)
        .await
        .map_err(|e| upstream_error("Failed to fetch account details", e))?;

    Ok(Json(json!({ "response_data": account })))
}

pub async fn crypto_account_details(
    State(state): State<AppState>,
) -> Result<Json<Value>, RouteError> {
    let account: Value = state
        .broker
        .get(endpoints::ACCOUNTS)
        .await
        .map_err(|e| upstream_error("Failed to fetch account details", e))?;

    Ok(Json(account))
}

pub async fn crypto_holdings(
    State(state): State<AppState>,
    Query(query): Query<HoldingsQuery>,
) -> Result<Json<Value>, RouteError> {
    let path = endpoints::with_query(endpoints::HOLDINGS, &query.params());
    info!("Fetching crypto holdings: {}", path);

    let holdings: Value = state
        .broker
        .get(&path)
        .await
        .map_err(|e| upstream_error("Failed to fetch crypto holdings", e))?;

    Ok(Json(holdings))
}
