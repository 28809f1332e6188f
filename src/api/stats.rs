//! Admin dashboard aggregates

use super::{ApiError, AppState};
use crate::store::{Collection, SortOrder};
use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize, PartialEq)]
pub struct AdminStats {
    pub users: u64,
    pub products: u64,
    pub orders: u64,
    pub revenue: f64,
}

/// GET /admin-stats (admin)
pub async fn admin_stats(State(state): State<AppState>) -> Result<Json<AdminStats>, ApiError> {
    let users = state.store.count(Collection::Users).await?;
    let products = state.store.count(Collection::Projects).await?;
    let payments = state
        .store
        .find_all(Collection::Payments, SortOrder::Oldest)
        .await?;

    // Payments without a numeric price contribute nothing.
    let revenue = payments
        .iter()
        .filter_map(|p| p.get("price").and_then(Value::as_f64))
        .fold(0.0, |acc, price| acc + price);

    Ok(Json(AdminStats {
        users,
        products,
        orders: payments.len() as u64,
        revenue,
    }))
}
