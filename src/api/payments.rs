//! Payment endpoints

use super::{new_document, ApiError, AppState};
use crate::auth::Claims;
use crate::payments::{amount_in_cents, DEFAULT_CURRENCY};
use crate::store::{Collection, DeleteResult, InsertOneResult};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub price: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    pub client_secret: String,
}

/// POST /create-payment-intent
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentIntentRequest>,
) -> Result<Json<CreatePaymentIntentResponse>, ApiError> {
    let amount = amount_in_cents(payload.price)
        .ok_or_else(|| ApiError::BadRequest("Price must be a positive amount".to_string()))?;

    let gateway = state.payments.as_ref().ok_or(ApiError::PaymentsDisabled)?;

    let intent = gateway
        .create_intent(amount, DEFAULT_CURRENCY)
        .await
        .map_err(ApiError::PaymentProvider)?;

    Ok(Json(CreatePaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentResponse {
    pub insert_payment_info: InsertOneResult,
    pub delete_info: DeleteResult,
}

/// POST /payments
///
/// Stores the payment and clears the purchased `cartItems` from the carts
/// collection.
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<Value>,
) -> Result<Json<RecordPaymentResponse>, ApiError> {
    let payment = new_document(body)?;

    let cart_items: Vec<String> = match payment.get("cartItems") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ApiError::BadRequest("cartItems must be a list of ids".to_string())
                })
            })
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(ApiError::BadRequest(
                "cartItems must be a list of ids".to_string(),
            ))
        }
    };

    let insert_payment_info = state.store.insert_one(Collection::Payments, payment).await?;
    let delete_info = state
        .store
        .delete_many_by_ids(Collection::Carts, &cart_items)
        .await?;

    info!(
        payer = %claims.email,
        payment = %insert_payment_info.inserted_id,
        cleared_items = delete_info.deleted_count,
        "Payment recorded"
    );

    Ok(Json(RecordPaymentResponse {
        insert_payment_info,
        delete_info,
    }))
}
