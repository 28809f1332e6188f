//! Payments
//! Mission: Create card payment intents with the external payment provider

pub mod stripe;

pub use stripe::StripeGateway;

use anyhow::Result;
use async_trait::async_trait;

/// Currency used for every intent.
pub const DEFAULT_CURRENCY: &str = "usd";

/// Provider-side intent the client confirms with its card details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// `amount_cents` is in the smallest currency unit.
    async fn create_intent(&self, amount_cents: i64, currency: &str) -> Result<PaymentIntent>;
}

/// Price in dollars to whole cents, truncating fractions of a cent.
/// `None` for non-finite or non-positive prices.
pub fn amount_in_cents(price: f64) -> Option<i64> {
    if !price.is_finite() || price <= 0.0 {
        return None;
    }
    let cents = (price * 100.0).trunc();
    if cents < 1.0 || cents > i64::MAX as f64 {
        return None;
    }
    Some(cents as i64)
}
