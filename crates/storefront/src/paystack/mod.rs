//! Payment gateway client (Paystack transaction API).
//!
//! Only the initialize/verify pair and webhook signatures are used. Amounts
//! cross the wire in pesewas; everything on our side stays in cedis.

mod client;
pub mod types;
mod webhook;

pub use client::PaystackClient;
pub use types::*;
pub use webhook::{SIGNATURE_HEADER, verify_signature};

use thiserror::Error;

/// Errors from the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Amount cannot be expressed in minor units.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Webhook signature did not match.
    #[error("invalid webhook signature")]
    InvalidSignature,
}
