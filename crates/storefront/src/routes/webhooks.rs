//! Payment gateway webhooks.
//!
//! The signature covers the raw body, so the handler takes `Bytes` and only
//! parses JSON after verification. The event payload is never trusted for
//! amounts: each reference is re-verified through the gateway API by the
//! same code paths the customer-facing verify endpoints use.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{debug, info, instrument, warn};

use crate::error::{AppError, Result};
use crate::paystack::{PaymentError, SIGNATURE_HEADER, WebhookEvent, verify_signature};
use crate::services::references::{DEPOSIT_PREFIX, ORDER_PREFIX};
use crate::services::{DepositService, OrderService};
use crate::state::AppState;

/// The only event that moves money.
const CHARGE_SUCCESS: &str = "charge.success";

/// POST /api/webhooks/paystack
///
/// Returns 200 for every signed event that needs no retry, including ones
/// that are ignored. Server-side failures return 5xx so the gateway
/// delivers the event again.
#[instrument(skip_all)]
pub async fn paystack(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(PaymentError::InvalidSignature)?;
    verify_signature(state.paystack().secret_key(), &body, signature)?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid webhook payload: {e}")))?;

    if event.event != CHARGE_SUCCESS {
        debug!(event = %event.event, "Ignoring webhook event");
        return Ok(StatusCode::OK);
    }

    let reference = event.data.reference.as_str();
    let outcome = if reference.starts_with(DEPOSIT_PREFIX) {
        DepositService::new(state.pool(), state.paystack())
            .verify(reference, None)
            .await
            .map(|outcome| {
                info!(reference, credited = outcome.credited, "Deposit webhook processed");
            })
    } else if reference.starts_with(ORDER_PREFIX) {
        OrderService::new(state.pool(), state.vendor(), state.paystack())
            .confirm_payment(reference)
            .await
            .map(|order| {
                info!(reference, status = %order.order_status, "Order webhook processed");
            })
    } else {
        warn!(reference, "Webhook for unknown reference");
        Ok(())
    };

    match outcome {
        Ok(()) => Ok(StatusCode::OK),
        Err(e) if e.status().is_server_error() => Err(e),
        Err(e) => {
            // A retry would fail the same way
            warn!(reference, error = %e, "Webhook event rejected");
            Ok(StatusCode::OK)
        }
    }
}
