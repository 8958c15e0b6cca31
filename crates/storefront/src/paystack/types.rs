//! Gateway request and response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bundlehub_core::money;

/// Every gateway response wraps its payload like this.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// Body of `POST /transaction/initialize`.
#[derive(Debug, Serialize)]
pub struct InitializeRequest<'a> {
    pub email: &'a str,
    /// Pesewas
    pub amount: i64,
    pub reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<&'a str>,
    pub metadata: serde_json::Value,
}

/// Checkout session created by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayCustomer {
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of `GET /transaction/verify/{reference}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedTransaction {
    /// `success`, `failed`, `abandoned`, `ongoing`, ...
    pub status: String,
    /// Pesewas
    pub amount: i64,
    pub currency: String,
    pub reference: String,
    #[serde(default)]
    pub customer: GatewayCustomer,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl VerifiedTransaction {
    /// Paid in full, in cedis.
    #[must_use]
    pub fn confirms(&self, expected: Decimal) -> bool {
        self.is_success()
            && self.currency.eq_ignore_ascii_case(money::CURRENCY)
            && money::to_minor_units(expected) == Some(self.amount)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// The gateway has given up on this charge.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.status.as_str(), "failed" | "abandoned" | "reversed")
    }

    /// Amount paid, in cedis.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        money::from_minor_units(self.amount)
    }
}

/// Webhook payload; only the event name and reference are trusted, the
/// charge itself is re-verified through the API.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub reference: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn verified(status: &str, amount: i64, currency: &str) -> VerifiedTransaction {
        VerifiedTransaction {
            status: status.to_string(),
            amount,
            currency: currency.to_string(),
            reference: "DEP-1".to_string(),
            customer: GatewayCustomer::default(),
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_confirms_checks_status_currency_and_amount() {
        let expected = Decimal::new(2550, 2);
        assert!(verified("success", 2550, "GHS").confirms(expected));
        assert!(!verified("success", 2549, "GHS").confirms(expected));
        assert!(!verified("success", 2550, "NGN").confirms(expected));
        assert!(!verified("failed", 2550, "GHS").confirms(expected));
    }

    #[test]
    fn test_failed_statuses() {
        assert!(verified("abandoned", 1, "GHS").is_failed());
        assert!(!verified("ongoing", 1, "GHS").is_failed());
    }

    #[test]
    fn test_parse_verify_envelope() {
        let json = r#"{
            "status": true,
            "message": "Verification successful",
            "data": {
                "status": "success",
                "amount": 1000,
                "currency": "GHS",
                "reference": "BH-XYZ",
                "customer": {"email": "a@b.com"},
                "metadata": {"kind": "order"}
            }
        }"#;
        let envelope: Envelope<VerifiedTransaction> = serde_json::from_str(json).unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(data.amount(), Decimal::new(1000, 2));
        assert_eq!(data.metadata["kind"], "order");
        assert_eq!(data.customer.email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_parse_webhook_event() {
        let json = r#"{"event":"charge.success","data":{"reference":"DEP-1","amount":500,"status":"success"}}"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event, "charge.success");
        assert_eq!(event.data.reference, "DEP-1");
    }
}
