//! Gateway HTTP client.

use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use bundlehub_core::money;

use crate::config::PaystackConfig;

use super::PaymentError;
use super::types::{Envelope, InitializeRequest, InitializedTransaction, VerifiedTransaction};

/// Client for the payment gateway transaction API.
#[derive(Clone)]
pub struct PaystackClient {
    client: Client,
    base_url: String,
    secret_key: SecretString,
    callback_url: Option<String>,
}

impl std::fmt::Debug for PaystackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaystackClient")
            .field("base_url", &self.base_url)
            .field("secret_key", &"[REDACTED]")
            .field("callback_url", &self.callback_url)
            .finish_non_exhaustive()
    }
}

impl PaystackClient {
    /// Create a new gateway client.
    #[must_use]
    pub fn new(config: &PaystackConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            secret_key: config.secret_key.clone(),
            callback_url: config.callback_url.clone(),
        }
    }

    /// Secret used to sign webhooks.
    #[must_use]
    pub const fn secret_key(&self) -> &SecretString {
        &self.secret_key
    }

    /// Start a checkout for `amount` cedis.
    ///
    /// # Errors
    ///
    /// Returns error if the amount is not representable or the gateway
    /// refuses the transaction.
    #[instrument(skip(self, metadata))]
    pub async fn initialize(
        &self,
        email: &str,
        amount: Decimal,
        reference: &str,
        metadata: serde_json::Value,
    ) -> Result<InitializedTransaction, PaymentError> {
        let minor = money::to_minor_units(amount)
            .filter(|m| *m > 0)
            .ok_or_else(|| PaymentError::InvalidAmount(amount.to_string()))?;

        let body = InitializeRequest {
            email,
            amount: minor,
            reference,
            callback_url: self.callback_url.as_deref(),
            metadata,
        };

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let transaction: InitializedTransaction = Self::parse(response).await?;
        debug!(reference = %transaction.reference, "Gateway transaction initialized");
        Ok(transaction)
    }

    /// Fetch the gateway's view of a transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the reference is unknown.
    #[instrument(skip(self))]
    pub async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, PaymentError> {
        let response = self
            .client
            .get(format!("{}/transaction/verify/{reference}", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PaymentError> {
        let status = response.status();
        let body = response.text().await?;

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                status = %status,
                error = %e,
                body = %body.chars().take(200).collect::<String>(),
                "Failed to parse gateway response"
            );
            PaymentError::Parse(e.to_string())
        })?;

        match envelope.data {
            Some(data) if status.is_success() && envelope.status => Ok(data),
            _ => {
                tracing::error!(
                    status = %status,
                    message = %envelope.message,
                    "Gateway returned an error"
                );
                Err(PaymentError::Api {
                    status: status.as_u16(),
                    message: envelope.message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let client = PaystackClient::new(&PaystackConfig {
            base_url: "https://api.paystack.co".to_string(),
            secret_key: SecretString::from("sk_test_123456".to_string()),
            callback_url: None,
        });
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk_test_123456"));
        assert!(debug.contains("[REDACTED]"));
    }
}
