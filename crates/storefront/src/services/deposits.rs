//! Customer wallet deposits through the payment gateway.
//!
//! Nothing is stored until the gateway confirms the charge. The deposit's
//! owner and amount travel in the gateway metadata and are checked against
//! the verified transaction; the unique wallet transaction reference makes
//! crediting idempotent between the verify endpoint and the webhook.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use bundlehub_core::{UserId, WalletTxKind, money};

use crate::db::wallets::{self, NewWalletTransaction};
use crate::error::{AppError, Result};
use crate::models::{CurrentUser, CustomerWallet};
use crate::paystack::{PaystackClient, VerifiedTransaction};
use crate::services::references::{DEPOSIT_PREFIX, deposit_reference};

/// Gateway checkout for a deposit.
#[derive(Debug, Serialize)]
pub struct DepositCheckout {
    pub reference: String,
    pub authorization_url: String,
}

/// Result of verifying a deposit.
#[derive(Debug, Serialize)]
pub struct DepositOutcome {
    pub wallet: CustomerWallet,
    /// False if this reference had already been credited
    pub credited: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct DepositMetadata {
    kind: String,
    user_id: UserId,
    amount: Decimal,
}

const DEPOSIT_KIND: &str = "deposit";

pub struct DepositService<'a> {
    pool: &'a PgPool,
    paystack: &'a PaystackClient,
}

impl<'a> DepositService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, paystack: &'a PaystackClient) -> Self {
        Self { pool, paystack }
    }

    /// Start a gateway checkout to fund the user's wallet.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a non-positive or over-precise
    /// amount and `AppError::Payment` if the gateway refuses.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn initialize(&self, user: &CurrentUser, amount: Decimal) -> Result<DepositCheckout> {
        validate_amount(amount)?;

        let reference = deposit_reference();
        let metadata = serde_json::to_value(DepositMetadata {
            kind: DEPOSIT_KIND.to_string(),
            user_id: user.id,
            amount,
        })
        .map_err(|e| AppError::Internal(e.to_string()))?;

        let checkout = self
            .paystack
            .initialize(user.email.as_str(), amount, &reference, metadata)
            .await?;

        info!(reference = %reference, amount = %amount, "Deposit initialized");
        Ok(DepositCheckout {
            reference,
            authorization_url: checkout.authorization_url,
        })
    }

    /// Verify a deposit with the gateway and credit it once.
    ///
    /// `expected_user` is the logged-in user on the verify endpoint and
    /// `None` for webhooks.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if the deposit belongs to someone else
    /// and `AppError::Conflict` if the charge did not succeed in full.
    #[instrument(skip(self))]
    pub async fn verify(
        &self,
        reference: &str,
        expected_user: Option<UserId>,
    ) -> Result<DepositOutcome> {
        if !reference.starts_with(DEPOSIT_PREFIX) {
            return Err(AppError::BadRequest("not a deposit reference".to_string()));
        }

        let verified = self.paystack.verify(reference).await?;
        let metadata = deposit_metadata(&verified)?;

        if expected_user.is_some_and(|user| user != metadata.user_id) {
            return Err(AppError::Forbidden("deposit belongs to another account".to_string()));
        }
        if !verified.confirms(metadata.amount) {
            if verified.is_success() {
                warn!(
                    reference,
                    paid = %verified.amount(),
                    currency = %verified.currency,
                    expected = %metadata.amount,
                    "Gateway deposit does not match"
                );
            }
            return Err(AppError::Conflict(format!(
                "deposit not confirmed (status {})",
                verified.status
            )));
        }

        let mut tx = self.pool.begin().await?;
        let wallet = wallets::lock_for_user(&mut tx, metadata.user_id).await?;
        if wallets::reference_exists(&mut tx, reference).await? {
            tx.commit().await?;
            return Ok(DepositOutcome {
                wallet,
                credited: false,
            });
        }

        let (wallet, _) = wallets::apply(
            &mut tx,
            &wallet,
            NewWalletTransaction {
                kind: WalletTxKind::Deposit,
                amount: metadata.amount,
                reference,
                description: Some("Wallet deposit"),
            },
        )
        .await?;
        tx.commit().await?;

        info!(
            user_id = %metadata.user_id,
            amount = %metadata.amount,
            balance = %wallet.balance,
            "Deposit credited"
        );
        Ok(DepositOutcome {
            wallet,
            credited: true,
        })
    }
}

fn validate_amount(amount: Decimal) -> Result<()> {
    match money::to_minor_units(amount) {
        Some(minor) if minor > 0 => Ok(()),
        _ => Err(AppError::BadRequest(
            "amount must be positive with at most two decimal places".to_string(),
        )),
    }
}

fn deposit_metadata(verified: &VerifiedTransaction) -> Result<DepositMetadata> {
    serde_json::from_value::<DepositMetadata>(verified.metadata.clone())
        .ok()
        .filter(|m| m.kind == DEPOSIT_KIND)
        .ok_or_else(|| AppError::BadRequest("transaction is not a wallet deposit".to_string()))
}
