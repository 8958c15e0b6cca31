//! Store wallet balances.
//!
//! A store wallet has four buckets:
//!
//! - `available` - withdrawable profit
//! - `pending` - funds held by an open withdrawal request
//! - `earned` - lifetime profit credited from completed orders
//! - `withdrawn` - lifetime amount paid out
//!
//! Every operation returns a new [`StoreWallet`] or an error, never a
//! partially updated one. No bucket may go negative.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{LedgerKind, money};

/// Wallet operation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("amount may have at most two decimal places")]
    TooPrecise,
    #[error("insufficient available balance: requested {requested}, available {available}")]
    InsufficientAvailable {
        requested: Decimal,
        available: Decimal,
    },
    #[error("insufficient pending balance: requested {requested}, pending {pending}")]
    InsufficientPending { requested: Decimal, pending: Decimal },
}

/// A store's balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreWallet {
    pub available: Decimal,
    pub pending: Decimal,
    pub earned: Decimal,
    pub withdrawn: Decimal,
}

impl StoreWallet {
    /// Credit the profit of a completed order.
    ///
    /// A zero profit is accepted so that at-cost sales still complete.
    ///
    /// # Errors
    ///
    /// Returns an error for a negative or over-precise amount.
    pub fn credit_sale(self, profit: Decimal) -> Result<Self, WalletError> {
        if profit < Decimal::ZERO {
            return Err(WalletError::NonPositiveAmount);
        }
        check_precision(profit)?;
        Ok(Self {
            available: self.available + profit,
            earned: self.earned + profit,
            ..self
        })
    }

    /// Move `amount` from available to pending when a withdrawal is requested.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::InsufficientAvailable`] if the store cannot cover it.
    pub fn hold_withdrawal(self, amount: Decimal) -> Result<Self, WalletError> {
        check_amount(amount)?;
        if self.available < amount {
            return Err(WalletError::InsufficientAvailable {
                requested: amount,
                available: self.available,
            });
        }
        Ok(Self {
            available: self.available - amount,
            pending: self.pending + amount,
            ..self
        })
    }

    /// Pay out a held withdrawal: pending to withdrawn.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::InsufficientPending`] if less than `amount` is held.
    pub fn complete_withdrawal(self, amount: Decimal) -> Result<Self, WalletError> {
        self.take_pending(amount).map(|wallet| Self {
            withdrawn: wallet.withdrawn + amount,
            ..wallet
        })
    }

    /// Return a rejected withdrawal to available.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::InsufficientPending`] if less than `amount` is held.
    pub fn release_withdrawal(self, amount: Decimal) -> Result<Self, WalletError> {
        self.take_pending(amount).map(|wallet| Self {
            available: wallet.available + amount,
            ..wallet
        })
    }

    /// Apply a signed admin correction to available.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero delta or if available would go negative.
    pub fn adjust(self, delta: Decimal) -> Result<Self, WalletError> {
        if delta.is_zero() {
            return Err(WalletError::NonPositiveAmount);
        }
        check_precision(delta)?;
        let available = self.available + delta;
        if available < Decimal::ZERO {
            return Err(WalletError::InsufficientAvailable {
                requested: -delta,
                available: self.available,
            });
        }
        Ok(Self { available, ..self })
    }

    /// Apply the operation a ledger entry of `kind` records.
    ///
    /// # Errors
    ///
    /// Same as the operation for `kind`.
    pub fn apply(self, kind: LedgerKind, amount: Decimal) -> Result<Self, WalletError> {
        match kind {
            LedgerKind::SaleProfit => self.credit_sale(amount),
            LedgerKind::WithdrawalHold => self.hold_withdrawal(amount),
            LedgerKind::WithdrawalPaid => self.complete_withdrawal(amount),
            LedgerKind::WithdrawalReleased => self.release_withdrawal(amount),
            LedgerKind::Adjustment => self.adjust(amount),
        }
    }

    /// Total balance the store still holds (available plus pending).
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.available + self.pending
    }

    fn take_pending(self, amount: Decimal) -> Result<Self, WalletError> {
        check_amount(amount)?;
        if self.pending < amount {
            return Err(WalletError::InsufficientPending {
                requested: amount,
                pending: self.pending,
            });
        }
        Ok(Self {
            pending: self.pending - amount,
            ..self
        })
    }
}

fn check_amount(amount: Decimal) -> Result<(), WalletError> {
    if amount <= Decimal::ZERO {
        return Err(WalletError::NonPositiveAmount);
    }
    check_precision(amount)
}

fn check_precision(amount: Decimal) -> Result<(), WalletError> {
    if amount.normalize().scale() > money::SCALE {
        return Err(WalletError::TooPrecise);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn wallet(available: &str, pending: &str) -> StoreWallet {
        StoreWallet {
            available: d(available),
            pending: d(pending),
            ..StoreWallet::default()
        }
    }

    #[test]
    fn test_credit_sale_updates_available_and_earned() {
        let w = StoreWallet::default().credit_sale(d("2.50")).unwrap();
        assert_eq!(w.available, d("2.50"));
        assert_eq!(w.earned, d("2.50"));
        assert_eq!(w.pending, Decimal::ZERO);
        assert_eq!(w.withdrawn, Decimal::ZERO);
    }

    #[test]
    fn test_credit_sale_accepts_zero_profit() {
        let w = wallet("1.00", "0").credit_sale(Decimal::ZERO).unwrap();
        assert_eq!(w.available, d("1.00"));
    }

    #[test]
    fn test_credit_sale_rejects_negative() {
        assert_eq!(
            StoreWallet::default().credit_sale(d("-1")),
            Err(WalletError::NonPositiveAmount)
        );
    }

    #[test]
    fn test_hold_then_complete_withdrawal() {
        let w = wallet("100.00", "0")
            .hold_withdrawal(d("40.00"))
            .unwrap();
        assert_eq!(w.available, d("60.00"));
        assert_eq!(w.pending, d("40.00"));

        let w = w.complete_withdrawal(d("40.00")).unwrap();
        assert_eq!(w.available, d("60.00"));
        assert_eq!(w.pending, Decimal::ZERO);
        assert_eq!(w.withdrawn, d("40.00"));
    }

    #[test]
    fn test_hold_then_release_withdrawal() {
        let w = wallet("100.00", "0")
            .hold_withdrawal(d("40.00"))
            .unwrap()
            .release_withdrawal(d("40.00"))
            .unwrap();
        assert_eq!(w.available, d("100.00"));
        assert_eq!(w.pending, Decimal::ZERO);
        assert_eq!(w.withdrawn, Decimal::ZERO);
    }

    #[test]
    fn test_hold_requires_available() {
        let err = wallet("10.00", "0").hold_withdrawal(d("10.01")).unwrap_err();
        assert!(matches!(err, WalletError::InsufficientAvailable { .. }));
    }

    #[test]
    fn test_pending_cannot_go_negative() {
        let err = wallet("0", "5.00").complete_withdrawal(d("6.00")).unwrap_err();
        assert!(matches!(err, WalletError::InsufficientPending { .. }));
        let err = wallet("0", "5.00").release_withdrawal(d("6.00")).unwrap_err();
        assert!(matches!(err, WalletError::InsufficientPending { .. }));
    }

    #[test]
    fn test_amount_validation() {
        assert_eq!(
            wallet("10", "0").hold_withdrawal(Decimal::ZERO),
            Err(WalletError::NonPositiveAmount)
        );
        assert_eq!(
            wallet("10", "0").hold_withdrawal(d("1.001")),
            Err(WalletError::TooPrecise)
        );
    }

    #[test]
    fn test_adjust() {
        let w = wallet("10.00", "0").adjust(d("5.00")).unwrap();
        assert_eq!(w.available, d("15.00"));
        let w = w.adjust(d("-15.00")).unwrap();
        assert_eq!(w.available, Decimal::ZERO);
        assert!(w.adjust(d("-0.01")).is_err());
        assert_eq!(w.adjust(Decimal::ZERO), Err(WalletError::NonPositiveAmount));
    }

    #[test]
    fn test_apply_dispatches_on_kind() {
        let w = wallet("20.00", "0")
            .apply(LedgerKind::WithdrawalHold, d("15.00"))
            .unwrap()
            .apply(LedgerKind::WithdrawalPaid, d("15.00"))
            .unwrap();
        assert_eq!(w.available, d("5.00"));
        assert_eq!(w.withdrawn, d("15.00"));

        let w = w.apply(LedgerKind::Adjustment, d("-5.00")).unwrap();
        assert_eq!(w.available, Decimal::ZERO);
    }

    #[test]
    fn test_balance_is_conserved_across_withdrawal_lifecycle() {
        let start = wallet("50.00", "0").credit_sale(d("10.00")).unwrap();
        let held = start.hold_withdrawal(d("25.00")).unwrap();
        assert_eq!(held.balance(), start.balance());

        let paid = held.complete_withdrawal(d("25.00")).unwrap();
        assert_eq!(paid.balance() + paid.withdrawn, start.balance());
    }
}
