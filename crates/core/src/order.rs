//! Combined payment and fulfillment state of an order.
//!
//! [`PaymentStatus`] and [`OrderStatus`] each have their own transition
//! table. [`OrderState`] checks the pair: fulfillment can only start or
//! finish on a paid order, and a refund is only possible once fulfillment
//! has stopped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{OrderStatus, PaymentStatus};

/// Rejected order state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("order cannot move from {from} to {to}")]
    Order { from: OrderStatus, to: OrderStatus },
    #[error("payment cannot move from {from} to {to}")]
    Payment {
        from: PaymentStatus,
        to: PaymentStatus,
    },
    #[error("order must be paid before it can be {0}")]
    Unpaid(OrderStatus),
    #[error("a {0} order cannot be refunded")]
    NotRefundable(OrderStatus),
}

/// Payment and fulfillment status of one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderState {
    pub payment: PaymentStatus,
    pub order: OrderStatus,
}

impl OrderState {
    #[must_use]
    pub const fn new(payment: PaymentStatus, order: OrderStatus) -> Self {
        Self { payment, order }
    }

    /// The gateway or the customer wallet confirmed payment.
    ///
    /// # Errors
    ///
    /// Fails unless payment is pending and the order has not been cancelled.
    pub fn mark_paid(self) -> Result<Self, TransitionError> {
        if self.order != OrderStatus::Pending {
            return Err(TransitionError::Payment {
                from: self.payment,
                to: PaymentStatus::Paid,
            });
        }
        self.with_payment(PaymentStatus::Paid)
    }

    /// The gateway reported the payment as failed; the order is cancelled.
    ///
    /// # Errors
    ///
    /// Fails unless payment is still pending.
    pub fn payment_failed(self) -> Result<Self, TransitionError> {
        self.with_payment(PaymentStatus::Failed)?
            .with_order(OrderStatus::Cancelled)
    }

    /// The gateway confirmed a charge on an order that was already cancelled.
    ///
    /// The order stays `cancelled` and the payment becomes `paid`, so the
    /// money is held and [`OrderState::needs_refund`] holds. A payment
    /// previously reported as failed counts as well, since the gateway's
    /// final word wins.
    ///
    /// # Errors
    ///
    /// Fails unless the order is cancelled and no payment has been recorded.
    pub fn paid_after_cancel(self) -> Result<Self, TransitionError> {
        if self.order != OrderStatus::Cancelled
            || !matches!(self.payment, PaymentStatus::Pending | PaymentStatus::Failed)
        {
            return Err(TransitionError::Payment {
                from: self.payment,
                to: PaymentStatus::Paid,
            });
        }
        Ok(Self {
            payment: PaymentStatus::Paid,
            ..self
        })
    }

    /// Move fulfillment to `next`, enforcing the payment preconditions.
    ///
    /// `processing` and `completed` need a paid order. A successful move to
    /// `completed` is the single point where the store is credited, since it
    /// can only happen once per order.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Order`] for an illegal fulfillment move and
    /// [`TransitionError::Unpaid`] when payment has not been confirmed.
    pub fn transition(self, next: OrderStatus) -> Result<Self, TransitionError> {
        if !self.order.can_transition_to(next) {
            return Err(TransitionError::Order {
                from: self.order,
                to: next,
            });
        }
        if matches!(next, OrderStatus::Processing | OrderStatus::Completed)
            && self.payment != PaymentStatus::Paid
        {
            return Err(TransitionError::Unpaid(next));
        }
        self.with_order(next)
    }

    /// Return a paid order's money to the customer.
    ///
    /// # Errors
    ///
    /// Fails unless the order is `failed` or `cancelled` and payment is `paid`.
    pub fn refund(self) -> Result<Self, TransitionError> {
        if !matches!(self.order, OrderStatus::Failed | OrderStatus::Cancelled) {
            return Err(TransitionError::NotRefundable(self.order));
        }
        self.with_payment(PaymentStatus::Refunded)
    }

    /// Fulfillment stopped while the customer's money is still held.
    #[must_use]
    pub fn needs_refund(&self) -> bool {
        self.payment == PaymentStatus::Paid
            && matches!(self.order, OrderStatus::Failed | OrderStatus::Cancelled)
    }

    fn with_payment(self, next: PaymentStatus) -> Result<Self, TransitionError> {
        if !self.payment.can_transition_to(next) {
            return Err(TransitionError::Payment {
                from: self.payment,
                to: next,
            });
        }
        Ok(Self {
            payment: next,
            ..self
        })
    }

    fn with_order(self, next: OrderStatus) -> Result<Self, TransitionError> {
        if !self.order.can_transition_to(next) {
            return Err(TransitionError::Order {
                from: self.order,
                to: next,
            });
        }
        Ok(Self {
            order: next,
            ..self
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn paid() -> OrderState {
        OrderState::default().mark_paid().unwrap()
    }

    #[test]
    fn test_happy_path() {
        let state = paid()
            .transition(OrderStatus::Processing)
            .unwrap()
            .transition(OrderStatus::Completed)
            .unwrap();
        assert_eq!(
            state,
            OrderState::new(PaymentStatus::Paid, OrderStatus::Completed)
        );
        assert!(!state.needs_refund());
    }

    #[test]
    fn test_unpaid_order_cannot_be_fulfilled() {
        let err = OrderState::default()
            .transition(OrderStatus::Processing)
            .unwrap_err();
        assert_eq!(err, TransitionError::Unpaid(OrderStatus::Processing));
    }

    #[test]
    fn test_completed_is_final() {
        let done = OrderState::new(PaymentStatus::Paid, OrderStatus::Completed);
        assert!(matches!(
            done.transition(OrderStatus::Completed),
            Err(TransitionError::Order { .. })
        ));
        assert!(matches!(
            done.transition(OrderStatus::Failed),
            Err(TransitionError::Order { .. })
        ));
        assert!(matches!(done.refund(), Err(TransitionError::NotRefundable(_))));
    }

    #[test]
    fn test_failed_paid_order_needs_refund() {
        let failed = paid()
            .transition(OrderStatus::Processing)
            .unwrap()
            .transition(OrderStatus::Failed)
            .unwrap();
        assert!(failed.needs_refund());

        let refunded = failed.refund().unwrap();
        assert_eq!(refunded.payment, PaymentStatus::Refunded);
        assert!(!refunded.needs_refund());
    }

    #[test]
    fn test_retry_requires_money_still_held() {
        let failed = OrderState::new(PaymentStatus::Paid, OrderStatus::Failed);
        assert_eq!(
            failed.transition(OrderStatus::Processing).unwrap().order,
            OrderStatus::Processing
        );

        let refunded = failed.refund().unwrap();
        assert_eq!(
            refunded.transition(OrderStatus::Processing),
            Err(TransitionError::Unpaid(OrderStatus::Processing))
        );
    }

    #[test]
    fn test_cancel_pending() {
        let cancelled = OrderState::default()
            .transition(OrderStatus::Cancelled)
            .unwrap();
        assert!(!cancelled.needs_refund());

        let cancelled_paid = paid().transition(OrderStatus::Cancelled).unwrap();
        assert!(cancelled_paid.needs_refund());
    }

    #[test]
    fn test_payment_failed_cancels() {
        let state = OrderState::default().payment_failed().unwrap();
        assert_eq!(
            state,
            OrderState::new(PaymentStatus::Failed, OrderStatus::Cancelled)
        );
        assert!(state.mark_paid().is_err());
    }

    #[test]
    fn test_double_payment_rejected() {
        assert!(matches!(
            paid().mark_paid(),
            Err(TransitionError::Payment { .. })
        ));
    }

    #[test]
    fn test_refund_requires_stopped_order() {
        let processing = paid().transition(OrderStatus::Processing).unwrap();
        assert_eq!(
            processing.refund(),
            Err(TransitionError::NotRefundable(OrderStatus::Processing))
        );
    }

    #[test]
    fn test_charge_after_cancel_is_held_for_refund() {
        let cancelled = OrderState::default()
            .transition(OrderStatus::Cancelled)
            .unwrap();
        assert!(cancelled.mark_paid().is_err());

        let late = cancelled.paid_after_cancel().unwrap();
        assert_eq!(late, OrderState::new(PaymentStatus::Paid, OrderStatus::Cancelled));
        assert!(late.needs_refund());
        assert_eq!(late.refund().unwrap().payment, PaymentStatus::Refunded);
        assert_eq!(
            late.transition(OrderStatus::Processing),
            Err(TransitionError::Order {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Processing
            })
        );
    }

    #[test]
    fn test_charge_after_failed_checkout() {
        let abandoned = OrderState::default().payment_failed().unwrap();
        assert!(abandoned.paid_after_cancel().unwrap().needs_refund());
    }

    #[test]
    fn test_charge_after_cancel_needs_cancelled_unpaid_order() {
        assert!(OrderState::default().paid_after_cancel().is_err());
        let refunded = OrderState::new(PaymentStatus::Refunded, OrderStatus::Cancelled);
        assert!(refunded.paid_after_cancel().is_err());
        let paid = OrderState::new(PaymentStatus::Paid, OrderStatus::Cancelled);
        assert!(paid.paid_after_cancel().is_err());
    }
}
