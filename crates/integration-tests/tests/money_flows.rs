//! Whole-lifecycle rules for orders and store wallets.
//!
//! These walk the same state types the services persist, step by step, the
//! way an order and a withdrawal move through the system.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use bundlehub_core::{
    LedgerKind, OrderState, OrderStatus, PaymentStatus, Pricing, StoreWallet, TransitionError,
    WalletError, money,
};

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn test_sale_credits_profit_exactly_once() {
    let pricing = Pricing::new(d("6.00"), d("4.50")).unwrap();
    let mut wallet = StoreWallet::default();

    let state = OrderState::default()
        .mark_paid()
        .unwrap()
        .transition(OrderStatus::Processing)
        .unwrap();
    let completed = state.transition(OrderStatus::Completed).unwrap();
    wallet = wallet.apply(LedgerKind::SaleProfit, pricing.profit).unwrap();

    // A second completion (webhook replay, reconcile race) is refused
    assert!(completed.transition(OrderStatus::Completed).is_err());
    assert_eq!(wallet.available, d("1.50"));
    assert_eq!(wallet.earned, d("1.50"));
}

#[test]
fn test_failed_delivery_refunds_and_never_credits() {
    let failed = OrderState::default()
        .mark_paid()
        .unwrap()
        .transition(OrderStatus::Processing)
        .unwrap()
        .transition(OrderStatus::Failed)
        .unwrap();
    assert!(failed.needs_refund());

    let refunded = failed.refund().unwrap();
    assert_eq!(refunded.payment, PaymentStatus::Refunded);
    assert!(!refunded.needs_refund());
    assert!(refunded.refund().is_err());
    assert_eq!(
        refunded.transition(OrderStatus::Completed),
        Err(TransitionError::Order {
            from: OrderStatus::Failed,
            to: OrderStatus::Completed
        })
    );
}

#[test]
fn test_abandoned_checkout_cannot_be_paid_later() {
    let cancelled = OrderState::default().payment_failed().unwrap();
    assert_eq!(cancelled.order, OrderStatus::Cancelled);
    assert!(cancelled.mark_paid().is_err());
    assert!(!cancelled.needs_refund());
}

#[test]
fn test_withdrawal_round_trips_conserve_money() {
    let start = StoreWallet::default()
        .apply(LedgerKind::SaleProfit, d("30.00"))
        .unwrap()
        .apply(LedgerKind::SaleProfit, d("20.00"))
        .unwrap();
    assert_eq!(start.earned, d("50.00"));

    // Rejected request goes back to available
    let released = start
        .apply(LedgerKind::WithdrawalHold, d("45.00"))
        .unwrap()
        .apply(LedgerKind::WithdrawalReleased, d("45.00"))
        .unwrap();
    assert_eq!(released, start);

    // Approved request leaves the platform
    let held = start.apply(LedgerKind::WithdrawalHold, d("45.00")).unwrap();
    assert_eq!(held.available, d("5.00"));
    assert_eq!(held.pending, d("45.00"));
    let paid = held.apply(LedgerKind::WithdrawalPaid, d("45.00")).unwrap();
    assert_eq!(paid.balance() + paid.withdrawn, start.earned);
}

#[test]
fn test_held_funds_cannot_be_requested_twice() {
    let wallet = StoreWallet::default()
        .credit_sale(d("40.00"))
        .unwrap()
        .hold_withdrawal(d("30.00"))
        .unwrap();
    assert!(matches!(
        wallet.hold_withdrawal(d("30.00")),
        Err(WalletError::InsufficientAvailable { .. })
    ));
}

#[test]
fn test_adjustment_cannot_overdraw() {
    let wallet = StoreWallet::default().credit_sale(d("2.00")).unwrap();
    assert!(wallet.apply(LedgerKind::Adjustment, d("-2.01")).is_err());
    let zeroed = wallet.apply(LedgerKind::Adjustment, d("-2.00")).unwrap();
    assert_eq!(zeroed.available, Decimal::ZERO);
    // Lifetime earnings are untouched by corrections
    assert_eq!(zeroed.earned, d("2.00"));
}

#[test]
fn test_gateway_amounts_match_prices() {
    let pricing = Pricing::new(d("12.99"), d("10.00")).unwrap();
    let minor = money::to_minor_units(pricing.price).unwrap();
    assert_eq!(minor, 1299);
    assert_eq!(money::from_minor_units(minor), pricing.price);
}
