//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `stores` - Agent store profile and admin approval
//! - `products` - Store catalog priced over vendor cost
//! - `orders` - Checkout, payment confirmation, manual status changes
//! - `fulfillment` - Vendor purchases and reconciliation
//! - `store_wallet` - Ledger-backed store wallet mutations
//! - `withdrawals` - Store cash-outs
//! - `deposits` - Customer wallet top-ups
//! - `stats` - Dashboard figures
//!
//! Services borrow the pool and clients from [`crate::state::AppState`] for
//! the duration of one request.

pub mod auth;
pub mod deposits;
pub mod fulfillment;
pub mod logo;
pub mod orders;
pub mod products;
pub mod references;
pub mod stats;
pub mod store_wallet;
pub mod stores;
pub mod withdrawals;

pub use auth::AuthService;
pub use deposits::DepositService;
pub use fulfillment::{FulfillmentService, ReconcileReport};
pub use orders::OrderService;
pub use products::ProductService;
pub use stores::StoreService;
pub use withdrawals::WithdrawalService;
