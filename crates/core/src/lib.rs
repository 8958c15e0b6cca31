//! Bundlehub Core - Shared domain library.
//!
//! This crate provides the domain types used across all Bundlehub components:
//! - `storefront` - The JSON API server for agents, customers and admins
//! - `cli` - Command-line tools for migrations, admin users and reconciliation
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain rules - no I/O, no
//! database access, no HTTP clients. Balance arithmetic and status transitions
//! live here so every caller applies exactly the same rules.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, phone numbers, slugs and statuses
//! - [`money`] - Decimal money helpers and product pricing
//! - [`wallet`] - Store wallet balance operations
//! - [`order`] - Combined payment/order state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod money;
pub mod order;
pub mod types;
pub mod wallet;

pub use money::{Pricing, PricingError};
pub use order::{OrderState, TransitionError};
pub use types::*;
pub use wallet::{StoreWallet, WalletError};
