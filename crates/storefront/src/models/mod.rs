//! Domain models returned by repositories and serialized by handlers.

pub mod order;
pub mod product;
pub mod session;
pub mod store;
pub mod user;
pub mod wallet;
pub mod withdrawal;

pub use order::{Order, OrderTracking};
pub use product::{Product, PublicProduct};
pub use session::{CurrentUser, keys as session_keys};
pub use store::{LedgerEntry, PublicStore, Store};
pub use user::User;
pub use wallet::{CustomerWallet, WalletTransaction};
pub use withdrawal::Withdrawal;
