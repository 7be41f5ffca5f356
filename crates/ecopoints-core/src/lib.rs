//! ecopoints-core: the rewards ledger behind ecopoints.
//!
//! Users earn points for reporting and collecting waste and spend them on
//! catalog rewards. Every point movement is an immutable [`model::LedgerEntry`];
//! balances are always recomputed from the ledger ([`balance`]), never stored.
//!
//! # Conventions
//!
//! - **Errors**: domain operations return [`error::LedgerResult`]; store
//!   setup and configuration use `anyhow::Result` with context.
//! - **Logging**: use `tracing` macros with structured `user_id`,
//!   `reward_id` and `amount` fields on every mutation.

pub mod balance;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod impact;
pub mod ledger;
pub mod model;
pub mod notify;
pub mod redeem;
pub mod users;
pub mod verify;

pub use balance::{Tally, compute_balance};
pub use catalog::Catalog;
pub use error::{ErrorCode, LedgerError, LedgerResult};
pub use ledger::Ledger;
pub use redeem::{RedeemRequest, Redeemer, Redemption};
