//! Domain records shared by the ledger, catalog and identity layers.

pub mod entry;
pub mod reward;
pub mod user;

pub use entry::{Direction, EntryKind, LedgerEntry, UnknownEntryKind};
pub use reward::{NewReward, REDEEM_ALL, RedeemTarget, RewardItem};
pub use user::User;
