//! Redemption coordinator.
//!
//! A redemption reads the user's ledger, checks the balance against the
//! requested reward and appends one `Redeemed` entry. All of that happens
//! inside a single `BEGIN IMMEDIATE` transaction: the write lock is held
//! before the balance is read, so two redemptions for the same user can
//! never both pass the balance check against the same snapshot.
//!
//! Callers that display a balance before asking for a redemption can also
//! pass the entry count they saw as `expected_entries`; if the ledger moved
//! in between, the request is refused with
//! [`LedgerError::StaleObservation`].

use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;

use crate::balance::{Tally, compute_balance, surface_deficit};
use crate::catalog;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{append_in, list_in};
use crate::model::{EntryKind, LedgerEntry, RedeemTarget, RewardItem};
use crate::notify::{self, NotificationKind};
use crate::users;

/// Ledger description recorded for a redeem-all request.
pub const REDEEM_ALL_DESCRIPTION: &str = "Redeemed all points";

/// A redemption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedeemRequest {
    pub target: RedeemTarget,
    /// Ledger entry count the caller observed; `None` skips the check.
    pub expected_entries: Option<u64>,
}

impl RedeemRequest {
    /// Request by raw reward id, where `0` means the whole balance.
    #[must_use]
    pub const fn reward(reward_id: i64) -> Self {
        Self {
            target: RedeemTarget::from_reward_id(reward_id),
            expected_entries: None,
        }
    }

    /// Require the ledger to still hold `count` entries when the redemption runs.
    #[must_use]
    pub const fn expecting(mut self, count: u64) -> Self {
        self.expected_entries = Some(count);
        self
    }
}

/// A completed redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redemption {
    /// The appended `Redeemed` entry.
    pub entry: LedgerEntry,
    /// The catalog item, absent for redeem-all.
    pub reward: Option<RewardItem>,
    pub balance_before: u64,
    pub balance_after: u64,
}

/// Executes redemptions against the ledger and catalog.
pub struct Redeemer<'conn> {
    conn: &'conn Connection,
    notifications: bool,
}

impl<'conn> Redeemer<'conn> {
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            notifications: true,
        }
    }

    /// Enable or disable the "reward redeemed" notification row.
    #[must_use]
    pub const fn with_notifications(mut self, enabled: bool) -> Self {
        self.notifications = enabled;
        self
    }

    /// Redeem a catalog reward, or the whole balance when `reward_id` is `0`.
    ///
    /// # Errors
    ///
    /// See [`Redeemer::redeem_with`].
    pub fn redeem(&self, user_id: i64, reward_id: i64) -> LedgerResult<Redemption> {
        self.redeem_with(user_id, RedeemRequest::reward(reward_id))
    }

    /// Validate and execute a redemption atomically.
    ///
    /// On failure nothing is appended.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UserNotFound`] for an unregistered user.
    /// - [`LedgerError::StaleObservation`] when `expected_entries` is stale.
    /// - [`LedgerError::NothingToRedeem`] for redeem-all on a zero balance.
    /// - [`LedgerError::RewardNotFound`] for an unknown or unavailable reward.
    /// - [`LedgerError::InvalidAmount`] for a reward without a positive cost.
    /// - [`LedgerError::InsufficientBalance`] when the cost exceeds the balance.
    /// - [`LedgerError::IoFailure`] when the store fails or the write lock
    ///   cannot be taken within the busy timeout.
    pub fn redeem_with(&self, user_id: i64, request: RedeemRequest) -> LedgerResult<Redemption> {
        let result = self.redeem_in_transaction(user_id, request);
        match &result {
            Ok(redemption) => tracing::info!(
                user_id,
                reward_id = request.target.reward_id(),
                entry_id = redemption.entry.id,
                amount = redemption.entry.amount,
                balance_after = redemption.balance_after,
                "redeemed points"
            ),
            Err(error) => tracing::info!(
                user_id,
                reward_id = request.target.reward_id(),
                code = %error.code(),
                %error,
                "redemption refused"
            ),
        }
        result
    }

    fn redeem_in_transaction(
        &self,
        user_id: i64,
        request: RedeemRequest,
    ) -> LedgerResult<Redemption> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        users::require_id_in(&tx, user_id)?;

        let entries = list_in(&tx, user_id)?;
        if let Some(expected) = request.expected_entries {
            let actual = entries.len() as u64;
            if actual != expected {
                return Err(LedgerError::StaleObservation { expected, actual });
            }
        }

        let balance_before = surface_deficit(user_id, Tally::of(&entries)).balance();

        let (amount, description, reward) = match request.target {
            RedeemTarget::All => {
                if balance_before == 0 {
                    return Err(LedgerError::NothingToRedeem);
                }
                (balance_before, REDEEM_ALL_DESCRIPTION.to_string(), None)
            }
            RedeemTarget::Item(reward_id) => {
                let item = catalog::redeemable_in(&tx, reward_id)?;
                if item.cost == 0 {
                    return Err(LedgerError::InvalidAmount { amount: 0 });
                }
                if balance_before < item.cost {
                    return Err(LedgerError::InsufficientBalance {
                        balance: balance_before,
                        cost: item.cost,
                    });
                }
                (item.cost, format!("Redeemed {}", item.name), Some(item))
            }
        };

        let entry = append_in(&tx, user_id, EntryKind::Redeemed, amount, &description)?;
        if self.notifications {
            let message = reward.as_ref().map_or_else(
                || format!("You redeemed all {amount} of your points"),
                |item| format!("You redeemed {} for {amount} points", item.name),
            );
            notify::queue_in(&tx, user_id, NotificationKind::RewardRedeemed, &message)?;
        }

        let balance_after = compute_balance(&list_in(&tx, user_id)?);
        tx.commit()?;

        Ok(Redemption {
            entry,
            reward,
            balance_before,
            balance_after,
        })
    }
}
