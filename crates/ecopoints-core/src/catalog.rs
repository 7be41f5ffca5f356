//! Reward catalog.
//!
//! Only priced items are stored (cost > 0, id > 0). The "redeem all points"
//! choice is not a catalog row; see [`crate::model::REDEEM_ALL`].

use rusqlite::{Connection, OptionalExtension, Row, params};
use rusqlite::types::Type;

use crate::db::now_us;
use crate::error::{LedgerError, LedgerResult};
use crate::model::{NewReward, RewardItem};
use crate::users;

const REWARD_COLUMNS: &str =
    "reward_id, name, cost, description, collection_info, is_available";

/// Catalog access backed by the ledger database.
pub struct Catalog<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Catalog<'conn> {
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Rewards a registered user may currently redeem, cheapest first.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UserNotFound`] when `user_id` is not registered.
    /// - [`LedgerError::IoFailure`] when the query fails.
    pub fn list_available(&self, user_id: i64) -> LedgerResult<Vec<RewardItem>> {
        users::require_id_in(self.conn, user_id)?;
        let sql = format!(
            "SELECT {REWARD_COLUMNS} FROM rewards
             WHERE is_available = 1 AND cost > 0
             ORDER BY cost ASC, reward_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], reward_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every catalog row, including unavailable ones.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::IoFailure`] if the query fails.
    pub fn list_all(&self) -> LedgerResult<Vec<RewardItem>> {
        let sql = format!("SELECT {REWARD_COLUMNS} FROM rewards ORDER BY reward_id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], reward_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Fetch one catalog row regardless of availability.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::RewardNotFound`] when the id does not exist.
    /// - [`LedgerError::IoFailure`] when the query fails.
    pub fn get(&self, reward_id: i64) -> LedgerResult<RewardItem> {
        find_in(self.conn, reward_id)?.ok_or(LedgerError::RewardNotFound { reward_id })
    }

    /// Add a priced item to the catalog.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] when the cost is not positive.
    /// - [`LedgerError::IoFailure`] when the insert fails (including a blank
    ///   name, which the schema rejects).
    pub fn add(&self, reward: &NewReward) -> LedgerResult<RewardItem> {
        if reward.cost <= 0 {
            return Err(LedgerError::InvalidAmount {
                amount: reward.cost,
            });
        }
        self.conn.execute(
            "INSERT INTO rewards (name, cost, description, collection_info, created_at_us)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                reward.name.trim(),
                reward.cost,
                reward.description,
                reward.collection_info,
                now_us()
            ],
        )?;
        let reward_id = self.conn.last_insert_rowid();
        tracing::info!(reward_id, cost = reward.cost, name = %reward.name, "added reward");
        self.get(reward_id)
    }

    /// Show or hide an item in the redeemable listing.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::RewardNotFound`] when the id does not exist.
    /// - [`LedgerError::IoFailure`] when the update fails.
    pub fn set_available(&self, reward_id: i64, available: bool) -> LedgerResult<RewardItem> {
        let changed = self.conn.execute(
            "UPDATE rewards SET is_available = ?1 WHERE reward_id = ?2",
            params![available, reward_id],
        )?;
        if changed == 0 {
            return Err(LedgerError::RewardNotFound { reward_id });
        }
        tracing::info!(reward_id, available, "changed reward availability");
        self.get(reward_id)
    }
}

/// Fetch a redeemable item inside a caller-owned transaction.
///
/// Unavailable items are reported as not found: they are not part of the
/// redeemable catalog.
pub(crate) fn redeemable_in(conn: &Connection, reward_id: i64) -> LedgerResult<RewardItem> {
    match find_in(conn, reward_id)? {
        Some(item) if item.is_available => Ok(item),
        _ => Err(LedgerError::RewardNotFound { reward_id }),
    }
}

fn find_in(conn: &Connection, reward_id: i64) -> LedgerResult<Option<RewardItem>> {
    let sql = format!("SELECT {REWARD_COLUMNS} FROM rewards WHERE reward_id = ?1");
    Ok(conn.query_row(&sql, [reward_id], reward_from_row).optional()?)
}

fn reward_from_row(row: &Row<'_>) -> rusqlite::Result<RewardItem> {
    let cost_raw: i64 = row.get(2)?;
    let cost = u64::try_from(cost_raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Integer, Box::new(error))
    })?;
    Ok(RewardItem {
        id: row.get(0)?,
        name: row.get(1)?,
        cost,
        description: row.get(3)?,
        collection_info: row.get(4)?,
        is_available: row.get(5)?,
    })
}
