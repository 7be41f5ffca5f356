//! Append-only ledger store.
//!
//! Entries are only ever inserted. There is no update or delete path in this
//! module, and the schema triggers reject both at the database level.
//!
//! Every public write runs in its own `BEGIN IMMEDIATE` transaction and
//! returns only after the commit, so an entry handed back to the caller is
//! durable. The `*_in` helpers run inside a transaction the caller owns.

use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use rusqlite::types::Type;

use crate::balance::{Tally, surface_deficit};
use crate::db::now_us;
use crate::error::{LedgerError, LedgerResult};
use crate::model::{Direction, EntryKind, LedgerEntry};
use crate::notify::{self, NotificationKind};
use crate::users;
use crate::verify::chain_hash;

/// Ceiling on a user's earned total and on their redeemed total. Every sum,
/// and so every balance, stays representable as a stored `INTEGER`.
pub const MAX_DIRECTION_TOTAL: u64 = i64::MAX.unsigned_abs();

const ENTRY_COLUMNS: &str =
    "entry_id, user_id, kind, amount, description, created_at_us, entry_hash";

/// Read and append access to the ledger.
pub struct Ledger<'conn> {
    conn: &'conn Connection,
    notifications: bool,
}

impl<'conn> Ledger<'conn> {
    /// Create a ledger handle backed by the given connection.
    ///
    /// Credits queue a notification by default.
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            notifications: true,
        }
    }

    /// Enable or disable notification rows for credits.
    #[must_use]
    pub const fn with_notifications(mut self, enabled: bool) -> Self {
        self.notifications = enabled;
        self
    }

    /// Append one entry for a user.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] when `amount` is negative or would push
    ///   the user's total for that direction past [`MAX_DIRECTION_TOTAL`].
    /// - [`LedgerError::UserNotFound`] when `user_id` is not registered.
    /// - [`LedgerError::IoFailure`] when the store fails.
    pub fn append(
        &self,
        user_id: i64,
        kind: EntryKind,
        amount: i64,
        description: &str,
    ) -> LedgerResult<LedgerEntry> {
        let amount = checked_amount(amount)?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        users::require_id_in(&tx, user_id)?;
        let entry = append_in(&tx, user_id, kind, amount, description)?;
        tx.commit()?;

        tracing::info!(
            user_id,
            entry_id = entry.id,
            kind = %entry.kind,
            amount = entry.amount,
            "appended ledger entry"
        );
        Ok(entry)
    }

    /// Credit earned points to a user and queue a "points credited" notice.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotACredit`] when `kind` is a debit.
    /// - Every error of [`Ledger::append`].
    pub fn credit(
        &self,
        user_id: i64,
        kind: EntryKind,
        amount: i64,
        description: &str,
    ) -> LedgerResult<LedgerEntry> {
        if !kind.is_credit() {
            return Err(LedgerError::NotACredit {
                kind: kind.to_string(),
            });
        }
        let amount = checked_amount(amount)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        users::require_id_in(&tx, user_id)?;
        let entry = append_in(&tx, user_id, kind, amount, description)?;
        if self.notifications {
            notify::queue_in(
                &tx,
                user_id,
                NotificationKind::PointsCredited,
                &format!("You earned {amount} points: {description}"),
            )?;
        }
        tx.commit()?;

        tracing::info!(
            user_id,
            entry_id = entry.id,
            kind = %entry.kind,
            amount,
            "credited points"
        );
        Ok(entry)
    }

    /// All entries of a user, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::IoFailure`] if the query fails.
    pub fn list_for(&self, user_id: i64) -> LedgerResult<Vec<LedgerEntry>> {
        list_in(self.conn, user_id)
    }

    /// The most recent entries across all users.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::IoFailure`] if the query fails.
    pub fn list_recent(&self, limit: u32) -> LedgerResult<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries ORDER BY entry_id DESC LIMIT ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([i64::from(limit)], entry_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Number of entries recorded for a user.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::IoFailure`] if the query fails.
    pub fn entry_count(&self, user_id: i64) -> LedgerResult<u64> {
        count_in(self.conn, user_id)
    }

    /// Earned/redeemed sums for a user, logging any deficit.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::IoFailure`] if the query fails.
    pub fn tally_for(&self, user_id: i64) -> LedgerResult<Tally> {
        let entries = self.list_for(user_id)?;
        Ok(surface_deficit(user_id, Tally::of(&entries)))
    }

    /// Current redeemable balance of a user.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::IoFailure`] if the query fails.
    pub fn balance_for(&self, user_id: i64) -> LedgerResult<u64> {
        Ok(self.tally_for(user_id)?.balance())
    }
}

pub(crate) fn checked_amount(amount: i64) -> LedgerResult<u64> {
    u64::try_from(amount).map_err(|_| LedgerError::InvalidAmount { amount })
}

/// Insert an entry inside a caller-owned transaction, chaining its hash to
/// the user's previous entry.
pub(crate) fn append_in(
    conn: &Connection,
    user_id: i64,
    kind: EntryKind,
    amount: u64,
    description: &str,
) -> LedgerResult<LedgerEntry> {
    let stored_amount = i64::try_from(amount).map_err(|_| LedgerError::InvalidAmount {
        amount: i64::MAX,
    })?;
    let tally = Tally::of(&list_in(conn, user_id)?);
    let total = match kind.direction() {
        Direction::Credit => tally.earned,
        Direction::Debit => tally.redeemed,
    };
    if total
        .checked_add(amount)
        .is_none_or(|total| total > MAX_DIRECTION_TOTAL)
    {
        return Err(LedgerError::InvalidAmount {
            amount: stored_amount,
        });
    }
    let created_at_us = now_us();
    let prev = last_hash_in(conn, user_id)?;
    let entry_hash = chain_hash(
        prev.as_deref(),
        user_id,
        kind,
        amount,
        description,
        created_at_us,
    );

    conn.execute(
        "INSERT INTO ledger_entries (user_id, kind, amount, description, created_at_us, entry_hash)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            kind.as_str(),
            stored_amount,
            description,
            created_at_us,
            entry_hash
        ],
    )?;

    Ok(LedgerEntry {
        id: conn.last_insert_rowid(),
        user_id,
        kind,
        amount,
        description: description.to_string(),
        created_at_us,
        entry_hash,
    })
}

pub(crate) fn list_in(conn: &Connection, user_id: i64) -> LedgerResult<Vec<LedgerEntry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE user_id = ?1 ORDER BY entry_id DESC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([user_id], entry_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub(crate) fn count_in(conn: &Connection, user_id: i64) -> LedgerResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM ledger_entries WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(count).unwrap_or_default())
}

fn last_hash_in(conn: &Connection, user_id: i64) -> LedgerResult<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT entry_hash FROM ledger_entries WHERE user_id = ?1
             ORDER BY entry_id DESC LIMIT 1",
            [user_id],
            |row| row.get(0),
        )
        .optional()?)
}

pub(crate) fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let kind_raw: String = row.get(2)?;
    let kind = kind_raw
        .parse::<EntryKind>()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error)))?;
    let amount_raw: i64 = row.get(3)?;
    let amount = u64::try_from(amount_raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(error))
    })?;

    Ok(LedgerEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind,
        amount,
        description: row.get(4)?,
        created_at_us: row.get(5)?,
        entry_hash: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::users::sign_in;

    fn setup() -> (Connection, i64) {
        let conn = open_in_memory().expect("open ledger");
        let user = sign_in(&conn, "ada@example.org", "Ada").expect("sign in");
        (conn, user.id)
    }

    #[test]
    fn append_returns_durable_entry() {
        let (conn, user_id) = setup();
        let ledger = Ledger::new(&conn);

        let entry = ledger
            .append(user_id, EntryKind::EarnedReport, 10, "Reported plastic")
            .expect("append");
        assert!(entry.id > 0);
        assert_eq!(entry.amount, 10);
        assert!(entry.entry_hash.starts_with("blake3:"));

        let listed = ledger.list_for(user_id).expect("list");
        assert_eq!(listed, vec![entry]);
    }

    #[test]
    fn negative_amount_is_rejected_without_append() {
        let (conn, user_id) = setup();
        let ledger = Ledger::new(&conn);

        let err = ledger
            .append(user_id, EntryKind::EarnedReport, -1, "bad")
            .expect_err("negative amount");
        assert!(matches!(err, LedgerError::InvalidAmount { amount: -1 }));
        assert_eq!(ledger.entry_count(user_id).expect("count"), 0);
    }

    #[test]
    fn zero_amount_is_allowed() {
        let (conn, user_id) = setup();
        let ledger = Ledger::new(&conn);
        ledger
            .append(user_id, EntryKind::EarnedCollection, 0, "Empty bin")
            .expect("zero amount");
        assert_eq!(ledger.entry_count(user_id).expect("count"), 1);
    }

    #[test]
    fn unknown_user_is_rejected() {
        let (conn, _) = setup();
        let err = Ledger::new(&conn)
            .append(404, EntryKind::EarnedReport, 5, "ghost")
            .expect_err("unknown user");
        assert!(matches!(err, LedgerError::UserNotFound { .. }));
    }

    #[test]
    fn list_is_most_recent_first_and_stable() {
        let (conn, user_id) = setup();
        let ledger = Ledger::new(&conn);
        for amount in [5, 6, 7] {
            ledger
                .append(user_id, EntryKind::EarnedReport, amount, "report")
                .expect("append");
        }

        let first = ledger.list_for(user_id).expect("list");
        let amounts: Vec<u64> = first.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![7, 6, 5]);

        let second = ledger.list_for(user_id).expect("list again");
        assert_eq!(first, second);
    }

    #[test]
    fn lists_are_scoped_per_user() {
        let (conn, ada) = setup();
        let bob = sign_in(&conn, "bob@example.org", "Bob").expect("sign in").id;
        let ledger = Ledger::new(&conn);
        ledger.append(ada, EntryKind::EarnedReport, 3, "a").expect("append");
        ledger.append(bob, EntryKind::EarnedReport, 4, "b").expect("append");

        assert_eq!(ledger.list_for(ada).expect("list").len(), 1);
        assert_eq!(ledger.balance_for(bob).expect("balance"), 4);
        assert_eq!(ledger.list_recent(10).expect("recent").len(), 2);
    }

    #[test]
    fn store_rejects_mutation_of_entries() {
        let (conn, user_id) = setup();
        let entry = Ledger::new(&conn)
            .append(user_id, EntryKind::EarnedReport, 9, "report")
            .expect("append");

        let update = conn.execute(
            "UPDATE ledger_entries SET amount = 900 WHERE entry_id = ?1",
            [entry.id],
        );
        assert!(update.is_err());

        let delete = conn.execute("DELETE FROM ledger_entries WHERE entry_id = ?1", [entry.id]);
        assert!(delete.is_err());

        assert_eq!(Ledger::new(&conn).balance_for(user_id).expect("balance"), 9);
    }

    #[test]
    fn credit_queues_notification() {
        let (conn, user_id) = setup();
        let ledger = Ledger::new(&conn);
        ledger
            .credit(user_id, EntryKind::EarnedCollection, 25, "Collected 4 kg")
            .expect("credit");

        let unread = notify::unread_for(&conn, user_id).expect("unread");
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind, NotificationKind::PointsCredited);
    }

    #[test]
    fn credit_without_notifications() {
        let (conn, user_id) = setup();
        Ledger::new(&conn)
            .with_notifications(false)
            .credit(user_id, EntryKind::EarnedReport, 5, "report")
            .expect("credit");
        assert!(notify::unread_for(&conn, user_id).expect("unread").is_empty());
    }

    #[test]
    fn redeemed_kind_cannot_be_credited() {
        let (conn, user_id) = setup();
        let err = Ledger::new(&conn)
            .credit(user_id, EntryKind::Redeemed, 5, "sneaky")
            .expect_err("debit kind");
        assert!(matches!(err, LedgerError::NotACredit { .. }));
        assert_eq!(Ledger::new(&conn).entry_count(user_id).expect("count"), 0);
    }

    #[test]
    fn earned_total_is_capped_at_i64_max() {
        let (conn, user_id) = setup();
        let ledger = Ledger::new(&conn);
        ledger
            .append(user_id, EntryKind::EarnedReport, i64::MAX - 1, "huge")
            .expect("below cap");
        ledger
            .append(user_id, EntryKind::EarnedReport, 1, "exactly at cap")
            .expect("at cap");

        let err = ledger
            .append(user_id, EntryKind::EarnedCollection, 1, "over")
            .expect_err("over cap");
        assert!(matches!(err, LedgerError::InvalidAmount { amount: 1 }));

        let tally = ledger.tally_for(user_id).expect("tally");
        assert_eq!(tally.earned, MAX_DIRECTION_TOTAL);
        assert_eq!(ledger.entry_count(user_id).expect("count"), 2);
    }

    #[test]
    fn redeemed_total_is_capped_independently() {
        let (conn, user_id) = setup();
        let ledger = Ledger::new(&conn);
        ledger
            .append(user_id, EntryKind::Redeemed, i64::MAX, "drained")
            .expect("debit at cap");
        ledger
            .append(user_id, EntryKind::EarnedReport, i64::MAX, "credit side unaffected")
            .expect("credit at cap");

        let err = ledger
            .append(user_id, EntryKind::Redeemed, 1, "over")
            .expect_err("debit over cap");
        assert!(matches!(err, LedgerError::InvalidAmount { amount: 1 }));
        assert_eq!(ledger.balance_for(user_id).expect("balance"), 0);
    }
}
