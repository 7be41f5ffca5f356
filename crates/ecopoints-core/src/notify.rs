//! Notification outbox.
//!
//! Credits and redemptions write one row here in the same transaction as
//! their ledger entry. Delivery (polling, push, email) belongs to whoever
//! reads the outbox; this module only records and marks rows.

use rusqlite::{Connection, Row, params};
use rusqlite::types::Type;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::db::now_us;
use crate::error::{LedgerError, LedgerResult};

/// Domain event a notification was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PointsCredited,
    RewardRedeemed,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PointsCredited => "points_credited",
            Self::RewardRedeemed => "reward_redeemed",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored notification kind is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification kind '{0}'")]
pub struct UnknownNotificationKind(pub String);

impl FromStr for NotificationKind {
    type Err = UnknownNotificationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "points_credited" => Ok(Self::PointsCredited),
            "reward_redeemed" => Ok(Self::RewardRedeemed),
            other => Err(UnknownNotificationKind(other.to_string())),
        }
    }
}

/// One outbox row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub created_at_us: i64,
}

const NOTIFICATION_COLUMNS: &str =
    "notification_id, user_id, kind, message, is_read, created_at_us";

pub(crate) fn queue_in(
    conn: &Connection,
    user_id: i64,
    kind: NotificationKind,
    message: &str,
) -> LedgerResult<i64> {
    conn.execute(
        "INSERT INTO notifications (user_id, kind, message, created_at_us)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, kind.as_str(), message, now_us()],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(user_id, notification_id = id, kind = %kind, "queued notification");
    Ok(id)
}

/// Unread notifications of a user, newest first.
///
/// # Errors
///
/// Returns [`LedgerError::IoFailure`] if the query fails.
pub fn unread_for(conn: &Connection, user_id: i64) -> LedgerResult<Vec<Notification>> {
    query(
        conn,
        &format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE user_id = ?1 AND is_read = 0 ORDER BY notification_id DESC"
        ),
        user_id,
    )
}

/// Every notification of a user, newest first.
///
/// # Errors
///
/// Returns [`LedgerError::IoFailure`] if the query fails.
pub fn list_for(conn: &Connection, user_id: i64) -> LedgerResult<Vec<Notification>> {
    query(
        conn,
        &format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE user_id = ?1 ORDER BY notification_id DESC"
        ),
        user_id,
    )
}

/// Mark a notification as read. Marking an already-read row is a no-op.
///
/// # Errors
///
/// - [`LedgerError::NotificationNotFound`] for unknown ids, or ids that
///   belong to another user.
/// - [`LedgerError::IoFailure`] when the update fails.
pub fn mark_read(conn: &Connection, user_id: i64, notification_id: i64) -> LedgerResult<()> {
    let changed = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE notification_id = ?1 AND user_id = ?2",
        params![notification_id, user_id],
    )?;
    if changed == 0 {
        return Err(LedgerError::NotificationNotFound { notification_id });
    }
    Ok(())
}

fn query(conn: &Connection, sql: &str, user_id: i64) -> LedgerResult<Vec<Notification>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([user_id], notification_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    let kind_raw: String = row.get(2)?;
    let kind = kind_raw
        .parse::<NotificationKind>()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error)))?;
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind,
        message: row.get(3)?,
        is_read: row.get(4)?,
        created_at_us: row.get(5)?,
    })
}
