//! Identity records.
//!
//! Users are created idempotently when the identity provider reports a
//! sign-in. The identity key (email) is normalized before use and never
//! changes afterwards; a schema trigger rejects updates to it.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::db::now_us;
use crate::error::{LedgerError, LedgerResult};
use crate::model::User;
use crate::model::user::normalize_key;

const USER_COLUMNS: &str = "user_id, email, name, created_at_us";

/// Register a user on first sign-in, or return the existing record.
///
/// The display name of an existing user is left untouched.
///
/// # Errors
///
/// - [`LedgerError::InvalidIdentity`] when the key is blank.
/// - [`LedgerError::IoFailure`] when the store fails.
pub fn sign_in(conn: &Connection, email: &str, name: &str) -> LedgerResult<User> {
    let key = normalize_key(email).ok_or(LedgerError::InvalidIdentity)?;
    let name = name.trim();

    let inserted = conn.execute(
        "INSERT INTO users (email, name, created_at_us) VALUES (?1, ?2, ?3)
         ON CONFLICT(email) DO NOTHING",
        params![key, name, now_us()],
    )?;

    let user = require_by_key(conn, &key)?;
    if inserted > 0 {
        tracing::info!(user_id = user.id, email = %user.email, "registered user");
    } else {
        tracing::debug!(user_id = user.id, "existing user signed in");
    }
    Ok(user)
}

/// Look a user up by identity key.
///
/// # Errors
///
/// Returns [`LedgerError::IoFailure`] if the query fails.
pub fn find_by_key(conn: &Connection, email: &str) -> LedgerResult<Option<User>> {
    let Some(key) = normalize_key(email) else {
        return Ok(None);
    };
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
    Ok(conn.query_row(&sql, [key], user_from_row).optional()?)
}

/// Look a user up by identity key, failing when absent.
///
/// # Errors
///
/// - [`LedgerError::UserNotFound`] when no user has this key.
/// - [`LedgerError::IoFailure`] when the query fails.
pub fn require_by_key(conn: &Connection, email: &str) -> LedgerResult<User> {
    find_by_key(conn, email)?.ok_or_else(|| LedgerError::UserNotFound {
        key: email.trim().to_string(),
    })
}

/// Look a user up by numeric id.
///
/// # Errors
///
/// Returns [`LedgerError::IoFailure`] if the query fails.
pub fn find_by_id(conn: &Connection, user_id: i64) -> LedgerResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1");
    Ok(conn.query_row(&sql, [user_id], user_from_row).optional()?)
}

/// Every registered user, in registration order.
///
/// # Errors
///
/// Returns [`LedgerError::IoFailure`] if the query fails.
pub fn list_all(conn: &Connection) -> LedgerResult<Vec<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY user_id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], user_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub(crate) fn require_id_in(conn: &Connection, user_id: i64) -> LedgerResult<User> {
    find_by_id(conn, user_id)?.ok_or_else(|| LedgerError::UserNotFound {
        key: format!("#{user_id}"),
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        created_at_us: row.get(3)?,
    })
}
