//! Ledger integrity chain.
//!
//! Every entry stores a BLAKE3 hash over its own fields and the hash of the
//! same user's previous entry, so any row edited or removed behind the
//! store's back breaks the chain from that point on.
//!
//! Hash input, newline-terminated and tab-separated:
//!
//! ```text
//! {prev_hash|genesis}\t{user_id}\t{kind}\t{amount}\t{description}\t{created_at_us}\n
//! ```

use rusqlite::Connection;
use serde::Serialize;

use crate::error::LedgerResult;
use crate::ledger::entry_from_row;
use crate::model::EntryKind;

/// Chain predecessor used for a user's first entry.
pub const GENESIS: &str = "genesis";

/// Compute the chained hash for an entry, in `blake3:<hex>` form.
#[must_use]
pub fn chain_hash(
    prev_hash: Option<&str>,
    user_id: i64,
    kind: EntryKind,
    amount: u64,
    description: &str,
    created_at_us: i64,
) -> String {
    let input = format!(
        "{}\t{}\t{}\t{}\t{}\t{}\n",
        prev_hash.unwrap_or(GENESIS),
        user_id,
        kind,
        amount,
        description,
        created_at_us,
    );
    format!("blake3:{}", blake3::hash(input.as_bytes()))
}

/// An entry whose stored hash does not match its recomputed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainMismatch {
    pub user_id: i64,
    pub entry_id: i64,
    pub expected: String,
    pub found: String,
}

/// Outcome of a full-ledger verification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub users_checked: usize,
    pub entries_checked: usize,
    pub mismatches: Vec<ChainMismatch>,
}

impl VerifyReport {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Recompute every user's hash chain in append order.
///
/// Each entry is checked against the hash stored on its predecessor, so a
/// single tampered row reports itself and not its successors.
///
/// # Errors
///
/// Returns [`crate::error::LedgerError::IoFailure`] if reading the ledger
/// fails.
pub fn verify_chains(conn: &Connection) -> LedgerResult<VerifyReport> {
    let mut stmt = conn.prepare(
        "SELECT entry_id, user_id, kind, amount, description, created_at_us, entry_hash
         FROM ledger_entries ORDER BY user_id ASC, entry_id ASC",
    )?;
    let rows = stmt.query_map([], entry_from_row)?;

    let mut report = VerifyReport::default();
    let mut current_user: Option<i64> = None;
    let mut prev_hash: Option<String> = None;

    for row in rows {
        let entry = row?;
        if current_user != Some(entry.user_id) {
            current_user = Some(entry.user_id);
            prev_hash = None;
            report.users_checked += 1;
        }

        let expected = chain_hash(
            prev_hash.as_deref(),
            entry.user_id,
            entry.kind,
            entry.amount,
            &entry.description,
            entry.created_at_us,
        );
        if expected != entry.entry_hash {
            tracing::warn!(
                user_id = entry.user_id,
                entry_id = entry.id,
                "ledger entry hash mismatch"
            );
            report.mismatches.push(ChainMismatch {
                user_id: entry.user_id,
                entry_id: entry.id,
                expected,
                found: entry.entry_hash.clone(),
            });
        }
        report.entries_checked += 1;
        prev_hash = Some(entry.entry_hash);
    }

    Ok(report)
}
