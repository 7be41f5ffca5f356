//! `eco credit`: record points earned for a report or a collection.

use anyhow::Result;
use clap::Args;
use ecopoints_core::Ledger;
use ecopoints_core::model::{EntryKind, LedgerEntry};
use serde::Serialize;

use super::Session;
use crate::output::{pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct CreditArgs {
    /// Kind of earning: `report` or `collect`.
    #[arg(long, value_parser = parse_kind)]
    pub kind: EntryKind,

    /// Points to credit (zero or more).
    #[arg(long, allow_negative_numbers = true)]
    pub amount: i64,

    /// Free-text description; collection quantities such as "12.5 kg" feed
    /// `eco impact`.
    #[arg(long, default_value = "")]
    pub description: String,
}

fn parse_kind(raw: &str) -> Result<EntryKind, String> {
    raw.parse::<EntryKind>().map_err(|e| e.to_string())
}

#[derive(Debug, Serialize)]
struct CreditReport {
    entry: LedgerEntry,
    balance: u64,
}

/// Execute `eco credit` for the resolved user.
///
/// # Errors
///
/// Returns an error for a debit kind, a negative amount, an unknown user,
/// or a store failure.
pub fn run_credit(args: &CreditArgs, session: &Session<'_>) -> Result<()> {
    let conn = session.open_ledger()?;
    let user = session.require_user(&conn)?;

    let ledger = Ledger::new(&conn).with_notifications(session.config.project.notifications.enabled);
    let entry = ledger
        .credit(user.id, args.kind, args.amount, args.description.trim())
        .map_err(|e| session.fail(&e))?;
    let balance = ledger.balance_for(user.id).map_err(|e| session.fail(&e))?;

    let report = CreditReport { entry, balance };
    render_mode(
        session.output,
        &report,
        |r, w| {
            writeln!(
                w,
                "{}\t{}\t{}\tbalance={}",
                r.entry.id, r.entry.kind, r.entry.amount, r.balance
            )
        },
        |r, w| {
            writeln!(w, "Credited {} points", r.entry.amount)?;
            pretty_kv(w, "Kind", r.entry.kind.as_str())?;
            if !r.entry.description.is_empty() {
                pretty_kv(w, "For", &r.entry.description)?;
            }
            pretty_kv(w, "Balance", r.balance.to_string())
        },
    )
}
