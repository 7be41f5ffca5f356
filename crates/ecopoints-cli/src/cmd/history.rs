//! `eco history`: the user's ledger, most recent first.

use anyhow::Result;
use clap::Args;
use ecopoints_core::Ledger;
use ecopoints_core::model::{Direction, LedgerEntry};

use super::{Session, format_timestamp};
use crate::output::{pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Maximum entries to show.
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: usize,
}

/// Execute `eco history`.
///
/// A store failure while reading the ledger is reported once and degrades
/// to an empty history instead of failing the command.
///
/// # Errors
///
/// Returns an error when the ledger cannot be opened or the user is unknown.
pub fn run_history(args: &HistoryArgs, session: &Session<'_>) -> Result<()> {
    let conn = session.open_ledger()?;
    let user = session.require_user(&conn)?;

    let mut entries =
        session.listing_or_empty("history", Ledger::new(&conn).list_for(user.id))?;
    entries.truncate(args.limit);

    render_mode(
        session.output,
        &entries,
        |entries, w| {
            for entry in entries {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}\t{}",
                    entry.id,
                    entry.created_at_us,
                    entry.kind,
                    signed(entry),
                    entry.description
                )?;
            }
            Ok(())
        },
        |entries, w| {
            pretty_section(w, &format!("History for {}", user.email))?;
            if entries.is_empty() {
                return writeln!(w, "No points activity yet.");
            }
            for entry in entries {
                writeln!(
                    w,
                    "{}  {:>7}  {:<15} {}",
                    format_timestamp(entry.created_at_us),
                    signed(entry),
                    entry.kind.as_str(),
                    entry.description
                )?;
            }
            Ok(())
        },
    )
}

fn signed(entry: &LedgerEntry) -> String {
    match entry.kind.direction() {
        Direction::Credit => format!("+{}", entry.amount),
        Direction::Debit => format!("-{}", entry.amount),
    }
}
