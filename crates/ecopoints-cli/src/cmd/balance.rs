//! `eco balance`: the user's current redeemable points.

use anyhow::Result;
use clap::Args;
use ecopoints_core::balance::surface_deficit;
use ecopoints_core::{Ledger, Tally};
use serde::Serialize;

use super::Session;
use crate::output::{pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct BalanceArgs {}

/// Balance view. `entries` is the observation token accepted by
/// `eco redeem --expect-entries`.
#[derive(Debug, Serialize)]
struct BalanceReport {
    user_id: i64,
    email: String,
    balance: u64,
    earned: u64,
    redeemed: u64,
    entries: u64,
}

/// Execute `eco balance`.
///
/// # Errors
///
/// Returns an error for an unknown user or a store failure.
pub fn run_balance(_args: &BalanceArgs, session: &Session<'_>) -> Result<()> {
    let conn = session.open_ledger()?;
    let user = session.require_user(&conn)?;

    let ledger = Ledger::new(&conn);
    let entries = ledger.list_for(user.id).map_err(|e| session.fail(&e))?;
    let tally = surface_deficit(user.id, Tally::of(&entries));

    let report = BalanceReport {
        user_id: user.id,
        email: user.email,
        balance: tally.balance(),
        earned: tally.earned,
        redeemed: tally.redeemed,
        entries: entries.len() as u64,
    };
    render_mode(
        session.output,
        &report,
        |r, w| writeln!(w, "{}\tentries={}", r.balance, r.entries),
        |r, w| {
            pretty_section(w, &format!("Points for {}", r.email))?;
            pretty_kv(w, "Balance", r.balance.to_string())?;
            pretty_kv(w, "Earned", r.earned.to_string())?;
            pretty_kv(w, "Redeemed", r.redeemed.to_string())?;
            pretty_kv(w, "Entries", r.entries.to_string())
        },
    )
}
