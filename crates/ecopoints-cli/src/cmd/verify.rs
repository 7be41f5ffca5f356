//! `eco verify`: hash-chain and deficit check across every user.

use anyhow::Result;
use clap::Args;
use ecopoints_core::verify::{VerifyReport, verify_chains};
use ecopoints_core::{ErrorCode, Ledger, users};
use serde::Serialize;

use super::Session;
use crate::output::{CliError, render_error, render_mode};

#[derive(Args, Debug, Default)]
pub struct VerifyArgs {}

/// A user whose redemptions exceed their earnings.
#[derive(Debug, Serialize)]
struct Deficit {
    user_id: i64,
    email: String,
    earned: u64,
    redeemed: u64,
    deficit: u64,
}

#[derive(Debug, Serialize)]
struct VerifyOutcome {
    ok: bool,
    #[serde(flatten)]
    chains: VerifyReport,
    deficits: Vec<Deficit>,
}

/// Recompute every user's hash chain and check that no balance is in
/// deficit.
///
/// # Errors
///
/// Returns an error when a chain does not verify, when a deficit exists and
/// `[balance] fail_on_deficit` is set, or when the store fails.
pub fn run_verify(_args: &VerifyArgs, session: &Session<'_>) -> Result<()> {
    let conn = session.open_ledger()?;
    let chains = verify_chains(&conn).map_err(|e| session.fail(&e))?;

    let ledger = Ledger::new(&conn);
    let mut deficits = Vec::new();
    for user in users::list_all(&conn).map_err(|e| session.fail(&e))? {
        let tally = ledger.tally_for(user.id).map_err(|e| session.fail(&e))?;
        if tally.deficit() > 0 {
            deficits.push(Deficit {
                user_id: user.id,
                email: user.email,
                earned: tally.earned,
                redeemed: tally.redeemed,
                deficit: tally.deficit(),
            });
        }
    }

    let fail_on_deficit = session.config.project.balance.fail_on_deficit;
    let outcome = VerifyOutcome {
        ok: chains.is_ok() && (deficits.is_empty() || !fail_on_deficit),
        chains,
        deficits,
    };

    render_mode(
        session.output,
        &outcome,
        |o, w| {
            for m in &o.chains.mismatches {
                writeln!(w, "FAIL\tchain\t{}\t{}", m.user_id, m.entry_id)?;
            }
            for d in &o.deficits {
                writeln!(w, "WARN\tdeficit\t{}\t{}", d.user_id, d.deficit)?;
            }
            writeln!(
                w,
                "{}\tusers={}\tentries={}",
                if o.ok { "OK" } else { "FAIL" },
                o.chains.users_checked,
                o.chains.entries_checked
            )
        },
        |o, w| {
            for m in &o.chains.mismatches {
                writeln!(
                    w,
                    "FAIL user #{} entry #{} (expected {}, found {})",
                    m.user_id, m.entry_id, m.expected, m.found
                )?;
            }
            for d in &o.deficits {
                writeln!(
                    w,
                    "WARN {} redeemed {} of {} earned points ({} over)",
                    d.email, d.redeemed, d.earned, d.deficit
                )?;
            }
            writeln!(
                w,
                "verify: {} ({} users, {} entries)",
                if o.ok { "success" } else { "failed" },
                o.chains.users_checked,
                o.chains.entries_checked
            )
        },
    )?;

    if !outcome.chains.is_ok() {
        render_error(
            session.output,
            &CliError::from_code(
                ErrorCode::IntegrityMismatch,
                format!(
                    "{} ledger entries failed hash verification",
                    outcome.chains.mismatches.len()
                ),
            ),
        )?;
        anyhow::bail!("verify: failed");
    }
    if !outcome.ok {
        render_error(
            session.output,
            &CliError::from_code(
                ErrorCode::IntegrityMismatch,
                format!("{} users redeemed more than they earned", outcome.deficits.len()),
            ),
        )?;
        anyhow::bail!("verify: failed");
    }
    Ok(())
}
