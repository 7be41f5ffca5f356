//! `eco impact`: community impact over recent ledger activity.

use anyhow::Result;
use clap::Args;
use ecopoints_core::Ledger;
use ecopoints_core::impact::ImpactSummary;
use serde::Serialize;

use super::Session;
use crate::output::{pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ImpactArgs {
    /// Number of most recent entries to summarize (defaults to `[impact] window`).
    #[arg(long)]
    pub window: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ImpactReport {
    window: u32,
    #[serde(flatten)]
    summary: ImpactSummary,
}

/// Execute `eco impact`.
///
/// # Errors
///
/// Returns an error if the ledger cannot be read.
pub fn run_impact(args: &ImpactArgs, session: &Session<'_>) -> Result<()> {
    let conn = session.open_ledger()?;
    let impact = &session.config.project.impact;
    let window = args.window.unwrap_or(impact.window);

    let entries = Ledger::new(&conn)
        .list_recent(window)
        .map_err(|e| session.fail(&e))?;
    let summary = ImpactSummary::from_entries(&entries, impact.co2_kg_per_kg);

    render_mode(
        session.output,
        &ImpactReport { window, summary },
        |r, w| {
            writeln!(
                w,
                "waste_kg={}\treports={}\tpoints={}\tco2_kg={}",
                r.summary.waste_collected_kg,
                r.summary.reports_submitted,
                r.summary.points_earned,
                r.summary.co2_offset_kg
            )
        },
        |r, w| {
            pretty_section(w, &format!("Community impact (last {} entries)", r.window))?;
            pretty_kv(w, "Collected", format!("{:.1} kg", r.summary.waste_collected_kg))?;
            pretty_kv(w, "Reports", r.summary.reports_submitted.to_string())?;
            pretty_kv(w, "Points", r.summary.points_earned.to_string())?;
            pretty_kv(w, "CO2 offset", format!("{:.1} kg", r.summary.co2_offset_kg))
        },
    )
}
