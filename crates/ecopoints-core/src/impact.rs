//! Community impact summary.
//!
//! Collection credits carry the collected quantity as free text
//! ("Collected 12.5 kg of plastic"); the first decimal number in that text
//! is taken as kilograms.

use serde::Serialize;

use crate::model::{EntryKind, LedgerEntry};

/// Kilograms of CO₂ offset per kilogram of collected waste, by default.
pub const DEFAULT_CO2_KG_PER_KG: f64 = 0.5;

/// Parse the first decimal quantity (`\d+(\.\d+)?`) out of free text.
///
/// A trailing dot without digits is not part of the number.
#[must_use]
pub fn parse_quantity(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;

    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    text[start..end].parse().ok()
}

/// Round to one decimal place.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Aggregate figures over a set of ledger entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ImpactSummary {
    pub waste_collected_kg: f64,
    pub reports_submitted: usize,
    pub points_earned: u64,
    pub co2_offset_kg: f64,
}

impl ImpactSummary {
    /// Summarize entries, converting collected kilograms to CO₂ with
    /// `co2_kg_per_kg`.
    #[must_use]
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = &'a LedgerEntry>,
        co2_kg_per_kg: f64,
    ) -> Self {
        let mut collected = 0.0_f64;
        let mut reports = 0_usize;
        let mut points = 0_u64;

        for entry in entries {
            match entry.kind {
                EntryKind::EarnedReport => {
                    reports += 1;
                    points = points.saturating_add(entry.amount);
                }
                EntryKind::EarnedCollection => {
                    collected += parse_quantity(&entry.description).unwrap_or(0.0);
                    points = points.saturating_add(entry.amount);
                }
                EntryKind::Redeemed => {}
            }
        }

        Self {
            waste_collected_kg: round1(collected),
            reports_submitted: reports,
            points_earned: points,
            co2_offset_kg: round1(collected * co2_kg_per_kg),
        }
    }
}
