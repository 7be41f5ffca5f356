//! Balance projection over a user's ledger.
//!
//! The ledger is the single source of truth; the balance is never stored.
//! [`compute_balance`] is the pure projection and [`Tally`] keeps the two
//! partial sums so callers can see when redemptions outran earnings.

use crate::model::{Direction, LedgerEntry};
use serde::Serialize;

/// Earned and redeemed partial sums of a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    /// Sum over `EarnedReport` and `EarnedCollection` entries.
    pub earned: u64,
    /// Sum over `Redeemed` entries.
    pub redeemed: u64,
}

impl Tally {
    /// Partition entries by direction and sum each side.
    ///
    /// Appends cap each side at `i64::MAX`, so sums over a stored ledger are
    /// exact. Sums over arbitrary entries saturate at `u64::MAX`.
    #[must_use]
    pub fn of<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Self {
        entries
            .into_iter()
            .fold(Self::default(), |mut tally, entry| {
                match entry.kind.direction() {
                    Direction::Credit => tally.earned = tally.earned.saturating_add(entry.amount),
                    Direction::Debit => {
                        tally.redeemed = tally.redeemed.saturating_add(entry.amount);
                    }
                }
                tally
            })
    }

    /// Redeemable balance: `max(0, earned - redeemed)`.
    #[must_use]
    pub const fn balance(self) -> u64 {
        self.earned.saturating_sub(self.redeemed)
    }

    /// Amount by which redemptions exceed earnings (zero when consistent).
    #[must_use]
    pub const fn deficit(self) -> u64 {
        self.redeemed.saturating_sub(self.earned)
    }
}

/// Derive the redeemable balance from a ledger.
///
/// A ledger whose redemptions exceed its earnings yields zero; use
/// [`Tally::deficit`] to detect that case.
#[must_use]
pub fn compute_balance<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> u64 {
    Tally::of(entries).balance()
}

/// Log a warning when a tally carries a deficit.
///
/// Returns the tally unchanged so it can sit in an expression chain.
pub fn surface_deficit(user_id: i64, tally: Tally) -> Tally {
    let deficit = tally.deficit();
    if deficit > 0 {
        tracing::warn!(
            user_id,
            earned = tally.earned,
            redeemed = tally.redeemed,
            deficit,
            "ledger redemptions exceed earnings; balance clamped to zero"
        );
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryKind;

    fn entry(id: i64, kind: EntryKind, amount: u64) -> LedgerEntry {
        LedgerEntry {
            id,
            user_id: 1,
            kind,
            amount,
            description: String::new(),
            created_at_us: 0,
            entry_hash: String::new(),
        }
    }

    #[test]
    fn empty_ledger_has_zero_balance() {
        assert_eq!(compute_balance(&[]), 0);
        assert_eq!(Tally::of(&[]), Tally::default());
    }

    #[test]
    fn earned_minus_redeemed() {
        let ledger = [
            entry(1, EntryKind::EarnedReport, 50),
            entry(2, EntryKind::EarnedCollection, 30),
            entry(3, EntryKind::Redeemed, 20),
        ];
        assert_eq!(compute_balance(&ledger), 60);
        let tally = Tally::of(&ledger);
        assert_eq!(tally.earned, 80);
        assert_eq!(tally.redeemed, 20);
        assert_eq!(tally.deficit(), 0);
    }

    #[test]
    fn overdrawn_ledger_clamps_and_reports_deficit() {
        let ledger = [
            entry(1, EntryKind::EarnedReport, 10),
            entry(2, EntryKind::Redeemed, 25),
        ];
        assert_eq!(compute_balance(&ledger), 0);
        let tally = surface_deficit(1, Tally::of(&ledger));
        assert_eq!(tally.deficit(), 15);
    }

    #[test]
    fn order_does_not_matter() {
        let forward = [
            entry(1, EntryKind::Redeemed, 5),
            entry(2, EntryKind::EarnedReport, 12),
        ];
        let reversed = [forward[1].clone(), forward[0].clone()];
        assert_eq!(compute_balance(&forward), compute_balance(&reversed));
    }

    #[test]
    fn sums_saturate() {
        let ledger = [
            entry(1, EntryKind::EarnedReport, u64::MAX),
            entry(2, EntryKind::EarnedCollection, 1),
        ];
        assert_eq!(compute_balance(&ledger), u64::MAX);
    }
}
