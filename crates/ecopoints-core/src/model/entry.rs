//! Ledger entry kinds and the immutable [`LedgerEntry`] record.
//!
//! The kind decides the sign of an entry: amounts are always stored as
//! non-negative integers and the kind says whether they add to or subtract
//! from the balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of point-affecting events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Points credited for submitting a waste report.
    EarnedReport,
    /// Points credited for completing a collection task.
    EarnedCollection,
    /// Points debited by a redemption.
    Redeemed,
}

/// Error returned when parsing an unknown entry kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntryKind {
    /// The unrecognised input string.
    pub raw: String,
}

impl fmt::Display for UnknownEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown entry kind '{}': expected one of earned_report, earned_collect, redeemed",
            self.raw
        )
    }
}

impl std::error::Error for UnknownEntryKind {}

/// Direction of an entry's effect on the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Credit,
    Debit,
}

impl EntryKind {
    /// All kinds in catalog order.
    pub const ALL: [Self; 3] = [Self::EarnedReport, Self::EarnedCollection, Self::Redeemed];

    /// Return the canonical storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EarnedReport => "earned_report",
            Self::EarnedCollection => "earned_collect",
            Self::Redeemed => "redeemed",
        }
    }

    /// Whether the entry adds to or subtracts from the balance.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::EarnedReport | Self::EarnedCollection => Direction::Credit,
            Self::Redeemed => Direction::Debit,
        }
    }

    #[must_use]
    pub const fn is_credit(self) -> bool {
        matches!(self.direction(), Direction::Credit)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = UnknownEntryKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earned_report" | "report" => Ok(Self::EarnedReport),
            "earned_collect" | "earned_collection" | "collect" | "collection" => {
                Ok(Self::EarnedCollection)
            }
            "redeemed" | "redeem" => Ok(Self::Redeemed),
            _ => Err(UnknownEntryKind { raw: s.to_string() }),
        }
    }
}

impl Serialize for EntryKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntryKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// One immutable accrual or debit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Monotonic store-assigned identifier.
    pub id: i64,
    pub user_id: i64,
    pub kind: EntryKind,
    pub amount: u64,
    pub description: String,
    /// Wall-clock time of the append, microseconds since the Unix epoch.
    pub created_at_us: i64,
    /// Integrity hash chaining this entry to the user's previous one.
    pub entry_hash: String,
}

impl LedgerEntry {
    /// Wall-clock time of the append as a UTC timestamp.
    #[must_use]
    pub const fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.created_at_us)
    }

    /// Signed contribution of this entry to the raw balance.
    #[must_use]
    pub fn signed_amount(&self) -> i128 {
        match self.kind.direction() {
            Direction::Credit => i128::from(self.amount),
            Direction::Debit => -i128::from(self.amount),
        }
    }
}
