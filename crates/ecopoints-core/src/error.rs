use std::fmt;

/// Machine-readable error codes for scripts and front-ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    UserNotFound,
    RewardNotFound,
    NotificationNotFound,
    InvalidAmount,
    NotACredit,
    InsufficientBalance,
    NothingToRedeem,
    StaleObservation,
    InvalidIdentity,
    StoreUnavailable,
    IntegrityMismatch,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::UserNotFound => "E2001",
            Self::RewardNotFound => "E2002",
            Self::NotificationNotFound => "E2003",
            Self::InvalidAmount => "E3001",
            Self::NotACredit => "E3002",
            Self::InsufficientBalance => "E3003",
            Self::NothingToRedeem => "E3004",
            Self::StaleObservation => "E3005",
            Self::InvalidIdentity => "E3006",
            Self::StoreUnavailable => "E5001",
            Self::IntegrityMismatch => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Ledger not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::UserNotFound => "User not found",
            Self::RewardNotFound => "Reward not found",
            Self::NotificationNotFound => "Notification not found",
            Self::InvalidAmount => "Invalid point amount",
            Self::NotACredit => "Entry kind is not a credit",
            Self::InsufficientBalance => "Insufficient balance",
            Self::NothingToRedeem => "No points available to redeem",
            Self::StaleObservation => "Ledger changed since it was read",
            Self::InvalidIdentity => "Invalid identity key",
            Self::StoreUnavailable => "Ledger store unavailable",
            Self::IntegrityMismatch => "Ledger integrity mismatch",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `eco init` to create the ledger."),
            Self::ConfigParseError => Some("Fix syntax in .ecopoints/config.toml and retry."),
            Self::UserNotFound => Some("Sign in first with `eco signin --email <email>`."),
            Self::RewardNotFound => Some("Run `eco rewards list` to see redeemable rewards."),
            Self::NotificationNotFound | Self::NotACredit => None,
            Self::InvalidAmount => Some("Point amounts must be zero or greater and within the ledger's range."),
            Self::InsufficientBalance => Some("Earn more points or pick a cheaper reward."),
            Self::NothingToRedeem => Some("Report or collect waste to earn points first."),
            Self::StaleObservation => Some("Reload your balance and try again."),
            Self::InvalidIdentity => Some("Provide a non-empty email address."),
            Self::StoreUnavailable => Some("Retry the action; check disk space and permissions."),
            Self::IntegrityMismatch => Some("Restore the ledger database from a backup."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failures of ledger, catalog, identity and redemption operations.
///
/// None of these is fatal: each maps to a message the user can act on and
/// the action can be re-triggered.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A point amount was negative, zero where a price is required, or would
    /// push a user's earned or redeemed total past `i64::MAX`.
    #[error("invalid amount {amount}: points must be non-negative and totals must stay in range")]
    InvalidAmount { amount: i64 },

    /// No user is registered under the identity key.
    #[error("no user registered for '{key}'")]
    UserNotFound { key: String },

    /// The reward does not exist or is not currently available.
    #[error("reward {reward_id} not found")]
    RewardNotFound { reward_id: i64 },

    /// The notification id is unknown.
    #[error("notification {notification_id} not found")]
    NotificationNotFound { notification_id: i64 },

    /// The balance does not cover the reward cost.
    #[error("insufficient balance: have {balance} points, need {cost}")]
    InsufficientBalance { balance: u64, cost: u64 },

    /// A redeem-all request was made with a zero balance.
    #[error("no points available to redeem")]
    NothingToRedeem,

    /// The caller's observed ledger size no longer matches the store.
    #[error("ledger changed since it was read: expected {expected} entries, found {actual}")]
    StaleObservation { expected: u64, actual: u64 },

    /// A credit was attempted with a debit kind.
    #[error("'{kind}' entries cannot be credited")]
    NotACredit { kind: String },

    /// The identity key was empty after normalization.
    #[error("identity key must not be empty")]
    InvalidIdentity,

    /// The persistence layer failed.
    #[error("ledger store failure: {0}")]
    IoFailure(#[from] rusqlite::Error),
}

impl LedgerError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            Self::UserNotFound { .. } => ErrorCode::UserNotFound,
            Self::RewardNotFound { .. } => ErrorCode::RewardNotFound,
            Self::NotificationNotFound { .. } => ErrorCode::NotificationNotFound,
            Self::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            Self::NothingToRedeem => ErrorCode::NothingToRedeem,
            Self::StaleObservation { .. } => ErrorCode::StaleObservation,
            Self::NotACredit { .. } => ErrorCode::NotACredit,
            Self::InvalidIdentity => ErrorCode::InvalidIdentity,
            Self::IoFailure(_) => ErrorCode::StoreUnavailable,
        }
    }

    /// Optional remediation hint for users.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    /// Message suitable for a one-line, user-visible notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::IoFailure(_) => "Failed to reach the ledger. Please try again.".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether re-triggering the same action may succeed.
    ///
    /// Every ledger error is recoverable by the user; store failures and
    /// stale observations can succeed unchanged on a second attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::IoFailure(_) | Self::StaleObservation { .. })
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
