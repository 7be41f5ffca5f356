//! Canonical `SQLite` schema for the ecopoints ledger.
//!
//! - `users` holds one row per identity key; the key never changes
//! - `ledger_entries` is append-only: triggers abort any UPDATE or DELETE
//! - `rewards` is the mutable catalog (only availability and listing change)
//! - `notifications` is the outbox written alongside ledger appends
//! - `store_meta` tracks the schema version

/// Migration v1: identity, ledger and catalog tables.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE CHECK (length(trim(email)) > 0),
    name TEXT NOT NULL,
    created_at_us INTEGER NOT NULL
);

CREATE TRIGGER IF NOT EXISTS users_identity_immutable
BEFORE UPDATE OF email ON users
BEGIN
    SELECT RAISE(ABORT, 'user identity key is immutable');
END;

CREATE TABLE IF NOT EXISTS ledger_entries (
    entry_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(user_id),
    kind TEXT NOT NULL CHECK (kind IN ('earned_report', 'earned_collect', 'redeemed')),
    amount INTEGER NOT NULL CHECK (amount >= 0),
    description TEXT NOT NULL,
    created_at_us INTEGER NOT NULL,
    entry_hash TEXT NOT NULL UNIQUE
);

CREATE TRIGGER IF NOT EXISTS ledger_entries_no_update
BEFORE UPDATE ON ledger_entries
BEGIN
    SELECT RAISE(ABORT, 'ledger entries are immutable');
END;

CREATE TRIGGER IF NOT EXISTS ledger_entries_no_delete
BEFORE DELETE ON ledger_entries
BEGIN
    SELECT RAISE(ABORT, 'ledger entries are immutable');
END;

CREATE TABLE IF NOT EXISTS rewards (
    reward_id INTEGER PRIMARY KEY AUTOINCREMENT CHECK (reward_id > 0),
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    cost INTEGER NOT NULL CHECK (cost > 0),
    description TEXT,
    collection_info TEXT NOT NULL DEFAULT '',
    is_available INTEGER NOT NULL DEFAULT 1 CHECK (is_available IN (0, 1)),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: notification outbox and read-path indexes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE TABLE IF NOT EXISTS notifications (
    notification_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(user_id),
    kind TEXT NOT NULL CHECK (kind IN ('points_credited', 'reward_redeemed')),
    message TEXT NOT NULL,
    is_read INTEGER NOT NULL DEFAULT 0 CHECK (is_read IN (0, 1)),
    created_at_us INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ledger_entries_user_entry
    ON ledger_entries(user_id, entry_id DESC);

CREATE INDEX IF NOT EXISTS idx_ledger_entries_kind
    ON ledger_entries(kind, user_id);

CREATE INDEX IF NOT EXISTS idx_rewards_available_cost
    ON rewards(is_available, cost, reward_id);

CREATE INDEX IF NOT EXISTS idx_notifications_user_unread
    ON notifications(user_id, is_read, notification_id DESC);
";

/// Indexes expected after all migrations have run.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_ledger_entries_user_entry",
    "idx_ledger_entries_kind",
    "idx_rewards_available_cost",
    "idx_notifications_user_unread",
];
