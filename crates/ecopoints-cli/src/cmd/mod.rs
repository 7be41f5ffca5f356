//! Subcommand handlers for `eco`.
//!
//! Handlers share the same shape: open the project ledger, resolve the
//! acting user when the command needs one, run a core operation and render
//! the result. Failures are rendered once as a structured error and then
//! returned so the process exits non-zero.

pub mod balance;
pub mod completions;
pub mod credit;
pub mod history;
pub mod impact;
pub mod init;
pub mod notifications;
pub mod redeem;
pub mod rewards;
pub mod signin;
pub mod verify;

use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use ecopoints_core::config::{EffectiveConfig, data_dir};
use ecopoints_core::db::{DB_FILE_NAME, open_store};
use ecopoints_core::model::User;
use ecopoints_core::{ErrorCode, LedgerError, users};
use rusqlite::Connection;

use crate::identity;
use crate::output::{CliError, OutputMode, render_error, render_notice};

/// Everything a handler needs besides its own arguments.
pub struct Session<'a> {
    pub project_root: &'a Path,
    pub config: &'a EffectiveConfig,
    pub output: OutputMode,
    pub user_flag: Option<&'a str>,
}

impl Session<'_> {
    /// Path of the ledger database for this project.
    pub fn db_path(&self) -> PathBuf {
        data_dir(self.project_root).join(DB_FILE_NAME)
    }

    /// Open the project ledger, failing with `E1001` when `eco init` has not
    /// been run.
    pub fn open_ledger(&self) -> anyhow::Result<Connection> {
        let db_path = self.db_path();
        if !db_path.exists() {
            render_error(
                self.output,
                &CliError::from_code(
                    ErrorCode::NotInitialized,
                    format!("no ledger found at {}", db_path.display()),
                ),
            )?;
            anyhow::bail!("ledger not initialized");
        }

        match open_store(&db_path, self.config.project.store.busy_timeout()) {
            Ok(conn) => Ok(conn),
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "failed to open ledger store");
                render_error(
                    self.output,
                    &CliError::from_code(
                        ErrorCode::StoreUnavailable,
                        "Failed to reach the ledger. Please try again.",
                    ),
                )?;
                Err(err)
            }
        }
    }

    /// Resolve the acting user and load their record.
    pub fn require_user(&self, conn: &Connection) -> anyhow::Result<User> {
        let key = match identity::require_identity(
            self.user_flag,
            self.config.user.default_user.as_deref(),
        ) {
            Ok(key) => key,
            Err(e) => {
                render_error(
                    self.output,
                    &CliError::from_code(ErrorCode::InvalidIdentity, &e.message),
                )?;
                anyhow::bail!("{}", e.message);
            }
        };

        users::require_by_key(conn, &key).map_err(|err| self.fail(&err))
    }

    /// Unwrap a listing, degrading a store failure to an empty list plus one
    /// notice. Any other error is rendered and returned.
    pub fn listing_or_empty<T>(
        &self,
        listing: &str,
        result: Result<Vec<T>, LedgerError>,
    ) -> anyhow::Result<Vec<T>> {
        match result {
            Ok(items) => Ok(items),
            Err(err @ LedgerError::IoFailure(_)) => {
                tracing::warn!(listing, error = %err, "listing unavailable");
                render_notice(self.output, &err.user_message())?;
                Ok(Vec::new())
            }
            Err(err) => Err(self.fail(&err)),
        }
    }

    /// Render a ledger error and convert it for `?` propagation.
    pub fn fail(&self, err: &LedgerError) -> anyhow::Error {
        if let Err(render_err) = render_error(self.output, &CliError::from(err)) {
            return render_err;
        }
        anyhow::anyhow!("{}: {err}", err.code())
    }
}

/// Format a microsecond timestamp for human output.
pub fn format_timestamp(micros: i64) -> String {
    Utc.timestamp_micros(micros)
        .single()
        .map_or_else(|| micros.to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}
