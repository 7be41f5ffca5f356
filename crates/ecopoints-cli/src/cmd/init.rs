//! `eco init`: create the project ledger.

use anyhow::{Context as _, Result};
use clap::Args;
use ecopoints_core::config::{ProjectConfig, data_dir};
use ecopoints_core::db::migrations::current_schema_version;
use ecopoints_core::db::{DB_FILE_NAME, open_store};
use serde::Serialize;

use super::Session;
use crate::output::{pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite `config.toml` with defaults even if `.ecopoints/` already exists.
    ///
    /// The ledger database is never recreated.
    #[arg(long)]
    pub force: bool,
}

const GITIGNORE: &str = "ecopoints.db\necopoints.db-wal\necopoints.db-shm\n";

#[derive(Debug, Serialize)]
struct InitReport {
    data_dir: String,
    database: String,
    schema_version: u32,
}

/// Execute `eco init`. Creates the project skeleton:
///
/// ```text
/// .ecopoints/
///   ecopoints.db   (ledger, migrated to the latest schema)
///   config.toml    (default project config)
///   .gitignore     (database files)
/// ```
///
/// # Errors
///
/// Returns an error if `.ecopoints/` already exists and `--force` is not
/// set, or if any filesystem or database operation fails.
pub fn run_init(args: &InitArgs, session: &Session<'_>) -> Result<()> {
    let dir = data_dir(session.project_root);
    if dir.exists() && !args.force {
        anyhow::bail!(".ecopoints/ already exists. Use `eco init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let config_path = dir.join("config.toml");
    let config_body = toml::to_string_pretty(&ProjectConfig::default())
        .context("Failed to serialize default config")?;
    std::fs::write(&config_path, config_body)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let gitignore_path = dir.join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("Failed to write {}", gitignore_path.display()))?;

    let db_path = dir.join(DB_FILE_NAME);
    let conn = open_store(&db_path, session.config.project.store.busy_timeout())?;
    let schema_version = current_schema_version(&conn).context("read schema version")?;

    tracing::info!(path = %db_path.display(), schema_version, "initialized ledger");

    let report = InitReport {
        data_dir: dir.display().to_string(),
        database: db_path.display().to_string(),
        schema_version,
    };
    render_mode(
        session.output,
        &report,
        |r, w| writeln!(w, "initialized\t{}\tschema={}", r.database, r.schema_version),
        |r, w| {
            writeln!(w, "Initialized ecopoints ledger")?;
            pretty_kv(w, "Directory", &r.data_dir)?;
            pretty_kv(w, "Database", &r.database)?;
            pretty_kv(w, "Schema", r.schema_version.to_string())
        },
    )
}
