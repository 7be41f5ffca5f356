//! `eco completions`: shell completion scripts.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `command` to `out`, named after the
/// command's binary.
///
/// # Errors
///
/// Returns an error if flushing `out` fails.
pub fn run_completions(
    shell: Shell,
    command: &mut clap::Command,
    out: &mut dyn Write,
) -> Result<()> {
    let bin_name = command.get_name().to_string();
    generate(shell, command, bin_name, out);
    out.flush()?;
    Ok(())
}
