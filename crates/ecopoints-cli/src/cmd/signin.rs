//! `eco signin`: register a user on first sign-in.

use anyhow::Result;
use clap::Args;
use ecopoints_core::users;

use super::{Session, format_timestamp};
use crate::output::{pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct SigninArgs {
    /// Identity key reported by the identity provider.
    #[arg(long)]
    pub email: String,

    /// Display name, used only when the user is first registered.
    #[arg(long, default_value = "")]
    pub name: String,
}

/// Execute `eco signin`. Idempotent: signing in twice returns the same user.
///
/// # Errors
///
/// Returns an error if the ledger is not initialized, the key is blank, or
/// the store fails.
pub fn run_signin(args: &SigninArgs, session: &Session<'_>) -> Result<()> {
    let conn = session.open_ledger()?;
    let user = users::sign_in(&conn, &args.email, &args.name).map_err(|e| session.fail(&e))?;

    render_mode(
        session.output,
        &user,
        |u, w| writeln!(w, "{}\t{}\t{}", u.id, u.email, u.name),
        |u, w| {
            writeln!(w, "Signed in")?;
            pretty_kv(w, "User", format!("#{}", u.id))?;
            pretty_kv(w, "Email", &u.email)?;
            if !u.name.is_empty() {
                pretty_kv(w, "Name", &u.name)?;
            }
            pretty_kv(w, "Since", format_timestamp(u.created_at_us))
        },
    )
}
