//! `eco notifications`: the user's notification outbox.

use anyhow::Result;
use clap::{Args, Subcommand};
use ecopoints_core::notify;
use serde::Serialize;

use super::{Session, format_timestamp};
use crate::output::{pretty_section, render, render_mode};

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
pub struct NotificationsArgs {
    /// Include notifications that were already read.
    #[arg(long)]
    pub all: bool,

    #[command(subcommand)]
    pub command: Option<NotificationsCommand>,
}

#[derive(Subcommand, Debug)]
pub enum NotificationsCommand {
    /// Mark a notification as read.
    Read {
        /// Notification id.
        id: i64,
    },
}

#[derive(Debug, Serialize)]
struct MarkedRead {
    id: i64,
    is_read: bool,
}

/// Execute `eco notifications`.
///
/// Listing degrades to an empty outbox on a store failure. Marking a
/// notification read does not.
///
/// # Errors
///
/// Returns an error for an unknown user or notification, or a store failure.
pub fn run_notifications(args: &NotificationsArgs, session: &Session<'_>) -> Result<()> {
    let conn = session.open_ledger()?;
    let user = session.require_user(&conn)?;

    if let Some(NotificationsCommand::Read { id }) = args.command {
        notify::mark_read(&conn, user.id, id).map_err(|e| session.fail(&e))?;
        return render(session.output, &MarkedRead { id, is_read: true }, |m, w| {
            writeln!(w, "marked {} as read", m.id)
        });
    }

    let notifications = session.listing_or_empty(
        "notifications",
        if args.all {
            notify::list_for(&conn, user.id)
        } else {
            notify::unread_for(&conn, user.id)
        },
    )?;

    render_mode(
        session.output,
        &notifications,
        |items, w| {
            for n in items {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}",
                    n.id,
                    n.kind.as_str(),
                    if n.is_read { "read" } else { "unread" },
                    n.message
                )?;
            }
            Ok(())
        },
        |items, w| {
            pretty_section(w, "Notifications")?;
            if items.is_empty() {
                return writeln!(w, "Nothing new.");
            }
            for n in items {
                let marker = if n.is_read { ' ' } else { '*' };
                writeln!(
                    w,
                    "{marker} #{:<4} {}  {}",
                    n.id,
                    format_timestamp(n.created_at_us),
                    n.message
                )?;
            }
            Ok(())
        },
    )
}
