//! `eco rewards`: browse and administer the reward catalog.

use anyhow::Result;
use clap::{Args, Subcommand};
use ecopoints_core::Catalog;
use ecopoints_core::model::{NewReward, RewardItem};

use super::Session;
use crate::output::{pretty_kv, pretty_section, render_mode};

#[derive(Subcommand, Debug)]
pub enum RewardsCommand {
    /// List rewards the current user can redeem, cheapest first.
    List(ListArgs),
    /// Add a reward to the catalog.
    Add(AddArgs),
    /// Make a reward redeemable again.
    Enable(ToggleArgs),
    /// Hide a reward from the redeemable catalog.
    Disable(ToggleArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show the whole catalog, including unavailable rewards. No user needed.
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Reward name.
    #[arg(long)]
    pub name: String,

    /// Price in points; must be greater than zero.
    #[arg(long, allow_negative_numbers = true)]
    pub cost: i64,

    /// Optional longer description.
    #[arg(long)]
    pub description: Option<String>,

    /// Where and how to pick the reward up.
    #[arg(long, default_value = "")]
    pub collection_info: String,
}

#[derive(Args, Debug)]
pub struct ToggleArgs {
    /// Reward id.
    pub id: i64,
}

/// Execute an `eco rewards` subcommand.
///
/// A store failure while listing degrades to an empty catalog and a notice.
///
/// # Errors
///
/// Returns an error for unknown rewards or users, a non-positive cost, or a
/// store failure.
pub fn run_rewards(command: &RewardsCommand, session: &Session<'_>) -> Result<()> {
    let conn = session.open_ledger()?;
    let catalog = Catalog::new(&conn);

    match command {
        RewardsCommand::List(args) => {
            let items = if args.all {
                catalog.list_all()
            } else {
                let user = session.require_user(&conn)?;
                catalog.list_available(user.id)
            };
            let items = session.listing_or_empty("rewards", items)?;
            render_items(session, &items)
        }
        RewardsCommand::Add(args) => {
            let item = catalog
                .add(&NewReward {
                    name: args.name.trim().to_string(),
                    cost: args.cost,
                    description: args.description.clone(),
                    collection_info: args.collection_info.clone(),
                })
                .map_err(|e| session.fail(&e))?;
            render_item(session, "Added reward", &item)
        }
        RewardsCommand::Enable(args) => {
            let item = catalog
                .set_available(args.id, true)
                .map_err(|e| session.fail(&e))?;
            render_item(session, "Enabled reward", &item)
        }
        RewardsCommand::Disable(args) => {
            let item = catalog
                .set_available(args.id, false)
                .map_err(|e| session.fail(&e))?;
            render_item(session, "Disabled reward", &item)
        }
    }
}

fn render_items(session: &Session<'_>, items: &[RewardItem]) -> Result<()> {
    render_mode(
        session.output,
        &items,
        |items, w| {
            for item in *items {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}",
                    item.id,
                    item.cost,
                    if item.is_available { "available" } else { "hidden" },
                    item.name
                )?;
            }
            Ok(())
        },
        |items, w| {
            pretty_section(w, "Rewards")?;
            if items.is_empty() {
                return writeln!(w, "No rewards available.");
            }
            for item in *items {
                let hidden = if item.is_available { "" } else { "  (hidden)" };
                writeln!(w, "#{:<4} {:>6} pts  {}{hidden}", item.id, item.cost, item.name)?;
                if let Some(description) = &item.description {
                    writeln!(w, "       {description}")?;
                }
                if !item.collection_info.is_empty() {
                    writeln!(w, "       pick up: {}", item.collection_info)?;
                }
            }
            Ok(())
        },
    )
}

fn render_item(session: &Session<'_>, heading: &str, item: &RewardItem) -> Result<()> {
    render_mode(
        session.output,
        item,
        |item, w| {
            writeln!(
                w,
                "{}\t{}\t{}\t{}",
                item.id, item.cost, item.is_available, item.name
            )
        },
        |item, w| {
            writeln!(w, "{heading}")?;
            pretty_kv(w, "Id", format!("#{}", item.id))?;
            pretty_kv(w, "Name", &item.name)?;
            pretty_kv(w, "Cost", format!("{} pts", item.cost))?;
            pretty_kv(w, "Available", if item.is_available { "yes" } else { "no" })
        },
    )
}
