//! `eco redeem`: spend points on a reward or redeem the whole balance.

use anyhow::Result;
use clap::Args;
use ecopoints_core::model::REDEEM_ALL;
use ecopoints_core::{RedeemRequest, Redeemer};

use super::Session;
use crate::output::{pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct RedeemArgs {
    /// Reward id to redeem.
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub reward_id: Option<i64>,

    /// Redeem the entire current balance.
    #[arg(long)]
    pub all: bool,

    /// Refuse if the ledger no longer holds this many entries (the `entries`
    /// value shown by `eco balance`).
    #[arg(long, value_name = "N")]
    pub expect_entries: Option<u64>,
}

impl RedeemArgs {
    fn request(&self) -> RedeemRequest {
        let reward_id = if self.all {
            REDEEM_ALL
        } else {
            self.reward_id.unwrap_or(REDEEM_ALL)
        };
        let request = RedeemRequest::reward(reward_id);
        match self.expect_entries {
            Some(count) => request.expecting(count),
            None => request,
        }
    }
}

/// Execute `eco redeem`. The balance shown afterwards is re-derived from
/// the ledger inside the same transaction as the debit.
///
/// # Errors
///
/// Returns an error when the redemption is refused or the store fails.
pub fn run_redeem(args: &RedeemArgs, session: &Session<'_>) -> Result<()> {
    let conn = session.open_ledger()?;
    let user = session.require_user(&conn)?;

    let redemption = Redeemer::new(&conn)
        .with_notifications(session.config.project.notifications.enabled)
        .redeem_with(user.id, args.request())
        .map_err(|e| session.fail(&e))?;

    render_mode(
        session.output,
        &redemption,
        |r, w| {
            writeln!(
                w,
                "{}\t{}\t{}\tbalance={}",
                r.entry.id,
                r.reward.as_ref().map_or(REDEEM_ALL, |item| item.id),
                r.entry.amount,
                r.balance_after
            )
        },
        |r, w| {
            match &r.reward {
                Some(item) => {
                    writeln!(w, "Redeemed {} for {} points", item.name, r.entry.amount)?;
                    if !item.collection_info.is_empty() {
                        pretty_kv(w, "Pick up", &item.collection_info)?;
                    }
                }
                None => writeln!(w, "Redeemed all {} points", r.entry.amount)?,
            }
            pretty_kv(w, "Balance", r.balance_after.to_string())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use ecopoints_core::model::RedeemTarget;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: RedeemArgs,
    }

    #[test]
    fn reward_id_targets_item() {
        let w = Wrapper::parse_from(["test", "3"]);
        let request = w.args.request();
        assert_eq!(request.target, RedeemTarget::Item(3));
        assert_eq!(request.expected_entries, None);
    }

    #[test]
    fn all_flag_and_zero_id_target_whole_balance() {
        let w = Wrapper::parse_from(["test", "--all", "--expect-entries", "4"]);
        let request = w.args.request();
        assert_eq!(request.target, RedeemTarget::All);
        assert_eq!(request.expected_entries, Some(4));

        let w = Wrapper::parse_from(["test", "0"]);
        assert_eq!(w.args.request().target, RedeemTarget::All);
    }

    #[test]
    fn id_or_all_is_required() {
        assert!(Wrapper::try_parse_from(["test"]).is_err());
        assert!(Wrapper::try_parse_from(["test", "3", "--all"]).is_err());
    }
}
