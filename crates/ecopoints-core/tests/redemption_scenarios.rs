//! Redemption scenarios against a real on-disk ledger.

use ecopoints_core::db::{DEFAULT_BUSY_TIMEOUT, open_store};
use ecopoints_core::model::{EntryKind, NewReward, REDEEM_ALL, RewardItem};
use ecopoints_core::users::sign_in;
use ecopoints_core::{Catalog, Ledger, LedgerError, Redeemer};
use rusqlite::Connection;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    conn: Connection,
    user_id: i64,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let conn = open_store(&dir.path().join("ecopoints.db"), DEFAULT_BUSY_TIMEOUT)
        .expect("open store");
    let user_id = sign_in(&conn, "ada@example.org", "Ada").expect("sign in").id;
    Fixture {
        _dir: dir,
        conn,
        user_id,
    }
}

fn add_reward(conn: &Connection, name: &str, cost: i64) -> RewardItem {
    Catalog::new(conn)
        .add(&NewReward {
            name: name.to_string(),
            cost,
            description: Some(format!("A {name}")),
            collection_info: "Front desk".to_string(),
        })
        .expect("add reward")
}

#[test]
fn scenario_earn_earn_redeem_then_spend_everything() {
    let fx = fixture();
    let ledger = Ledger::new(&fx.conn);
    ledger
        .append(fx.user_id, EntryKind::EarnedReport, 50, "Reported dumping")
        .expect("append");
    ledger
        .append(fx.user_id, EntryKind::EarnedCollection, 30, "Collected 6 kg")
        .expect("append");
    ledger
        .append(fx.user_id, EntryKind::Redeemed, 20, "Redeemed Seeds")
        .expect("append");
    assert_eq!(ledger.balance_for(fx.user_id).expect("balance"), 60);

    let voucher = add_reward(&fx.conn, "Voucher", 60);
    let redemption = Redeemer::new(&fx.conn)
        .redeem(fx.user_id, voucher.id)
        .expect("redeem");

    assert_eq!(redemption.balance_after, 0);
    assert_eq!(ledger.balance_for(fx.user_id).expect("balance"), 0);

    let entries = ledger.list_for(fx.user_id).expect("list");
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].kind, EntryKind::Redeemed);
    assert_eq!(entries[0].amount, 60);
}

#[test]
fn scenario_empty_ledger_redeem_all_fails() {
    let fx = fixture();
    let ledger = Ledger::new(&fx.conn);
    assert_eq!(ledger.balance_for(fx.user_id).expect("balance"), 0);

    let err = Redeemer::new(&fx.conn)
        .redeem(fx.user_id, 0)
        .expect_err("nothing to redeem");
    assert!(matches!(err, LedgerError::NothingToRedeem));
    assert_eq!(ledger.entry_count(fx.user_id).expect("count"), 0);
}

#[test]
fn redeeming_within_balance_debits_exactly_the_cost() {
    let fx = fixture();
    let ledger = Ledger::new(&fx.conn);
    ledger
        .credit(fx.user_id, EntryKind::EarnedReport, 75, "report")
        .expect("credit");
    let mug = add_reward(&fx.conn, "Mug", 30);

    let before_balance = ledger.balance_for(fx.user_id).expect("balance");
    let before_count = ledger.entry_count(fx.user_id).expect("count");

    Redeemer::new(&fx.conn)
        .redeem(fx.user_id, mug.id)
        .expect("redeem");

    assert_eq!(
        ledger.balance_for(fx.user_id).expect("balance"),
        before_balance - 30
    );
    assert_eq!(
        ledger.entry_count(fx.user_id).expect("count"),
        before_count + 1
    );
    let newest = &ledger.list_for(fx.user_id).expect("list")[0];
    assert_eq!(newest.kind, EntryKind::Redeemed);
    assert_eq!(newest.amount, 30);
}

#[test]
fn redeem_all_records_whole_balance() {
    let fx = fixture();
    let ledger = Ledger::new(&fx.conn);
    ledger
        .credit(fx.user_id, EntryKind::EarnedCollection, 42, "Collected 2 kg")
        .expect("credit");
    ledger
        .credit(fx.user_id, EntryKind::EarnedReport, 8, "report")
        .expect("credit");

    let redemption = Redeemer::new(&fx.conn)
        .redeem(fx.user_id, 0)
        .expect("redeem all");
    assert_eq!(redemption.entry.amount, 50);
    assert_eq!(redemption.entry.description, "Redeemed all points");
    assert_eq!(ledger.balance_for(fx.user_id).expect("balance"), 0);
    assert_eq!(ledger.entry_count(fx.user_id).expect("count"), 3);
}

#[test]
fn insufficient_balance_appends_nothing() {
    let fx = fixture();
    let ledger = Ledger::new(&fx.conn);
    ledger
        .credit(fx.user_id, EntryKind::EarnedReport, 10, "report")
        .expect("credit");
    let bike = add_reward(&fx.conn, "Bike", 500);

    let err = Redeemer::new(&fx.conn)
        .redeem(fx.user_id, bike.id)
        .expect_err("too expensive");
    assert!(matches!(
        err,
        LedgerError::InsufficientBalance {
            balance: 10,
            cost: 500
        }
    ));
    assert_eq!(ledger.entry_count(fx.user_id).expect("count"), 1);
    assert_eq!(ledger.balance_for(fx.user_id).expect("balance"), 10);
}

#[test]
fn unknown_reward_is_not_found() {
    let fx = fixture();
    Ledger::new(&fx.conn)
        .credit(fx.user_id, EntryKind::EarnedReport, 10, "report")
        .expect("credit");

    let err = Redeemer::new(&fx.conn)
        .redeem(fx.user_id, 9_999)
        .expect_err("unknown reward");
    assert!(matches!(err, LedgerError::RewardNotFound { reward_id: 9_999 }));
    assert_eq!(
        Ledger::new(&fx.conn).entry_count(fx.user_id).expect("count"),
        1
    );
}

#[test]
fn ledger_survives_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("ecopoints.db");
    let user_id = {
        let conn = open_store(&path, DEFAULT_BUSY_TIMEOUT).expect("open store");
        let user_id = sign_in(&conn, "ada@example.org", "Ada").expect("sign in").id;
        Ledger::new(&conn)
            .credit(user_id, EntryKind::EarnedReport, 12, "report")
            .expect("credit");
        user_id
    };

    let conn = open_store(&path, DEFAULT_BUSY_TIMEOUT).expect("reopen store");
    assert_eq!(Ledger::new(&conn).balance_for(user_id).expect("balance"), 12);
}

#[test]
fn redeem_all_of_a_maximal_balance() {
    let fx = fixture();
    let ledger = Ledger::new(&fx.conn);
    ledger
        .credit(fx.user_id, EntryKind::EarnedReport, i64::MAX, "report")
        .expect("credit");
    let err = ledger
        .credit(fx.user_id, EntryKind::EarnedCollection, i64::MAX, "collection")
        .expect_err("second credit overflows the earned total");
    assert!(matches!(err, LedgerError::InvalidAmount { .. }));

    let redemption = Redeemer::new(&fx.conn)
        .redeem(fx.user_id, REDEEM_ALL)
        .expect("redeem all");
    assert_eq!(redemption.entry.amount, i64::MAX.unsigned_abs());
    assert_eq!(redemption.balance_after, 0);
    assert_eq!(ledger.entry_count(fx.user_id).expect("count"), 2);
}
