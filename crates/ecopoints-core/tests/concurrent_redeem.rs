//! Concurrent redemptions from separate connections must not overspend.

use std::sync::{Arc, Barrier};
use std::thread;

use ecopoints_core::db::{DEFAULT_BUSY_TIMEOUT, open_store};
use ecopoints_core::model::{EntryKind, NewReward};
use ecopoints_core::users::sign_in;
use ecopoints_core::{Catalog, Ledger, LedgerError, RedeemRequest, Redeemer};

#[test]
fn only_one_of_two_overlapping_redemptions_succeeds() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("ecopoints.db");

    let (user_id, reward_id) = {
        let conn = open_store(&path, DEFAULT_BUSY_TIMEOUT).expect("open store");
        let user_id = sign_in(&conn, "ada@example.org", "Ada").expect("sign in").id;
        Ledger::new(&conn)
            .credit(user_id, EntryKind::EarnedReport, 100, "report")
            .expect("credit");
        let reward = Catalog::new(&conn)
            .add(&NewReward {
                name: "Compost bin".to_string(),
                cost: 60,
                description: None,
                collection_info: String::new(),
            })
            .expect("add reward");
        (user_id, reward.id)
    };

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_store(&path, DEFAULT_BUSY_TIMEOUT).expect("open store");
                barrier.wait();
                Redeemer::new(&conn).redeem(user_id, reward_id)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread panicked"))
        .collect();

    let successes = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(successes, 1, "exactly one redemption must win: {results:?}");
    assert!(results.iter().any(|result| matches!(
        result,
        Err(LedgerError::InsufficientBalance {
            balance: 40,
            cost: 60
        })
    )));

    let conn = open_store(&path, DEFAULT_BUSY_TIMEOUT).expect("reopen store");
    let ledger = Ledger::new(&conn);
    assert_eq!(ledger.balance_for(user_id).expect("balance"), 40);
    assert_eq!(ledger.entry_count(user_id).expect("count"), 2);
}

#[test]
fn concurrent_redeem_all_debits_balance_once() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("ecopoints.db");

    let user_id = {
        let conn = open_store(&path, DEFAULT_BUSY_TIMEOUT).expect("open store");
        let user_id = sign_in(&conn, "bob@example.org", "Bob").expect("sign in").id;
        Ledger::new(&conn)
            .credit(user_id, EntryKind::EarnedCollection, 70, "Collected 7 kg")
            .expect("credit");
        user_id
    };

    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = open_store(&path, DEFAULT_BUSY_TIMEOUT).expect("open store");
                barrier.wait();
                Redeemer::new(&conn).redeem_with(user_id, RedeemRequest::reward(0))
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread panicked"))
        .collect();

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|result| matches!(result, Err(LedgerError::NothingToRedeem)))
            .count(),
        3
    );

    let conn = open_store(&path, DEFAULT_BUSY_TIMEOUT).expect("reopen store");
    let ledger = Ledger::new(&conn);
    assert_eq!(ledger.balance_for(user_id).expect("balance"), 0);
    let redeemed: u64 = ledger
        .list_for(user_id)
        .expect("list")
        .iter()
        .filter(|entry| entry.kind == EntryKind::Redeemed)
        .map(|entry| entry.amount)
        .sum();
    assert_eq!(redeemed, 70);
}
