//! End-to-end serialization and lifecycle tests
//!
//! These tests validate the complete locked ledger pipeline over the
//! in-memory stores. Each test:
//! 1. Seeds users and accounts
//! 2. Runs balance operations, often from many concurrent tasks
//! 3. Asserts the invariants the system guarantees:
//!    - the balance never goes negative
//!    - attempts on one account are totally ordered
//!    - every attempt leaves exactly one ledger record
//!    - failure records carry the unchanged balance snapshot

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use account_ledger::{
    AccountStore, AccountUser, InMemoryAccountStore, InMemoryTransactionStore, InMemoryUserStore,
    LedgerConfig, LedgerError, LockConfig, LockedLedger, TransactionResult, TransactionStore,
    UserStore,
};

struct Harness {
    ledger: LockedLedger,
    transactions: Arc<InMemoryTransactionStore>,
}

fn harness(config: LedgerConfig) -> Harness {
    let users = Arc::new(InMemoryUserStore::new());
    let accounts = Arc::new(InMemoryAccountStore::new());
    let transactions = Arc::new(InMemoryTransactionStore::new());

    users.save(AccountUser::new(1, "Pobi", Utc::now()));
    users.save(AccountUser::new(2, "Cony", Utc::now()));

    let ledger = LockedLedger::new(
        users as Arc<dyn UserStore>,
        accounts as Arc<dyn AccountStore>,
        transactions.clone() as Arc<dyn TransactionStore>,
        config,
    );
    Harness {
        ledger,
        transactions,
    }
}

fn default_harness() -> Harness {
    harness(LedgerConfig {
        lock: LockConfig {
            wait_timeout: Duration::from_secs(5),
            lease_timeout: Duration::from_secs(15),
        },
        contention_delay: None,
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_uses_on_one_account_are_totally_ordered() {
    let h = default_harness();
    h.ledger.create_account(1, 1_000).unwrap();

    let mut tasks = vec![];
    for _ in 0..10 {
        let ledger = h.ledger.clone();
        tasks.push(tokio::spawn(async move {
            ledger.use_balance(1, "1000000000", 100).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(h.ledger.list_accounts(1).unwrap()[0].balance, 0);

    // Total ordering means each attempt observed a distinct post-debit
    // balance: 900, 800, ..., 0. Any lost update would collapse two
    // snapshots into one.
    let snapshots: HashSet<i64> = h
        .transactions
        .all()
        .iter()
        .map(|record| record.balance_snapshot)
        .collect();
    let expected: HashSet<i64> = (0..10).map(|i| i * 100).collect();
    assert_eq!(snapshots, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overdraw_attempts_fail_cleanly_and_are_all_recorded() {
    let h = default_harness();
    h.ledger.create_account(1, 500).unwrap();

    let mut tasks = vec![];
    for _ in 0..10 {
        let ledger = h.ledger.clone();
        tasks.push(tokio::spawn(async move {
            ledger.use_balance(1, "1000000000", 100).await
        }));
    }

    let mut successes = 0;
    let mut failures = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(LedgerError::AmountExceedBalance { .. }) => failures += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 5);
    assert_eq!(failures, 5);
    assert_eq!(h.ledger.list_accounts(1).unwrap()[0].balance, 0);

    // One record per attempt, and every failed attempt snapshotted the
    // drained balance it actually observed.
    let records = h.transactions.all();
    assert_eq!(records.len(), 10);
    for record in records {
        match record.result {
            TransactionResult::Success => assert!(record.balance_snapshot >= 0),
            TransactionResult::Fail => assert_eq!(record.balance_snapshot, 0),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn balance_never_goes_negative_under_mixed_load() {
    let h = default_harness();
    h.ledger.create_account(1, 300).unwrap();

    let mut tasks = vec![];
    for i in 0..20u32 {
        let ledger = h.ledger.clone();
        tasks.push(tokio::spawn(async move {
            // Vary amounts so some attempts overdraw
            let amount = if i % 3 == 0 { 250 } else { 100 };
            ledger.use_balance(1, "1000000000", amount).await
        }));
    }
    for task in tasks {
        // Success or a clean domain failure, never anything else
        match task.await.unwrap() {
            Ok(_) | Err(LedgerError::AmountExceedBalance { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let balance = h.ledger.list_accounts(1).unwrap()[0].balance;
    assert!(balance >= 0);
    assert_eq!(h.transactions.all().len(), 20);
    for record in h.transactions.all() {
        assert!(record.balance_snapshot >= 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_accounts_do_not_contend() {
    // With the critical section widened beyond the wait bound, two
    // operations would time out if they shared a lock. On different
    // accounts both must succeed.
    let h = harness(LedgerConfig {
        lock: LockConfig {
            wait_timeout: Duration::from_millis(100),
            lease_timeout: Duration::from_secs(15),
        },
        contention_delay: Some(Duration::from_millis(250)),
    });
    h.ledger.create_account(1, 1_000).unwrap();
    h.ledger.create_account(2, 1_000).unwrap();

    let first = {
        let ledger = h.ledger.clone();
        tokio::spawn(async move { ledger.use_balance(1, "1000000000", 100).await })
    };
    let second = {
        let ledger = h.ledger.clone();
        tokio::spawn(async move { ledger.use_balance(2, "1000000001", 100).await })
    };

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn contender_times_out_without_touching_the_ledger() {
    let h = harness(LedgerConfig {
        lock: LockConfig {
            wait_timeout: Duration::from_millis(30),
            lease_timeout: Duration::from_secs(15),
        },
        contention_delay: Some(Duration::from_millis(300)),
    });
    h.ledger.create_account(1, 1_000).unwrap();

    let holder = {
        let ledger = h.ledger.clone();
        tokio::spawn(async move { ledger.use_balance(1, "1000000000", 100).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let contender = h.ledger.use_balance(1, "1000000000", 100).await;
    assert_eq!(
        contender.unwrap_err(),
        LedgerError::lock_timeout("1000000000")
    );

    holder.await.unwrap().unwrap();

    // The timed-out attempt never entered the body: one record, not two.
    assert_eq!(h.transactions.all().len(), 1);
    assert_eq!(h.ledger.list_accounts(1).unwrap()[0].balance, 900);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failure_records_interleave_consistently_with_successes() {
    let h = default_harness();
    h.ledger.create_account(1, 150).unwrap();

    // Two drains race: at most one can succeed, the other must record a
    // FAIL whose snapshot matches a consistent before-or-after state.
    let a = {
        let ledger = h.ledger.clone();
        tokio::spawn(async move { ledger.use_balance(1, "1000000000", 150).await })
    };
    let b = {
        let ledger = h.ledger.clone();
        tokio::spawn(async move { ledger.use_balance(1, "1000000000", 150).await })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let records = h.transactions.all();
    assert_eq!(records.len(), 2);
    let fail = records
        .iter()
        .find(|r| r.result == TransactionResult::Fail)
        .unwrap();
    // The loser saw the post-drain balance, never a partial state
    assert_eq!(fail.balance_snapshot, 0);
}

#[tokio::test]
async fn full_account_lifecycle() {
    let h = default_harness();

    let opened = h.ledger.create_account(1, 10_000).unwrap();
    assert_eq!(opened.account_number, "1000000000");

    let used = h
        .ledger
        .use_balance(1, &opened.account_number, 200)
        .await
        .unwrap();
    assert_eq!(h.ledger.list_accounts(1).unwrap()[0].balance, 9_800);

    let queried = h.ledger.query_transaction(&used.transaction_id).unwrap();
    assert_eq!(queried.amount, 200);

    let cancelled = h
        .ledger
        .cancel_balance(&used.transaction_id, &opened.account_number, 200)
        .await
        .unwrap();
    assert_eq!(cancelled.transaction_result, TransactionResult::Success);
    assert_eq!(h.ledger.list_accounts(1).unwrap()[0].balance, 10_000);

    // Still funded: closing is refused
    assert_eq!(
        h.ledger
            .close_account(1, &opened.account_number)
            .unwrap_err(),
        LedgerError::balance_not_empty(&opened.account_number)
    );

    // Drain, then close for good
    h.ledger
        .use_balance(1, &opened.account_number, 10_000)
        .await
        .unwrap();
    let closed = h.ledger.close_account(1, &opened.account_number).unwrap();
    assert!(closed.unregistered_at.is_some());

    // Terminal: no further balance operations
    assert_eq!(
        h.ledger
            .use_balance(1, &opened.account_number, 1)
            .await
            .unwrap_err(),
        LedgerError::account_already_unregistered(&opened.account_number)
    );
}

#[tokio::test]
async fn partial_cancel_is_rejected_and_recorded() {
    let h = default_harness();
    let opened = h.ledger.create_account(1, 1_000).unwrap();
    let used = h
        .ledger
        .use_balance(1, &opened.account_number, 200)
        .await
        .unwrap();

    let result = h
        .ledger
        .cancel_balance(&used.transaction_id, &opened.account_number, 100)
        .await;

    assert_eq!(
        result.unwrap_err(),
        LedgerError::cancel_must_be_full(&used.transaction_id, 200, 100)
    );
    assert_eq!(h.ledger.list_accounts(1).unwrap()[0].balance, 800);

    // The use plus the failed cancel: two records
    let records = h.transactions.all();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].result, TransactionResult::Fail);
    assert_eq!(records[1].balance_snapshot, 800);
}

#[tokio::test]
async fn sequential_account_numbers_across_users() {
    let h = default_harness();

    let first = h.ledger.create_account(1, 0).unwrap();
    let second = h.ledger.create_account(2, 0).unwrap();
    let third = h.ledger.create_account(1, 0).unwrap();

    assert_eq!(first.account_number, "1000000000");
    assert_eq!(second.account_number, "1000000001");
    assert_eq!(third.account_number, "1000000002");
}
