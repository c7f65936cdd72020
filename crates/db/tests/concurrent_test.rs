//! Concurrent transfer tests against Postgres.
//!
//! Many transfers out of one account must serialise on the conditional debit:
//! the final balances are exact and the source never goes negative.

mod common;

use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Barrier;
use transfer_core::ledger::{LedgerError, Transfer};

use common::{entry_sum, ledger, open_account};

const NUM_TRANSFERS: usize = 99;
const OVERDRAW_ATTEMPTS: usize = 30;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_transfers_exact_balance() {
    let Some(ledger) = ledger().await else {
        return;
    };
    let ledger = Arc::new(ledger);

    let source = open_account(&ledger, dec!(10000)).await;
    let destination = open_account(&ledger, Decimal::ZERO).await;

    let amount = dec!(10.12345);
    let barrier = Arc::new(Barrier::new(NUM_TRANSFERS));

    let handles: Vec<_> = (0..NUM_TRANSFERS)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                ledger
                    .create_transfer(Transfer {
                        source_account_id: source,
                        destination_account_id: destination,
                        amount,
                    })
                    .await
            })
        })
        .collect();

    for result in join_all(handles).await {
        result.expect("Task panicked").expect("Transfer failed");
    }

    let moved = amount * Decimal::from(NUM_TRANSFERS);
    assert_eq!(
        ledger.get_balance(source).await.unwrap().balance,
        dec!(10000) - moved
    );
    assert_eq!(ledger.get_balance(destination).await.unwrap().balance, moved);
    assert_eq!(entry_sum(&ledger, source).await, dec!(10000) - moved);
    assert_eq!(entry_sum(&ledger, destination).await, moved);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_overdraw_is_rejected() {
    let Some(ledger) = ledger().await else {
        return;
    };
    let ledger = Arc::new(ledger);

    let source = open_account(&ledger, dec!(100)).await;
    let destination = open_account(&ledger, Decimal::ZERO).await;

    let barrier = Arc::new(Barrier::new(OVERDRAW_ATTEMPTS));

    let handles: Vec<_> = (0..OVERDRAW_ATTEMPTS)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                ledger
                    .create_transfer(Transfer {
                        source_account_id: source,
                        destination_account_id: destination,
                        amount: dec!(10),
                    })
                    .await
            })
        })
        .collect();

    let mut succeeded = 0;
    for result in join_all(handles).await {
        match result.expect("Task panicked") {
            Ok(()) => succeeded += 1,
            Err(LedgerError::InsufficientFunds(_)) => {}
            Err(e) => panic!("Unexpected error: {e}"),
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(
        ledger.get_balance(source).await.unwrap().balance,
        Decimal::ZERO
    );
    assert_eq!(
        ledger.get_balance(destination).await.unwrap().balance,
        dec!(100)
    );
}
