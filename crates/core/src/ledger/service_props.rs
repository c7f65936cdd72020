//! Property-based tests for AccountLedger.
//!
//! - Opening balances are stored rounded to five digits with one matching entry
//! - Every balance equals the sum of its account's ledger entries
//! - Transfers conserve the total balance and never overdraw

use proptest::prelude::*;
use rust_decimal::Decimal;
use transfer_shared::round_amount;

use super::error::LedgerError;
use super::memory::InMemoryStore;
use super::service::AccountLedger;
use super::types::{AccountId, NewAccount, Transfer};

const ACCOUNTS: AccountId = 4;

/// Strategy to generate non-negative amounts with up to eight fractional digits.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000_000i64).prop_map(|units| Decimal::new(units, 8))
}

/// Strategy to generate a transfer between two of the test accounts.
fn transfer() -> impl Strategy<Value = Transfer> {
    (1..=ACCOUNTS, 1..=ACCOUNTS, amount()).prop_map(|(source, destination, amount)| Transfer {
        source_account_id: source,
        destination_account_id: destination,
        amount,
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Opening balance is stored as round5(b) with exactly one entry of that value.
    #[test]
    fn prop_create_account_stores_rounded_balance(balance in amount()) {
        let ledger = AccountLedger::new(InMemoryStore::new());
        let (account, entries) = runtime().block_on(async {
            let account = ledger
                .create_account(NewAccount { account_id: 1, initial_balance: balance })
                .await
                .unwrap();
            (account, ledger.list_entries(1).await.unwrap())
        });

        prop_assert_eq!(account.balance, round_amount(balance));
        prop_assert_eq!(entries.len(), 1);
        prop_assert_eq!(entries[0].amount, account.balance);
    }

    /// Any sequence of transfers keeps balances non-negative, equal to their
    /// entry sums, and conserves the total.
    #[test]
    fn prop_transfers_preserve_invariants(
        openings in prop::collection::vec(amount(), ACCOUNTS as usize),
        transfers in prop::collection::vec(transfer(), 0..30),
    ) {
        let ledger = AccountLedger::new(InMemoryStore::new());
        let (balances, sums) = runtime().block_on(async {
            for (account_id, opening) in (1..).zip(&openings) {
                ledger
                    .create_account(NewAccount { account_id, initial_balance: *opening })
                    .await
                    .unwrap();
            }

            for request in &transfers {
                match ledger.create_transfer(*request).await {
                    Ok(())
                    | Err(LedgerError::SameAccount | LedgerError::InsufficientFunds(_)) => {}
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            }

            let mut balances = Vec::new();
            let mut sums = Vec::new();
            for account_id in 1..=ACCOUNTS {
                balances.push(ledger.get_balance(account_id).await.unwrap().balance);
                sums.push(
                    ledger
                        .list_entries(account_id)
                        .await
                        .unwrap()
                        .iter()
                        .map(|entry| entry.amount)
                        .sum::<Decimal>(),
                );
            }
            (balances, sums)
        });

        let opening_total: Decimal = openings.iter().copied().map(round_amount).sum();
        let closing_total: Decimal = balances.iter().sum();
        prop_assert_eq!(opening_total, closing_total);

        for (balance, sum) in balances.iter().zip(&sums) {
            prop_assert!(*balance >= Decimal::ZERO);
            prop_assert_eq!(balance, sum);
        }
    }

    /// A transfer larger than the source balance changes nothing.
    #[test]
    fn prop_overdraw_is_rejected(opening in amount(), excess in 1i64..1_000_000i64) {
        let ledger = AccountLedger::new(InMemoryStore::new());
        let opening = round_amount(opening);
        let request = Transfer {
            source_account_id: 1,
            destination_account_id: 2,
            amount: opening + Decimal::new(excess, 5),
        };

        let (result, source, destination) = runtime().block_on(async {
            ledger
                .create_account(NewAccount { account_id: 1, initial_balance: opening })
                .await
                .unwrap();
            ledger
                .create_account(NewAccount { account_id: 2, initial_balance: Decimal::ZERO })
                .await
                .unwrap();
            let result = ledger.create_transfer(request).await;
            (
                result,
                ledger.get_balance(1).await.unwrap().balance,
                ledger.get_balance(2).await.unwrap().balance,
            )
        });

        prop_assert!(matches!(result, Err(LedgerError::InsufficientFunds(1))));
        prop_assert_eq!(source, opening);
        prop_assert_eq!(destination, Decimal::ZERO);
    }
}
