//! HTTP load generator for the transfer service.
//!
//! Opens a batch of accounts with random balances, then fires transfers of
//! `10` between neighbouring accounts and reports latency per endpoint.
//!
//! Settings come from `LOADTEST_*` environment variables (or `.env`):
//! `LOADTEST_BASE_URL`, `LOADTEST_ACCOUNTS`, `LOADTEST_FIRST_ACCOUNT_ID`,
//! `LOADTEST_TRANSFERS`, `LOADTEST_CONCURRENCY`, `LOADTEST_REQUEST_TIMEOUT_SECS`.
//!
//! Usage: cargo run --bin loadtest

mod report;

use std::time::{Duration, Instant};

use futures::{StreamExt, stream};
use rand::Rng;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use report::{RequestResult, print_report};

const ACCOUNTS_ENDPOINT: &str = "/accounts";
const TRANSACTIONS_ENDPOINT: &str = "/transactions";
const TRANSFER_AMOUNT: &str = "10";

/// Load test settings.
#[derive(Debug, Clone, Deserialize)]
struct LoadTestConfig {
    base_url: String,
    accounts: i64,
    first_account_id: i64,
    transfers: usize,
    concurrency: usize,
    request_timeout_secs: u64,
}

impl LoadTestConfig {
    fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("base_url", "http://localhost:8080")?
            .set_default("accounts", 300)?
            .set_default("first_account_id", 1)?
            .set_default("transfers", 10_000)?
            .set_default("concurrency", 100)?
            .set_default("request_timeout_secs", 10)?
            .add_source(config::Environment::with_prefix("LOADTEST").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = LoadTestConfig::load()?;
    anyhow::ensure!(config.accounts > 0, "LOADTEST_ACCOUNTS must be positive");
    anyhow::ensure!(config.concurrency > 0, "LOADTEST_CONCURRENCY must be positive");

    let client = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;

    println!("Starting load test against {}...", config.base_url);
    let started = Instant::now();

    println!("Creating {} accounts...", config.accounts);
    let account_ids: Vec<i64> =
        (config.first_account_id..config.first_account_id + config.accounts).collect();
    let mut results = create_accounts(&client, &config, &account_ids).await;

    if account_ids.len() > 1 {
        println!("Performing {} transfers...", config.transfers);
        results.extend(perform_transfers(&client, &config, &account_ids).await);
    }

    println!("\nLoad test finished.");
    print_report(&results, started.elapsed());
    Ok(())
}

async fn create_accounts(
    client: &Client,
    config: &LoadTestConfig,
    account_ids: &[i64],
) -> Vec<RequestResult> {
    let url = format!("{}{ACCOUNTS_ENDPOINT}", config.base_url);

    stream::iter(account_ids.iter().copied())
        .map(|account_id| {
            // Up to 10000.00000, carried at five decimal places
            let balance = Decimal::new(rand::rng().random_range(0..1_000_000_000), 5);
            let body = json!({
                "account_id": account_id,
                "initial_balance": balance.to_string(),
            });
            post(client, &url, ACCOUNTS_ENDPOINT, body)
        })
        .buffer_unordered(config.concurrency)
        .collect()
        .await
}

async fn perform_transfers(
    client: &Client,
    config: &LoadTestConfig,
    account_ids: &[i64],
) -> Vec<RequestResult> {
    let url = format!("{}{TRANSACTIONS_ENDPOINT}", config.base_url);

    stream::iter(0..config.transfers)
        .map(|i| {
            let (source, destination) = transfer_pair(account_ids, i);
            let body = json!({
                "source_account_id": source,
                "destination_account_id": destination,
                "amount": TRANSFER_AMOUNT,
            });
            post(client, &url, TRANSACTIONS_ENDPOINT, body)
        })
        .buffer_unordered(config.concurrency)
        .collect()
        .await
}

/// The `i`-th transfer goes from one account to its neighbour.
fn transfer_pair(account_ids: &[i64], i: usize) -> (i64, i64) {
    let len = account_ids.len();
    (account_ids[i % len], account_ids[(i + 1) % len])
}

async fn post(client: &Client, url: &str, endpoint: &'static str, body: Value) -> RequestResult {
    let started = Instant::now();
    let outcome = client.post(url).json(&body).send().await;
    let latency = started.elapsed();

    match outcome {
        Ok(response) => {
            let status = response.status();
            let success = status == StatusCode::CREATED;
            let error = if success {
                None
            } else {
                response.text().await.ok()
            };
            RequestResult {
                endpoint,
                latency,
                status: Some(status.as_u16()),
                success,
                error,
            }
        }
        Err(e) => RequestResult {
            endpoint,
            latency,
            status: None,
            success: false,
            error: Some(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_pair_wraps_around() {
        let ids = [10, 11, 12];
        assert_eq!(transfer_pair(&ids, 0), (10, 11));
        assert_eq!(transfer_pair(&ids, 2), (12, 10));
        assert_eq!(transfer_pair(&ids, 4), (11, 12));
    }

    #[test]
    fn test_config_defaults() {
        let config = LoadTestConfig::load().unwrap();
        assert_eq!(config.concurrency, 100);
        assert_eq!(config.request_timeout_secs, 10);
    }
}
