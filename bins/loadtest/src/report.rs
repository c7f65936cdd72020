//! Result aggregation and the printed report.
//!
//! All arithmetic is on integers and `Duration`s.

use std::collections::BTreeMap;
use std::time::Duration;

/// Failures printed in detail before the list is cut short.
const MAX_ERROR_DETAILS: usize = 10;

/// Outcome of one HTTP request.
#[derive(Debug, Clone)]
pub struct RequestResult {
    pub endpoint: &'static str,
    pub latency: Duration,
    /// `None` when no response was received.
    pub status: Option<u16>,
    pub success: bool,
    pub error: Option<String>,
}

/// Aggregated figures for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointStats {
    pub endpoint: &'static str,
    pub count: usize,
    pub successes: usize,
    pub statuses: BTreeMap<String, usize>,
    pub min: Duration,
    pub avg: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub max: Duration,
}

/// Groups results by endpoint, in endpoint order.
pub fn summarize(results: &[RequestResult]) -> Vec<EndpointStats> {
    let mut by_endpoint: BTreeMap<&'static str, Vec<&RequestResult>> = BTreeMap::new();
    for result in results {
        by_endpoint.entry(result.endpoint).or_default().push(result);
    }

    by_endpoint
        .into_iter()
        .map(|(endpoint, results)| {
            let mut latencies: Vec<Duration> = results.iter().map(|r| r.latency).collect();
            latencies.sort_unstable();

            let mut statuses = BTreeMap::new();
            for result in &results {
                let key = result
                    .status
                    .map_or_else(|| "error".to_string(), |status| status.to_string());
                *statuses.entry(key).or_insert(0) += 1;
            }

            let count = latencies.len();
            let total: Duration = latencies.iter().sum();
            EndpointStats {
                endpoint,
                count,
                successes: results.iter().filter(|r| r.success).count(),
                statuses,
                min: latencies.first().copied().unwrap_or_default(),
                avg: total / u32::try_from(count.max(1)).unwrap_or(u32::MAX),
                p50: percentile(&latencies, 50),
                p95: percentile(&latencies, 95),
                p99: percentile(&latencies, 99),
                max: latencies.last().copied().unwrap_or_default(),
            }
        })
        .collect()
}

/// Nearest-rank percentile of an ascending slice.
pub fn percentile(sorted: &[Duration], p: usize) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let index = (sorted.len() * p / 100).min(sorted.len() - 1);
    sorted[index]
}

/// `part / whole` as a percentage with two decimals.
pub fn format_ratio(part: usize, whole: usize) -> String {
    if whole == 0 {
        return "n/a".to_string();
    }
    let basis_points = part * 10_000 / whole;
    format!("{}.{:02}%", basis_points / 100, basis_points % 100)
}

/// Requests per second with two decimals.
pub fn format_rate(requests: usize, elapsed: Duration) -> String {
    let millis = elapsed.as_millis().max(1);
    let centi = u128::try_from(requests)
        .unwrap_or(u128::MAX)
        .saturating_mul(100_000)
        / millis;
    format!("{}.{:02}", centi / 100, centi % 100)
}

/// Prints the overall and per-endpoint report to stdout.
pub fn print_report(results: &[RequestResult], elapsed: Duration) {
    let total = results.len();
    let successes = results.iter().filter(|r| r.success).count();

    println!("\n--- Overall Performance ---");
    println!("Total Time Taken: {elapsed:?}");
    println!("Total Requests: {total}");
    println!("Successful Requests: {successes}");
    println!("Failed Requests: {}", total - successes);
    println!("Success Rate: {}", format_ratio(successes, total));
    println!("Requests Per Second (RPS): {}", format_rate(total, elapsed));

    for stats in summarize(results) {
        println!("\n--- Endpoint: {} ---", stats.endpoint);
        println!("Total Requests: {}", stats.count);
        println!("Success Rate: {}", format_ratio(stats.successes, stats.count));
        for (status, count) in &stats.statuses {
            println!("  Status {status}: {count}");
        }
        println!("Average Latency: {:?}", stats.avg);
        println!("Min Latency: {:?}", stats.min);
        println!("Max Latency: {:?}", stats.max);
        println!("P50 Latency: {:?}", stats.p50);
        println!("P95 Latency: {:?}", stats.p95);
        println!("P99 Latency: {:?}", stats.p99);
    }

    let failures: Vec<&RequestResult> = results.iter().filter(|r| !r.success).collect();
    if !failures.is_empty() {
        println!("\n--- Error Details (first {MAX_ERROR_DETAILS}) ---");
        for failure in failures.iter().take(MAX_ERROR_DETAILS) {
            println!(
                "{} status={} error={}",
                failure.endpoint,
                failure
                    .status
                    .map_or_else(|| "-".to_string(), |status| status.to_string()),
                failure.error.as_deref().unwrap_or("-"),
            );
        }
    }
}
