use crate::error::{ProspectorError, Result};
use std::env;
use std::time::Duration;

const DEFAULT_WS_URL: &str = "wss://bsc.drpc.org";
const DEFAULT_RPC_URL: &str = "https://bsc.drpc.org";
const DEFAULT_BLOCK_QUEUE_SIZE: usize = 1000;
const DEFAULT_SQLITE_PATH: &str = "pools.db";
const DEFAULT_ARB_RELOAD_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_ARB_MAX_HOPS: usize = 5;
const DEFAULT_ARB_INITIAL_CAPITAL: f64 = 1.0;
const DEFAULT_ARB_MIN_PROFIT: f64 = 0.0;
const DEFAULT_ARB_QUEUE_SIZE: usize = 256;
const DEFAULT_DISCOVERY_CONCURRENCY: usize = 64;
const DEFAULT_STATIC_FEE_PERCENT: f64 = 0.30;
const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

/// Runtime configuration loaded from environment variables.
///
/// Every variable has a default; a variable that is set but fails
/// validation aborts startup with an error naming it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// WebSocket endpoint for the newHeads subscription
    pub ws_url: String,
    /// HTTP endpoint for block, receipt and view-call traffic
    pub rpc_url: String,
    /// Capacity of the in-memory block queue
    pub block_queue_size: usize,
    /// Path of the SQLite pool catalogue
    pub sqlite_path: String,
    /// Interval between graph rebuilds in the arbitrage finder
    pub arb_reload_interval: Duration,
    /// Maximum number of hops in an arbitrage cycle
    pub arb_max_hops: usize,
    /// Simulated starting capital, USD-equivalent of the start token
    pub arb_initial_capital: f64,
    /// Minimum simulated profit before an opportunity is published
    pub arb_min_profit: f64,
    /// Capacity of the opportunity queue
    pub arb_queue_size: usize,
    /// Concurrent receipt fetches per block worker
    pub discovery_concurrency: usize,
    /// Static fee percentage applied to V1-style exchanges
    pub v1_static_fee: f64,
    /// Static fee percentage applied to V2-style pairs
    pub v2_static_fee: f64,
    /// Bind address of the liveness HTTP server
    pub http_addr: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            ws_url: string_var("WS_URL", DEFAULT_WS_URL),
            rpc_url: string_var("RPC_URL", DEFAULT_RPC_URL),
            block_queue_size: parse_var(
                "BLOCK_QUEUE_SIZE",
                DEFAULT_BLOCK_QUEUE_SIZE,
                parse_positive_usize,
            )?,
            sqlite_path: string_var("SQLITE_PATH", DEFAULT_SQLITE_PATH),
            arb_reload_interval: parse_var(
                "ARB_RELOAD_INTERVAL",
                DEFAULT_ARB_RELOAD_INTERVAL,
                parse_duration,
            )?,
            arb_max_hops: parse_var("ARB_MAX_HOPS", DEFAULT_ARB_MAX_HOPS, parse_hops)?,
            arb_initial_capital: parse_var(
                "ARB_INITIAL_CAPITAL",
                DEFAULT_ARB_INITIAL_CAPITAL,
                parse_positive_f64,
            )?,
            arb_min_profit: parse_var(
                "ARB_MIN_PROFIT",
                DEFAULT_ARB_MIN_PROFIT,
                parse_non_negative_f64,
            )?,
            arb_queue_size: parse_var(
                "ARB_QUEUE_SIZE",
                DEFAULT_ARB_QUEUE_SIZE,
                parse_positive_usize,
            )?,
            discovery_concurrency: parse_var(
                "DISCOVERY_CONCURRENCY",
                DEFAULT_DISCOVERY_CONCURRENCY,
                parse_positive_usize,
            )?,
            v1_static_fee: parse_var(
                "V1_STATIC_FEE",
                DEFAULT_STATIC_FEE_PERCENT,
                parse_fee_percent,
            )?,
            v2_static_fee: parse_var(
                "V2_STATIC_FEE",
                DEFAULT_STATIC_FEE_PERCENT,
                parse_fee_percent,
            )?,
            http_addr: string_var("HTTP_ADDR", DEFAULT_HTTP_ADDR),
        })
    }
}

fn string_var(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => sanitize(value),
        _ => default.to_string(),
    }
}

/// Strip whitespace and surrounding quotes that tend to leak in from .env files.
fn sanitize(value: String) -> String {
    let trimmed = value.trim();
    let unquoted = if (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
        || (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2)
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    unquoted.to_string()
}

fn parse_var<T>(name: &str, default: T, parse: impl Fn(&str) -> Option<T>) -> Result<T> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            let value = raw.trim();
            parse(value).ok_or_else(|| ProspectorError::InvalidEnvVar {
                name: name.to_string(),
                value: value.to_string(),
            })
        }
        _ => Ok(default),
    }
}

fn parse_positive_usize(value: &str) -> Option<usize> {
    value.parse::<usize>().ok().filter(|v| *v > 0)
}

fn parse_hops(value: &str) -> Option<usize> {
    value.parse::<usize>().ok().filter(|v| *v >= 2)
}

fn parse_positive_f64(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

fn parse_non_negative_f64(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Fee percentages above 100% are configuration mistakes, not markets.
fn parse_fee_percent(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0 && *v <= 100.0)
}

/// Parse a duration string such as "500ms", "60s", "5m" or "1h".
/// A bare integer is taken as seconds. Zero durations are rejected.
fn parse_duration(value: &str) -> Option<Duration> {
    let (number, unit) = match value.find(|c: char| c.is_ascii_alphabetic()) {
        Some(pos) => value.split_at(pos),
        None => (value, "s"),
    };

    let amount = number.parse::<u64>().ok()?;
    let duration = match unit {
        "ms" => Duration::from_millis(amount),
        "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount.checked_mul(60)?),
        "h" => Duration::from_secs(amount.checked_mul(3600)?),
        _ => return None,
    };

    (duration > Duration::ZERO).then_some(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_accepts_common_suffixes() {
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("60s"), Some(Duration::from_secs(60)));
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("2h"), Some(Duration::from_secs(7200)));
        assert_eq!(parse_duration("30"), Some(Duration::from_secs(30)));
    }

    #[test]
    fn duration_rejects_garbage_and_zero() {
        assert_eq!(parse_duration("0s"), None);
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration("-5s"), None);
        assert_eq!(parse_duration("5w"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn numeric_validators_enforce_bounds() {
        assert_eq!(parse_positive_usize("1000"), Some(1000));
        assert_eq!(parse_positive_usize("0"), None);
        assert_eq!(parse_positive_usize("-1"), None);

        assert_eq!(parse_hops("2"), Some(2));
        assert_eq!(parse_hops("1"), None);

        assert_eq!(parse_positive_f64("1.5"), Some(1.5));
        assert_eq!(parse_positive_f64("0"), None);

        assert_eq!(parse_non_negative_f64("0"), Some(0.0));
        assert_eq!(parse_non_negative_f64("-0.1"), None);

        assert_eq!(parse_fee_percent("0.30"), Some(0.30));
        assert_eq!(parse_fee_percent("101"), None);
    }

    #[test]
    fn invalid_value_error_names_the_variable() {
        let err = parse_positive_usize("zero")
            .ok_or_else(|| ProspectorError::InvalidEnvVar {
                name: "BLOCK_QUEUE_SIZE".to_string(),
                value: "zero".to_string(),
            })
            .unwrap_err();
        assert!(err.to_string().contains("BLOCK_QUEUE_SIZE"));
    }

    #[test]
    fn sanitize_strips_quotes() {
        assert_eq!(sanitize("\"wss://node\"".to_string()), "wss://node");
        assert_eq!(sanitize(" 'pools.db' ".to_string()), "pools.db");
        assert_eq!(sanitize("plain".to_string()), "plain");
    }
}
