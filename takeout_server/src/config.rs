use std::env;

use chrono::Duration;
use log::*;

const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_PAYMENT_TIMEOUT: Duration = Duration::minutes(15);
const DEFAULT_MOCK_GATEWAY_DELAY_MS: u64 = 3000;

/// Runtime knobs, read from the environment with logged fallbacks. A malformed value never
/// aborts startup; the default is used instead.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    /// How often the timeout sweep runs.
    pub sweep_interval_secs: u64,
    /// How long an order may sit in PendingPayment before the sweep cancels it.
    pub payment_timeout: Duration,
    /// The artificial delay before the mock payment gateway confirms a payment.
    pub mock_gateway_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: String::default(),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            payment_timeout: DEFAULT_PAYMENT_TIMEOUT,
            mock_gateway_delay_ms: DEFAULT_MOCK_GATEWAY_DELAY_MS,
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = takeout_engine::db::db_url();
        let sweep_interval_secs = env_u64("TKO_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS);
        let payment_timeout_mins =
            env_u64("TKO_PAYMENT_TIMEOUT_MINS", DEFAULT_PAYMENT_TIMEOUT.num_minutes() as u64);
        let mock_gateway_delay_ms = env_u64("TKO_MOCK_GATEWAY_DELAY_MS", DEFAULT_MOCK_GATEWAY_DELAY_MS);
        Self {
            database_url,
            sweep_interval_secs,
            payment_timeout: Duration::minutes(payment_timeout_mins as i64),
            mock_gateway_delay_ms,
        }
    }
}

fn env_u64(var: &str, default: u64) -> u64 {
    match env::var(var) {
        Ok(s) => s.parse::<u64>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {var}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}
