use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

/// Default managed site coordinates.
///
/// The API key is never read from the TOML file; it comes from the
/// environment only (see `sources::load_secrets`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SiteConfig {
    pub base_url: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// Timing knobs for the Remote Manager client and update orchestrator.
///
/// The settle and verify delays are empirical constants tuned to typical
/// WordPress hosting latency; deployments facing slower hosts can raise them
/// without code changes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Minimum spacing between outgoing requests from one client instance.
    #[serde(default = "default_rate_limit_interval_ms")]
    pub rate_limit_interval_ms: u64,
    /// Connect timeout for the underlying HTTP client.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Per-request timeout for read-style calls (status, lists).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Per-request timeout for the perform-updates call.
    #[serde(default = "default_update_timeout_secs")]
    pub update_timeout_secs: u64,
    /// Pause after an apparently successful update before re-listing.
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,
    /// Pause before the timeout-recovery verification re-poll.
    #[serde(default = "default_verify_delay_secs")]
    pub verify_delay_secs: u64,
    /// Whole-attempt duration beyond which a failure is treated as a timeout
    /// even when no timeout error surfaced.
    #[serde(default = "default_stall_threshold_secs")]
    pub stall_threshold_secs: u64,
}

impl ClientConfig {
    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn update_timeout(&self) -> Duration {
        Duration::from_secs(self.update_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn verify_delay(&self) -> Duration {
        Duration::from_secs(self.verify_delay_secs)
    }

    pub fn stall_threshold(&self) -> Duration {
        Duration::from_secs(self.stall_threshold_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rate_limit_interval_ms: default_rate_limit_interval_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            update_timeout_secs: default_update_timeout_secs(),
            settle_delay_secs: default_settle_delay_secs(),
            verify_delay_secs: default_verify_delay_secs(),
            stall_threshold_secs: default_stall_threshold_secs(),
        }
    }
}

fn default_rate_limit_interval_ms() -> u64 {
    1000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_update_timeout_secs() -> u64 {
    30
}

fn default_settle_delay_secs() -> u64 {
    3
}

fn default_verify_delay_secs() -> u64 {
    5
}

fn default_stall_threshold_secs() -> u64 {
    240
}
