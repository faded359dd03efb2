//! Environment-driven runtime configuration.
//!
//! Every knob has a working default; a malformed override is logged and
//! ignored rather than aborting startup.

use shared_bus::FabricConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const ENV_TRANSPORT_URL: &str = "FABRIC_TRANSPORT_URL";
pub const ENV_REPLAY_PATH: &str = "FABRIC_REPLAY_PATH";
pub const ENV_PUBLISH_TIMEOUT_MS: &str = "FABRIC_PUBLISH_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "FABRIC_LOG_LEVEL";

/// Host process configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Distributed transport endpoint. Absent means local-only mode,
    /// which is a supported mode rather than a degraded one.
    pub transport_url: Option<String>,
    /// Replay log file. Absent means the replay tier is a no-op.
    pub replay_path: Option<PathBuf>,
    pub publish_timeout_ms: u64,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            transport_url: None,
            replay_path: None,
            publish_timeout_ms: shared_bus::DEFAULT_PUBLISH_TIMEOUT_MS,
            log_level: "info".to_owned(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from `FABRIC_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = get(ENV_TRANSPORT_URL) {
            if url.is_empty() {
                warn!("{ENV_TRANSPORT_URL} is empty, staying local-only");
            } else {
                config.transport_url = Some(url);
            }
        }

        if let Some(path) = get(ENV_REPLAY_PATH) {
            if path.is_empty() {
                warn!("{ENV_REPLAY_PATH} is empty, replay log disabled");
            } else {
                config.replay_path = Some(PathBuf::from(path));
            }
        }

        if let Some(raw) = get(ENV_PUBLISH_TIMEOUT_MS) {
            match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => config.publish_timeout_ms = ms,
                _ => warn!(
                    value = %raw,
                    "{ENV_PUBLISH_TIMEOUT_MS} must be a positive integer, using {}",
                    config.publish_timeout_ms
                ),
            }
        }

        if let Some(level) = get(ENV_LOG_LEVEL) {
            if !level.is_empty() {
                config.log_level = level;
            }
        }

        config
    }

    /// Fabric tuning derived from this runtime configuration.
    #[must_use]
    pub fn fabric_config(&self) -> FabricConfig {
        FabricConfig {
            publish_timeout: Duration::from_millis(self.publish_timeout_ms),
            ..FabricConfig::default()
        }
    }
}
