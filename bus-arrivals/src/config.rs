//! Client configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::api::BusApiConfig;
use crate::domain::{Coordinate, InvalidCoordinate};
use crate::polling::DEFAULT_POLL_INTERVAL;

pub const ENV_BASE_URL: &str = "BUS_API_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "BUS_API_TIMEOUT_SECS";
pub const ENV_POLL_INTERVAL_SECS: &str = "BUS_POLL_INTERVAL_SECS";
pub const ENV_OBSERVER_LAT: &str = "BUS_OBSERVER_LAT";
pub const ENV_OBSERVER_LNG: &str = "BUS_OBSERVER_LNG";
pub const ENV_MOCK_DIR: &str = "BUS_MOCK_DIR";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a positive whole number of seconds, got {value:?}")]
    Seconds { var: &'static str, value: String },

    #[error("BUS_OBSERVER_LAT and BUS_OBSERVER_LNG must be set together")]
    PartialObserver,

    #[error("invalid observer position: {0}")]
    Observer(#[from] InvalidCoordinate),
}

/// Everything the client needs to start.
///
/// The arrival fetch timeout is kept below `poll_interval`. The poller only
/// applies the most recently issued tick, so a fetch allowed to outlive the
/// interval would never land.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend connection
    pub api: BusApiConfig,
    /// Arrival board refresh interval
    pub poll_interval: Duration,
    /// Fixed observer position for ranking, if known
    pub observer: Option<Coordinate>,
    /// Serve canned data from this directory instead of the backend
    pub mock_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: BusApiConfig::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            observer: None,
            mock_dir: None,
        }
    }
}

impl ClientConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`. Unset and blank values fall back
    /// to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let mut config = Self::default();

        if let Some(url) = get(ENV_BASE_URL) {
            config.api = BusApiConfig::new(url.trim());
        }
        if let Some(value) = get(ENV_TIMEOUT_SECS) {
            config.api = config.api.with_timeout(seconds(ENV_TIMEOUT_SECS, &value)?);
        }
        if let Some(value) = get(ENV_POLL_INTERVAL_SECS) {
            config.poll_interval = Duration::from_secs(seconds(ENV_POLL_INTERVAL_SECS, &value)?);
        }

        config.api.arrival_timeout = arrival_timeout_within(&config.api, config.poll_interval);

        config.observer = match (get(ENV_OBSERVER_LAT), get(ENV_OBSERVER_LNG)) {
            (Some(lat), Some(lng)) => Some(Coordinate::parse(&lat, &lng)?),
            (None, None) => None,
            _ => return Err(ConfigError::PartialObserver),
        };

        config.mock_dir = get(ENV_MOCK_DIR).map(PathBuf::from);
        Ok(config)
    }
}

/// An arrival fetch may take at most four fifths of the poll interval.
fn arrival_timeout_within(api: &BusApiConfig, poll_interval: Duration) -> Duration {
    api.arrival_timeout.min(poll_interval * 4 / 5)
}

fn seconds(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::Seconds {
            var,
            value: value.to_string(),
        }),
    }
}
