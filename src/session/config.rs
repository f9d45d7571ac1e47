//! Settings for the idle session guard.

use serde::{Deserialize, Deserializer};
use time::Duration;

use crate::Error;

/// The default idle timeout after which a user is logged out.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::minutes(5);
/// The default interval between checks of the shared activity timestamp.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::seconds(1);

/// How long a session may be idle and how often that is checked.
///
/// Deserializes from milliseconds, e.g. `{"timeout_ms": 300000}`, with the
/// same validation as [GuardConfig::new].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardConfig {
    timeout: Duration,
    poll_interval: Duration,
}

impl GuardConfig {
    /// Create a config with an idle timeout of `timeout_ms` milliseconds and
    /// the default poll interval.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidTimeout] if `timeout_ms` is zero or negative.
    pub fn new(timeout_ms: i64) -> Result<Self, Error> {
        Self::default().with_timeout_ms(timeout_ms)
    }

    /// Replace the idle timeout with `timeout_ms` milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidTimeout] if `timeout_ms` is zero or negative.
    pub fn with_timeout_ms(self, timeout_ms: i64) -> Result<Self, Error> {
        if timeout_ms <= 0 {
            return Err(Error::InvalidTimeout(timeout_ms));
        }

        Ok(Self {
            timeout: Duration::milliseconds(timeout_ms),
            ..self
        })
    }

    /// Replace the poll interval with `interval_ms` milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidPollInterval] if `interval_ms` is zero or negative.
    pub fn with_poll_interval_ms(self, interval_ms: i64) -> Result<Self, Error> {
        if interval_ms <= 0 {
            return Err(Error::InvalidPollInterval(interval_ms));
        }

        Ok(Self {
            poll_interval: Duration::milliseconds(interval_ms),
            ..self
        })
    }

    /// How long a session may go without activity.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// How often the shared activity timestamp is checked.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_IDLE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Deserialize)]
struct RawGuardConfig {
    timeout_ms: Option<i64>,
    poll_interval_ms: Option<i64>,
}

impl<'de> Deserialize<'de> for GuardConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawGuardConfig::deserialize(deserializer)?;
        let mut config = GuardConfig::default();

        if let Some(timeout_ms) = raw.timeout_ms {
            config = config
                .with_timeout_ms(timeout_ms)
                .map_err(serde::de::Error::custom)?;
        }

        if let Some(interval_ms) = raw.poll_interval_ms {
            config = config
                .with_poll_interval_ms(interval_ms)
                .map_err(serde::de::Error::custom)?;
        }

        Ok(config)
    }
}
