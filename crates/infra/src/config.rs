//! Controller configuration.

use std::time::Duration;

use tracing::warn;

pub const ENV_MAILBOX_CAPACITY: &str = "APPFOLD_MAILBOX_CAPACITY";
pub const ENV_COMMAND_TIMEOUT_MS: &str = "APPFOLD_COMMAND_TIMEOUT_MS";
pub const ENV_IDLE_TIMEOUT_MS: &str = "APPFOLD_IDLE_TIMEOUT_MS";
pub const ENV_SNAPSHOT_EVERY: &str = "APPFOLD_SNAPSHOT_EVERY";

/// Tuning for aggregate controllers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Bounded mailbox size; senders wait when it is full.
    pub mailbox_capacity: usize,
    /// Upper bound on guard evaluation plus external calls for one command.
    pub command_timeout: Duration,
    /// Stop the controller after this long without messages. `None` keeps it running.
    pub idle_timeout: Option<Duration>,
    /// Write a checkpoint every this many events. 0 disables checkpoints.
    pub snapshot_every: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 32,
            command_timeout: Duration::from_secs(10),
            idle_timeout: None,
            snapshot_every: 100,
        }
    }
}

impl ControllerConfig {
    /// Defaults overridden by `APPFOLD_*` environment variables.
    ///
    /// Absent or unparsable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |key: &str| -> Option<u64> {
            let raw = lookup(key)?;
            match raw.trim().parse::<u64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(key, value = %raw, "ignoring invalid configuration value");
                    None
                }
            }
        };

        Self {
            mailbox_capacity: read(ENV_MAILBOX_CAPACITY)
                .and_then(|v| usize::try_from(v).ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.mailbox_capacity),
            command_timeout: read(ENV_COMMAND_TIMEOUT_MS)
                .map(Duration::from_millis)
                .unwrap_or(defaults.command_timeout),
            idle_timeout: read(ENV_IDLE_TIMEOUT_MS)
                .map(Duration::from_millis)
                .or(defaults.idle_timeout),
            snapshot_every: read(ENV_SNAPSHOT_EVERY).unwrap_or(defaults.snapshot_every),
        }
    }

    /// Whether committing up to `new_version` (from `old_version`) crosses a checkpoint boundary.
    pub fn checkpoint_due(&self, old_version: u64, new_version: u64) -> bool {
        self.snapshot_every > 0 && old_version / self.snapshot_every != new_version / self.snapshot_every
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> ControllerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ControllerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(from_map(&[]), ControllerConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = from_map(&[
            (ENV_MAILBOX_CAPACITY, "8"),
            (ENV_COMMAND_TIMEOUT_MS, "250"),
            (ENV_IDLE_TIMEOUT_MS, "60000"),
            (ENV_SNAPSHOT_EVERY, "0"),
        ]);

        assert_eq!(config.mailbox_capacity, 8);
        assert_eq!(config.command_timeout, Duration::from_millis(250));
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.snapshot_every, 0);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = from_map(&[(ENV_MAILBOX_CAPACITY, "0"), (ENV_COMMAND_TIMEOUT_MS, "soon")]);
        assert_eq!(config.mailbox_capacity, 32);
        assert_eq!(config.command_timeout, Duration::from_secs(10));
    }

    #[test]
    fn checkpoint_boundaries() {
        let config = ControllerConfig {
            snapshot_every: 5,
            ..ControllerConfig::default()
        };
        assert!(!config.checkpoint_due(0, 4));
        assert!(config.checkpoint_due(3, 5));
        assert!(config.checkpoint_due(4, 11));
        assert!(!config.checkpoint_due(5, 9));

        let disabled = ControllerConfig {
            snapshot_every: 0,
            ..ControllerConfig::default()
        };
        assert!(!disabled.checkpoint_due(0, 1_000));
    }
}
