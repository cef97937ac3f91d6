//! Wait settings
//!
//! Poll interval, per-operation deadlines and the transient retry budget used
//! by the lifecycle drivers. Values come from a YAML file and can be
//! overridden through `PROVFLOW_*` environment variables.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const ENV_POLL_INTERVAL_MS: &str = "PROVFLOW_POLL_INTERVAL_MS";
pub const ENV_CREATE_TIMEOUT_SECS: &str = "PROVFLOW_CREATE_TIMEOUT_SECS";
pub const ENV_UPDATE_TIMEOUT_SECS: &str = "PROVFLOW_UPDATE_TIMEOUT_SECS";
pub const ENV_DELETE_TIMEOUT_SECS: &str = "PROVFLOW_DELETE_TIMEOUT_SECS";
pub const ENV_MAX_TRANSIENT_RETRIES: &str = "PROVFLOW_MAX_TRANSIENT_RETRIES";

/// Create/update deadline used when neither the file nor the kind has one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Longest accepted poll interval
pub const MAX_POLL_INTERVAL_MS: u64 = 60 * 60 * 1000;

/// Longest accepted create/update/delete deadline
pub const MAX_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// Settings controlling how long and how often drivers poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitSettings {
    /// Fixed interval between fetches (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Create deadline for every kind without its own override (seconds)
    #[serde(default)]
    pub create_timeout_secs: Option<u64>,

    /// Update deadline for every kind without its own override (seconds)
    #[serde(default)]
    pub update_timeout_secs: Option<u64>,

    /// Delete deadline; unset means poll until cancelled (seconds)
    #[serde(default)]
    pub delete_timeout_secs: Option<u64>,

    /// Consecutive transient fetch errors tolerated before giving up
    #[serde(default = "default_max_transient_retries")]
    pub max_transient_retries: u32,

    /// Per-kind overrides keyed by kind name (e.g. "database_cluster")
    #[serde(default)]
    pub kinds: HashMap<String, KindTimeouts>,
}

/// Deadline overrides for a single resource kind (seconds)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindTimeouts {
    #[serde(default)]
    pub create_timeout_secs: Option<u64>,
    #[serde(default)]
    pub update_timeout_secs: Option<u64>,
    #[serde(default)]
    pub delete_timeout_secs: Option<u64>,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_transient_retries() -> u32 {
    3
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            create_timeout_secs: None,
            update_timeout_secs: None,
            delete_timeout_secs: None,
            max_transient_retries: default_max_transient_retries(),
            kinds: HashMap::new(),
        }
    }
}

impl WaitSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Create deadline for `kind`.
    ///
    /// Resolution order: kind override, global setting, `fallback`
    /// (typically the kind's built-in default), then [`DEFAULT_TIMEOUT`].
    pub fn create_timeout(&self, kind: &str, fallback: Option<Duration>) -> Duration {
        self.kinds
            .get(kind)
            .and_then(|k| k.create_timeout_secs)
            .or(self.create_timeout_secs)
            .map(Duration::from_secs)
            .or(fallback)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Update deadline for `kind`, resolved like [`Self::create_timeout`].
    pub fn update_timeout(&self, kind: &str, fallback: Option<Duration>) -> Duration {
        self.kinds
            .get(kind)
            .and_then(|k| k.update_timeout_secs)
            .or(self.update_timeout_secs)
            .map(Duration::from_secs)
            .or(fallback)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Delete deadline for `kind`. `None` means no deadline.
    pub fn delete_timeout(&self, kind: &str, fallback: Option<Duration>) -> Option<Duration> {
        self.kinds
            .get(kind)
            .and_then(|k| k.delete_timeout_secs)
            .or(self.delete_timeout_secs)
            .map(Duration::from_secs)
            .or(fallback)
    }

    /// Apply `PROVFLOW_*` environment overrides on top of the current values
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = env_u64(ENV_POLL_INTERVAL_MS)? {
            self.poll_interval_ms = v;
        }
        if let Some(v) = env_u64(ENV_CREATE_TIMEOUT_SECS)? {
            self.create_timeout_secs = Some(v);
        }
        if let Some(v) = env_u64(ENV_UPDATE_TIMEOUT_SECS)? {
            self.update_timeout_secs = Some(v);
        }
        if let Some(v) = env_u64(ENV_DELETE_TIMEOUT_SECS)? {
            // 0 clears the delete deadline
            self.delete_timeout_secs = if v == 0 { None } else { Some(v) };
        }
        if let Some(v) = env_u64(ENV_MAX_TRANSIENT_RETRIES)? {
            self.max_transient_retries = u32::try_from(v).map_err(|_| ConfigError::InvalidEnv {
                var: ENV_MAX_TRANSIENT_RETRIES.to_string(),
                value: v.to_string(),
            })?;
        }
        Ok(())
    }

    /// Reject settings the poller cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "poll_interval_ms ({}) exceeds the maximum of {}",
                self.poll_interval_ms, MAX_POLL_INTERVAL_MS
            )));
        }

        let interval_secs = self.poll_interval_ms.div_ceil(1000);
        let mut timeouts: Vec<(String, u64)> = Vec::new();
        for (name, value) in [
            ("create_timeout_secs", self.create_timeout_secs),
            ("update_timeout_secs", self.update_timeout_secs),
            ("delete_timeout_secs", self.delete_timeout_secs),
        ] {
            if let Some(v) = value {
                timeouts.push((name.to_string(), v));
            }
        }
        for (kind, k) in &self.kinds {
            for (name, value) in [
                ("create_timeout_secs", k.create_timeout_secs),
                ("update_timeout_secs", k.update_timeout_secs),
                ("delete_timeout_secs", k.delete_timeout_secs),
            ] {
                if let Some(v) = value {
                    timeouts.push((format!("kinds.{}.{}", kind, name), v));
                }
            }
        }

        for (name, secs) in timeouts {
            if secs == 0 {
                return Err(ConfigError::Invalid(format!("{} must be greater than 0", name)));
            }
            if secs > MAX_TIMEOUT_SECS {
                return Err(ConfigError::Invalid(format!(
                    "{} ({}s) exceeds the maximum of {}s",
                    name, secs, MAX_TIMEOUT_SECS
                )));
            }
            if secs < interval_secs {
                return Err(ConfigError::Invalid(format!(
                    "{} ({}s) is shorter than poll_interval_ms ({}ms)",
                    name, secs, self.poll_interval_ms
                )));
            }
        }

        Ok(())
    }
}

fn env_u64(var: &str) -> Result<Option<u64>> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                var: var.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let settings = WaitSettings::default();
        assert_eq!(settings.poll_interval(), Duration::from_secs(2));
        assert_eq!(settings.max_transient_retries, 3);
        assert_eq!(settings.create_timeout("vpc", None), DEFAULT_TIMEOUT);
        assert_eq!(settings.delete_timeout("vpc", None), None);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_timeout_resolution_order() {
        let mut settings = WaitSettings {
            create_timeout_secs: Some(600),
            ..Default::default()
        };
        settings.kinds.insert(
            "database_cluster".to_string(),
            KindTimeouts {
                create_timeout_secs: Some(1800),
                ..Default::default()
            },
        );

        let fallback = Some(Duration::from_secs(900));
        assert_eq!(
            settings.create_timeout("database_cluster", fallback),
            Duration::from_secs(1800)
        );
        assert_eq!(settings.create_timeout("vpc", fallback), Duration::from_secs(600));
        // update has no global value, so the kind fallback wins
        assert_eq!(settings.update_timeout("vpc", fallback), Duration::from_secs(900));
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
poll_interval_ms: 1000
delete_timeout_secs: 300
kinds:
  nat_gateway:
    create_timeout_secs: 900
"#;
        let settings: WaitSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.poll_interval_ms, 1000);
        assert_eq!(settings.max_transient_retries, 3);
        assert_eq!(
            settings.delete_timeout("subnet", None),
            Some(Duration::from_secs(300))
        );
        assert_eq!(
            settings.create_timeout("nat_gateway", None),
            Duration::from_secs(900)
        );
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let settings = WaitSettings {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_timeout_shorter_than_interval() {
        let mut settings = WaitSettings {
            poll_interval_ms: 5000,
            ..Default::default()
        };
        settings.kinds.insert(
            "volume".to_string(),
            KindTimeouts {
                delete_timeout_secs: Some(2),
                ..Default::default()
            },
        );
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("kinds.volume.delete_timeout_secs"));
    }

    #[test]
    fn test_validate_rejects_unbounded_values() {
        let settings = WaitSettings {
            poll_interval_ms: u64::MAX,
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));

        let settings = WaitSettings {
            create_timeout_secs: Some(u64::MAX),
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("create_timeout_secs"));

        let settings = WaitSettings {
            poll_interval_ms: MAX_POLL_INTERVAL_MS,
            delete_timeout_secs: Some(MAX_TIMEOUT_SECS),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_apply_env() {
        temp_env::with_vars(
            [
                (ENV_POLL_INTERVAL_MS, Some("1500")),
                (ENV_CREATE_TIMEOUT_SECS, Some("120")),
                (ENV_DELETE_TIMEOUT_SECS, Some("0")),
                (ENV_MAX_TRANSIENT_RETRIES, Some("5")),
            ],
            || {
                let mut settings = WaitSettings {
                    delete_timeout_secs: Some(60),
                    ..Default::default()
                };
                settings.apply_env().unwrap();
                assert_eq!(settings.poll_interval_ms, 1500);
                assert_eq!(settings.create_timeout_secs, Some(120));
                assert_eq!(settings.delete_timeout_secs, None);
                assert_eq!(settings.max_transient_retries, 5);
            },
        );
    }

    #[test]
    #[serial]
    fn test_apply_env_invalid_value() {
        temp_env::with_var(ENV_POLL_INTERVAL_MS, Some("soon"), || {
            let mut settings = WaitSettings::default();
            let err = settings.apply_env().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnv { ref var, .. } if var == ENV_POLL_INTERVAL_MS));
        });
    }
}
