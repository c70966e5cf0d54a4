//! Configuration for map identities and object pools.

use crate::error::{PoolError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Constants that shape the identity key space.
///
/// Changing any of these changes every canonical map key.
pub struct IdentityConfig;

impl IdentityConfig {
    /// Separator between field values in a canonical map key.
    pub const KEY_SEPARATOR: &'static str = "-";
    /// Rendering of an identity field that was not supplied.
    pub const UNSET_TOKEN: &'static str = "None";
    /// Separator between positional values hashed by the positional fallback.
    pub const POSITIONAL_SEPARATOR: &'static str = "-";
}

/// Runtime configuration for an object pool store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct PoolConfig {
    /// Number of entries to pre-allocate in a new store.
    pub initial_capacity: usize,
    /// Builds slower than this are logged at warn level.
    #[serde(with = "duration_millis")]
    pub slow_build_threshold: Duration,
}

impl PoolConfig {
    pub const DEFAULT_INITIAL_CAPACITY: usize = 16;
    pub const DEFAULT_SLOW_BUILD_MS: u64 = 5_000;

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial store capacity.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the slow-build warning threshold.
    pub fn with_slow_build_threshold(mut self, threshold: Duration) -> Self {
        self.slow_build_threshold = threshold;
        self
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PoolConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make every build look slow.
    pub fn validate(&self) -> Result<()> {
        if self.slow_build_threshold.is_zero() {
            return Err(PoolError::Config {
                message: "slow_build_threshold must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_capacity: PoolConfig::DEFAULT_INITIAL_CAPACITY,
            slow_build_threshold: Duration::from_millis(PoolConfig::DEFAULT_SLOW_BUILD_MS),
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn millis_u64(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(super::millis_u64(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_saturate() {
        assert_eq!(millis_u64(Duration::from_millis(1500)), 1500);
        assert_eq!(millis_u64(Duration::MAX), u64::MAX);

        let config = PoolConfig::default().with_slow_build_threshold(Duration::MAX);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["slow_build_threshold"], serde_json::json!(u64::MAX));
    }

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.initial_capacity, 16);
        assert_eq!(config.slow_build_threshold, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = PoolConfig::new()
            .with_initial_capacity(128)
            .with_slow_build_threshold(Duration::from_millis(250));
        assert_eq!(config.initial_capacity, 128);
        assert_eq!(config.slow_build_threshold, Duration::from_millis(250));
    }

    #[test]
    fn test_from_json_partial() {
        let config = PoolConfig::from_json(r#"{"slow_build_threshold": 1500}"#).unwrap();
        assert_eq!(config.initial_capacity, PoolConfig::DEFAULT_INITIAL_CAPACITY);
        assert_eq!(config.slow_build_threshold, Duration::from_millis(1500));
    }

    #[test]
    fn test_from_json_rejects_zero_threshold() {
        let err = PoolConfig::from_json(r#"{"slow_build_threshold": 0}"#).unwrap_err();
        assert!(matches!(err, PoolError::Config { .. }));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(PoolConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = PoolConfig::new().with_initial_capacity(4);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(PoolConfig::from_json(&json).unwrap(), config);
    }
}
