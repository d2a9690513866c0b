//! Hydration settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Longest accepted upcoming window, a century.
pub const MAX_UPCOMING_WINDOW_DAYS: u32 = 36_500;

/// Window and cap used when hydrating upcoming events and due checks.
///
/// Every field has a default, so `{}` is a valid document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrationConfig {
    /// Forward lookahead for upcoming events, from the evaluation instant
    pub upcoming_window_days: u32,
    /// Upcoming events kept per patient
    pub upcoming_limit: u32,
    /// Symmetric due window around "now"
    pub due_tolerance_minutes: u32,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            upcoming_window_days: 7,
            upcoming_limit: 5,
            due_tolerance_minutes: 5,
        }
    }
}

impl HydrationConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.upcoming_window_days == 0 {
            return Err(ConfigError::Invalid(
                "upcoming_window_days must be positive".into(),
            ));
        }
        if self.upcoming_window_days > MAX_UPCOMING_WINDOW_DAYS {
            return Err(ConfigError::Invalid(format!(
                "upcoming_window_days must be at most {}",
                MAX_UPCOMING_WINDOW_DAYS
            )));
        }
        Ok(())
    }

    pub fn upcoming_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.upcoming_window_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HydrationConfig::default();
        assert_eq!(config.upcoming_window_days, 7);
        assert_eq!(config.upcoming_limit, 5);
        assert_eq!(config.due_tolerance_minutes, 5);
        assert_eq!(config.upcoming_window(), chrono::Duration::days(7));
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = HydrationConfig::from_json(r#"{"upcoming_limit": 10}"#).unwrap();
        assert_eq!(config.upcoming_limit, 10);
        assert_eq!(config.upcoming_window_days, 7);
        assert_eq!(HydrationConfig::from_json("{}").unwrap(), HydrationConfig::default());
    }

    #[test]
    fn test_zero_window_rejected() {
        let err = HydrationConfig::from_json(r#"{"upcoming_window_days": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_window_capped() {
        let err = HydrationConfig::from_json(r#"{"upcoming_window_days": 4000000}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config = HydrationConfig::from_json(r#"{"upcoming_window_days": 36500}"#).unwrap();
        assert_eq!(config.upcoming_window_days, MAX_UPCOMING_WINDOW_DAYS);
    }

    #[test]
    fn test_malformed_rejected() {
        let err = HydrationConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }
}
