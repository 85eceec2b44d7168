//! Configuration structures for the extraction engine.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Main configuration for the expiry engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Category prediction configuration.
    pub classifier: ClassifierConfig,

    /// Expiry date search configuration.
    pub expiry: ExpiryConfig,

    /// Optional AI enrichment configuration.
    pub enrichment: EnrichmentConfig,

    /// Fixed "today" for reproducible runs. Uses the local date when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,
}

/// Category predictor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum aggregate keyword weight for a non-`other` category.
    pub min_score: u32,

    /// Texts shorter than this (in characters) are `other` without scoring.
    pub min_text_length: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_score: 10,
            min_text_length: 10,
        }
    }
}

/// Expiry keyword search configuration. Windows are in bytes of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpiryConfig {
    /// A date starting within this distance of its keyword is a near match.
    pub near_window: usize,

    /// Forward scan window for the most specific keywords.
    pub strong_window: usize,

    /// Forward scan window for ordinary keywords.
    pub standard_window: usize,

    /// Forward scan window for short, ambiguous keywords such as "exp".
    pub weak_window: usize,

    /// How far around a date token to look for exclusion keywords.
    pub exclusion_radius: usize,

    /// Dates older than this are not accepted as expiry unless strongly anchored.
    pub stale_after_days: i64,

    /// Dates further ahead than this are treated as OCR noise.
    pub max_future_years: i32,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            near_window: 30,
            strong_window: 200,
            standard_window: 100,
            weak_window: 50,
            exclusion_radius: 40,
            stale_after_days: 365,
            max_future_years: 30,
        }
    }
}

/// Enrichment collaborator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Consult the provider at all.
    pub enabled: bool,

    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,

    /// Retries after a retryable failure.
    pub max_retries: u32,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 8_000,
            max_retries: 1,
        }
    }
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Largest accepted `expiry.stale_after_days` (a century).
pub const MAX_STALE_AFTER_DAYS: i64 = 36_500;

/// Largest accepted `expiry.max_future_years`.
pub const MAX_FUTURE_YEARS: i32 = 200;

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let expiry = &self.expiry;
        if expiry.near_window == 0 {
            return Err(EngineError::Config("expiry.near_window must be positive".into()));
        }
        if expiry.weak_window > expiry.standard_window
            || expiry.standard_window > expiry.strong_window
        {
            return Err(EngineError::Config(
                "expiry windows must satisfy weak <= standard <= strong".into(),
            ));
        }
        if !(0..=MAX_STALE_AFTER_DAYS).contains(&expiry.stale_after_days) {
            return Err(EngineError::Config(format!(
                "expiry.stale_after_days must be between 0 and {}",
                MAX_STALE_AFTER_DAYS
            )));
        }
        if !(1..=MAX_FUTURE_YEARS).contains(&expiry.max_future_years) {
            return Err(EngineError::Config(format!(
                "expiry.max_future_years must be between 1 and {}",
                MAX_FUTURE_YEARS
            )));
        }
        if self.enrichment.enabled && self.enrichment.timeout_ms == 0 {
            return Err(EngineError::Config("enrichment.timeout_ms must be positive".into()));
        }
        Ok(())
    }

    /// The date extraction is evaluated against.
    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"expiry": {"near_window": 20}, "reference_date": "2024-06-01"}"#)
                .unwrap();
        assert_eq!(config.expiry.near_window, 20);
        assert_eq!(config.expiry.strong_window, 200);
        assert_eq!(config.classifier, ClassifierConfig::default());
        assert_eq!(config.today(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = EngineConfig::default();
        config.enrichment.max_retries = 0;
        config.save(&path).unwrap();

        let loaded = EngineConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_windows_rejected() {
        let mut config = EngineConfig::default();
        config.expiry.weak_window = 500;
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_out_of_range_limits_rejected() {
        let mut config = EngineConfig::default();
        config.expiry.stale_after_days = 1_000_000_000;
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));

        let mut config = EngineConfig::default();
        config.expiry.max_future_years = 400_000_000;
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));

        let mut config = EngineConfig::default();
        config.expiry.stale_after_days = MAX_STALE_AFTER_DAYS;
        config.expiry.max_future_years = MAX_FUTURE_YEARS;
        assert!(config.validate().is_ok());
    }
}
