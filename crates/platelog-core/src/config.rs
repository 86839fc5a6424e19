use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ErrorCode;
use crate::model::Rating;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub ranking: RankingSection,
    #[serde(default)]
    pub presentation: PresentationSection,
    #[serde(default)]
    pub proportion: ProportionSection,
    #[serde(default)]
    pub orders: OrdersSection,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingSection {
    /// Minimum rating for an entry to enter a week's natural ranking.
    #[serde(default = "default_week_threshold")]
    pub week_threshold: u8,
}

impl Default for RankingSection {
    fn default() -> Self {
        Self {
            week_threshold: default_week_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationSection {
    #[serde(default = "default_week_min_rating")]
    pub week_min_rating: u8,
    #[serde(default = "default_exact_rating")]
    pub month_exact_rating: u8,
    #[serde(default = "default_exact_rating")]
    pub year_exact_rating: u8,
    #[serde(default)]
    pub top_n: Option<usize>,
}

impl Default for PresentationSection {
    fn default() -> Self {
        Self {
            week_min_rating: default_week_min_rating(),
            month_exact_rating: default_exact_rating(),
            year_exact_rating: default_exact_rating(),
            top_n: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionSection {
    /// Fields whose labels sort by numeric value instead of by count.
    #[serde(default = "default_numeric_fields")]
    pub numeric_fields: Vec<String>,
    /// Per-field allow-lists; values outside the list count as unspecified.
    #[serde(default)]
    pub allow_lists: BTreeMap<String, Vec<String>>,
}

impl Default for ProportionSection {
    fn default() -> Self {
        Self {
            numeric_fields: default_numeric_fields(),
            allow_lists: BTreeMap::new(),
        }
    }
}

/// How a failed saved-order read affects an aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderReadMode {
    /// Fall back to the natural ranking.
    #[default]
    Lenient,
    /// Fail the aggregation.
    Strict,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersSection {
    #[serde(default)]
    pub read_mode: OrderReadMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

/// A configuration value that parsed but is not usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid config value for {field}: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ConfigParseError
    }
}

impl EngineConfig {
    /// Reject rating thresholds outside `1..=5` and a zero `top_n`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratings = [
            ("ranking.week_threshold", self.ranking.week_threshold),
            ("presentation.week_min_rating", self.presentation.week_min_rating),
            ("presentation.month_exact_rating", self.presentation.month_exact_rating),
            ("presentation.year_exact_rating", self.presentation.year_exact_rating),
        ];
        for (field, value) in ratings {
            Rating::new(value).map_err(|e| ConfigError {
                field,
                reason: e.to_string(),
            })?;
        }

        if self.presentation.top_n == Some(0) {
            return Err(ConfigError {
                field: "presentation.top_n",
                reason: "must be at least 1 when set".to_string(),
            });
        }
        Ok(())
    }
}

/// Parse and validate a config document.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or a value fails validation.
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    let config = toml::from_str::<EngineConfig>(content)?;
    config.validate()?;
    Ok(config)
}

/// Load a config file; a missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    parse_config(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `<config dir>/platelog/config.toml`, or defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<EngineConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(EngineConfig::default());
    };
    load_config(&config_dir.join("platelog/config.toml"))
}

const fn default_week_threshold() -> u8 {
    4
}

const fn default_week_min_rating() -> u8 {
    4
}

const fn default_exact_rating() -> u8 {
    5
}

fn default_numeric_fields() -> Vec<String> {
    vec!["rating".to_string(), "satiety".to_string()]
}

fn default_log_filter() -> String {
    "platelog=info,warn".to_string()
}
