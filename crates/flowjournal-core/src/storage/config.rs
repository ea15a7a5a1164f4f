//! TOML-based application configuration.
//!
//! Stores:
//! - The threshold table and gauge/fade tuning for the flow engine
//! - CPM window sizes
//! - Endpoints for the text-analysis and billing collaborators
//!
//! Configuration is stored at `~/.config/flowjournal/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::flow::{FadeConfig, FlowConfig, RateConfig, ThresholdPolicy};

/// CPM breakpoints and per-second gauge deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdsSection {
    #[serde(default = "default_flow_cpm")]
    pub flow_cpm: u32,
    #[serde(default = "default_slow_cpm")]
    pub slow_cpm: u32,
    #[serde(default = "default_stopping_cpm")]
    pub stopping_cpm: u32,
    #[serde(default = "default_flow_delta")]
    pub flow_delta: f64,
    #[serde(default = "default_slow_delta")]
    pub slow_delta: f64,
    #[serde(default = "default_stopping_delta")]
    pub stopping_delta: f64,
    #[serde(default = "default_stopped_delta")]
    pub stopped_delta: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaugeSection {
    #[serde(default = "default_gauge_initial")]
    pub initial: f64,
    #[serde(default = "default_gauge_recovery")]
    pub recovery: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSection {
    #[serde(default = "default_window_secs")]
    pub window_secs: usize,
    #[serde(default = "default_history_len")]
    pub history_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FadeSection {
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u32,
    #[serde(default = "default_recovery_chars")]
    pub recovery_chars: usize,
}

/// Text-analysis collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

/// Prepaid-credit billing collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/flowjournal/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub thresholds: ThresholdsSection,
    #[serde(default)]
    pub gauge: GaugeSection,
    #[serde(default)]
    pub rate: RateSection,
    #[serde(default)]
    pub fade: FadeSection,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub billing: BillingConfig,
}

// Default functions
fn default_flow_cpm() -> u32 {
    ThresholdPolicy::default().flow_cpm
}
fn default_slow_cpm() -> u32 {
    ThresholdPolicy::default().slow_cpm
}
fn default_stopping_cpm() -> u32 {
    ThresholdPolicy::default().stopping_cpm
}
fn default_flow_delta() -> f64 {
    ThresholdPolicy::default().flow_delta
}
fn default_slow_delta() -> f64 {
    ThresholdPolicy::default().slow_delta
}
fn default_stopping_delta() -> f64 {
    ThresholdPolicy::default().stopping_delta
}
fn default_stopped_delta() -> f64 {
    ThresholdPolicy::default().stopped_delta
}
fn default_gauge_initial() -> f64 {
    FlowConfig::default().gauge_initial
}
fn default_gauge_recovery() -> f64 {
    FlowConfig::default().gauge_recovery
}
fn default_window_secs() -> usize {
    RateConfig::default().window_secs
}
fn default_history_len() -> usize {
    RateConfig::default().history_len
}
fn default_countdown_secs() -> u32 {
    FadeConfig::default().countdown_secs
}
fn default_recovery_chars() -> usize {
    FadeConfig::default().recovery_chars
}
fn default_true() -> bool {
    true
}
fn default_api_base_url() -> String {
    "https://api.ppq.ai".into()
}
fn default_model() -> String {
    "gpt-5".into()
}
fn default_temperature() -> f64 {
    0.7
}

impl Default for ThresholdsSection {
    fn default() -> Self {
        let policy = ThresholdPolicy::default();
        Self {
            flow_cpm: policy.flow_cpm,
            slow_cpm: policy.slow_cpm,
            stopping_cpm: policy.stopping_cpm,
            flow_delta: policy.flow_delta,
            slow_delta: policy.slow_delta,
            stopping_delta: policy.stopping_delta,
            stopped_delta: policy.stopped_delta,
        }
    }
}

impl Default for GaugeSection {
    fn default() -> Self {
        Self {
            initial: default_gauge_initial(),
            recovery: default_gauge_recovery(),
        }
    }
}

impl Default for RateSection {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            history_len: default_history_len(),
        }
    }
}

impl Default for FadeSection {
    fn default() -> Self {
        Self {
            countdown_secs: default_countdown_secs(),
            recovery_chars: default_recovery_chars(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_api_base_url(),
            model: default_model(),
            temperature: default_temperature(),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) => {
                        return Err(ConfigError::UnknownKey(key.to_string()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Location of the config file.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if the file is missing.
    ///
    /// A file whose engine settings are inconsistent is rejected here rather
    /// than when a session starts.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.flow_config()
                    .validate()
                    .map_err(|e| ConfigError::InvalidValue {
                        key: path.display().to_string(),
                        message: e.to_string(),
                    })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting engine configuration is invalid.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.flow_config().validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// Engine configuration derived from the `thresholds`, `gauge`, `rate`
    /// and `fade` sections.
    pub fn flow_config(&self) -> FlowConfig {
        let t = &self.thresholds;
        FlowConfig {
            thresholds: ThresholdPolicy {
                flow_cpm: t.flow_cpm,
                slow_cpm: t.slow_cpm,
                stopping_cpm: t.stopping_cpm,
                flow_delta: t.flow_delta,
                slow_delta: t.slow_delta,
                stopping_delta: t.stopping_delta,
                stopped_delta: t.stopped_delta,
            },
            rate: RateConfig {
                window_secs: self.rate.window_secs,
                history_len: self.rate.history_len,
            },
            fade: FadeConfig {
                countdown_secs: self.fade.countdown_secs,
                recovery_chars: self.fade.recovery_chars,
            },
            gauge_initial: self.gauge.initial,
            gauge_recovery: self.gauge.recovery,
        }
    }
}
