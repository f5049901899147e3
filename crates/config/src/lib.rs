use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/oxum.toml";

pub const ENV_GLOBAL_BOOST_PRICE: &str = "OXUM_GLOBAL_BOOST_PRICE";
pub const ENV_ROTATION_INTERVAL_SECS: &str = "OXUM_ROTATION_INTERVAL_SECS";
pub const ENV_LOG_LEVEL: &str = "OXUM_LOG_LEVEL";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("engine.{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("engine.reset_threshold_hours must not be negative (got {0})")]
    NegativeThreshold(f64),
    #[error("engine.assumed_system_load must be within [0, 1] (got {0})")]
    LoadOutOfRange(f64),
    #[error("pricing.global_boost_price must be greater than zero (got {0})")]
    NonPositivePrice(Decimal),
}

// ── Engine config ─────────────────────────────────────────────────────────────

/// Tunables of the boost rotation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds between two rotation passes.  The timer re-arms only after the
    /// previous pass has finished.
    pub rotation_interval_secs: u64,
    /// Scales the waiting-time reward in the composite score.
    pub rotation_factor: f64,
    /// Recently viewed profiles are ranked at `1 / repetition_penalty_factor`
    /// of their score.  Values `<= 1` disable the penalty.
    pub repetition_penalty_factor: f64,
    /// A penalized profile that has waited longer than this many hours since
    /// its last top slot gets its penalty cleared on the next reset pass.
    pub reset_threshold_hours: f64,
    /// Maximum number of profile ids kept in the recently-viewed history.
    pub history_capacity: usize,
    /// Number of rotations between two penalty reset passes.
    pub penalty_reset_every: u64,
    /// Load figure used for slot duration estimates until real load metrics
    /// are wired in.  Range `[0, 1]`.
    pub assumed_system_load: f64,
    /// A profile that has gone this many hours without the top slot takes it
    /// on the next rotation, whatever its score.
    pub max_wait_hours: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rotation_interval_secs: 180,
            rotation_factor: 1.0,
            repetition_penalty_factor: 2.0,
            reset_threshold_hours: 2.0,
            history_capacity: 50,
            penalty_reset_every: 10,
            assumed_system_load: 0.5,
            max_wait_hours: 24.0,
        }
    }
}

/// Partial update of the runtime-tunable engine parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfigPatch {
    pub rotation_factor: Option<f64>,
    pub repetition_penalty_factor: Option<f64>,
    pub reset_threshold_hours: Option<f64>,
}

impl EngineConfig {
    /// Returns a new config with every `Some` field of `patch` applied.
    /// `self` is left untouched so callers can swap the whole value at once.
    pub fn merged(&self, patch: &EngineConfigPatch) -> Self {
        Self {
            rotation_factor: patch.rotation_factor.unwrap_or(self.rotation_factor),
            repetition_penalty_factor: patch
                .repetition_penalty_factor
                .unwrap_or(self.repetition_penalty_factor),
            reset_threshold_hours: patch
                .reset_threshold_hours
                .unwrap_or(self.reset_threshold_hours),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("rotation_interval_secs", self.rotation_interval_secs as f64)?;
        positive("rotation_factor", self.rotation_factor)?;
        positive("repetition_penalty_factor", self.repetition_penalty_factor)?;
        positive("history_capacity", self.history_capacity as f64)?;
        positive("penalty_reset_every", self.penalty_reset_every as f64)?;
        positive("max_wait_hours", self.max_wait_hours)?;
        if !(self.reset_threshold_hours >= 0.0) {
            return Err(ConfigError::NegativeThreshold(self.reset_threshold_hours));
        }
        if !(0.0..=1.0).contains(&self.assumed_system_load) {
            return Err(ConfigError::LoadOutOfRange(self.assumed_system_load));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    // Written so that NaN is rejected too.
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

// ── Pricing config ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// The one price every boost purchase must carry, in platform tokens.
    pub global_boost_price: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            global_boost_price: Decimal::from(15),
        }
    }
}

// ── Telemetry config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Default `tracing` filter directive; `RUST_LOG` still wins when set.
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// ── Root ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OxumConfig {
    pub engine: EngineConfig,
    pub pricing: PricingConfig,
    pub telemetry: TelemetryConfig,
}

impl OxumConfig {
    /// Load from `path` (defaults when the file is missing), apply `OXUM_*`
    /// environment overrides, then validate.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Empty or unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(price) = lookup(ENV_GLOBAL_BOOST_PRICE)
            .and_then(|raw| Decimal::from_str(raw.trim()).ok())
        {
            self.pricing.global_boost_price = price;
        }

        if let Some(secs) = lookup(ENV_ROTATION_INTERVAL_SECS)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
        {
            self.engine.rotation_interval_secs = secs;
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            if !level.trim().is_empty() {
                self.telemetry.log_level = level.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.pricing.global_boost_price <= Decimal::ZERO {
            return Err(ConfigError::NonPositivePrice(self.pricing.global_boost_price));
        }
        Ok(())
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
