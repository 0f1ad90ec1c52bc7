use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{ReputationError, Result};

/// Score bounds and the baseline every new user starts from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBounds {
    pub base: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self {
            base: 3.0,
            min: 0.0,
            max: 5.0,
        }
    }
}

/// Fixed per-event score deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreDeltas {
    pub session_completed: f64,
    pub session_on_time: f64,
    pub host_endorsement: f64,
    pub streak_bonus: f64,
    pub late_arrival: f64,
    pub no_show: f64,
    pub early_leave: f64,
    pub cancellation: f64,
    pub toxic_behavior: f64,
    pub kicked_from_group: f64,
}

impl Default for ScoreDeltas {
    fn default() -> Self {
        Self {
            session_completed: 0.02,
            session_on_time: 0.03,
            host_endorsement: 0.05,
            streak_bonus: 0.10,
            late_arrival: -0.05,
            no_show: -0.15,
            early_leave: -0.10,
            cancellation: -0.08,
            toxic_behavior: -0.25,
            kicked_from_group: -0.20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayConfig {
    /// Events older than this many days get their delta reduced, once.
    pub days: i64,
    pub weight: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            days: 90,
            weight: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraceConfig {
    /// Negative session events are suppressed for a user's first N sessions.
    pub sessions: u32,
}

impl Default for GraceConfig {
    fn default() -> Self {
        Self { sessions: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minutes late before the late-arrival penalty kicks in.
    pub late_min: u32,
    /// Minutes late past which the late-arrival penalty no longer applies.
    pub late_max: u32,
    /// Completion percent needed to avoid the early-leave penalty.
    pub completion_percent: u32,
    /// Cancelling closer than this to the scheduled start is penalized.
    pub cancel_window_hours: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            late_min: 10,
            late_max: 20,
            completion_percent: 70,
            cancel_window_hours: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalConfig {
    /// Soft resets drift scores toward this neutral target.
    pub drift_target: f64,
    pub drift_factor: f64,
}

impl Default for SeasonalConfig {
    fn default() -> Self {
        Self {
            drift_target: 3.5,
            drift_factor: 0.1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationConfig {
    pub bounds: ScoreBounds,
    pub deltas: ScoreDeltas,
    pub decay: DecayConfig,
    pub grace: GraceConfig,
    pub thresholds: Thresholds,
    pub seasonal: SeasonalConfig,
}

impl ReputationConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>)> {
        let config_path = path.or_else(default_config_path);
        let mut config = if let Some(path) = config_path.as_ref() {
            if path.exists() {
                let contents = std::fs::read_to_string(path).map_err(|err| {
                    ReputationError::Config(format!("failed to read config: {}", err))
                })?;
                toml::from_str(&contents).map_err(|err| {
                    ReputationError::Config(format!("failed to parse config: {}", err))
                })?
            } else {
                ReputationConfig::default()
            }
        } else {
            ReputationConfig::default()
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                ReputationError::Config(format!("failed to create config dir: {}", err))
            })?;
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| ReputationError::Config(format!("failed to serialize config: {}", err)))?;
        std::fs::write(path, payload)
            .map_err(|err| ReputationError::Config(format!("failed to write config: {}", err)))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(sessions) = env::var("GRACE_PERIOD_SESSIONS") {
            if let Ok(value) = sessions.parse::<u32>() {
                self.grace.sessions = value;
            }
        }
        if let Ok(days) = env::var("DECAY_DAYS") {
            if let Ok(value) = days.parse::<i64>() {
                self.decay.days = value;
            }
        }
        if let Ok(hours) = env::var("CANCEL_WINDOW_HOURS") {
            if let Ok(value) = hours.parse::<f64>() {
                self.thresholds.cancel_window_hours = value;
            }
        }
        if let Ok(factor) = env::var("SEASONAL_DRIFT_FACTOR") {
            if let Ok(value) = factor.parse::<f64>() {
                self.seasonal.drift_factor = value;
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("REPUTATION_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/reputation.toml")))
}
