//! TOML-based application configuration.
//!
//! Sections:
//! - `coach`: confidence thresholds, urgency floor and adaptation bounds
//! - `timing`: global smart-timing windows
//! - `report`: targets and ROI assumptions for summaries
//! - `evolution`: strategy evolution parameters
//! - `paths`: log and state file locations
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::timing::SmartTiming;

/// Coaching engine parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachConfig {
    /// Confidence bar for personas without an override
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Most-urgent dimension must reach this to nudge
    #[serde(default = "default_urgency_floor")]
    pub urgency_floor: f64,
    /// Recent interactions inspected for dismissal back-off
    #[serde(default = "default_ten")]
    pub dismissal_window: usize,
    #[serde(default = "default_interval_step")]
    pub interval_step_minutes: u32,
    #[serde(default = "default_max_interval")]
    pub max_interval_minutes: u32,
    #[serde(default = "default_confidence_step_up")]
    pub confidence_step_up: f64,
    #[serde(default = "default_max_override")]
    pub max_confidence_override: f64,
    #[serde(default = "default_confidence_step_down")]
    pub confidence_step_down: f64,
    #[serde(default = "default_min_override")]
    pub min_confidence_override: f64,
    /// Effectiveness above which an accepted nudge lowers the bar
    #[serde(default = "default_reinforce_effectiveness")]
    pub reinforce_effectiveness: f64,
    /// Interactions considered by the mid-session update
    #[serde(default = "default_ten")]
    pub session_window: usize,
    #[serde(default = "default_session_step")]
    pub session_step: f64,
    #[serde(default = "default_session_min")]
    pub session_threshold_min: f64,
    #[serde(default = "default_session_max")]
    pub session_threshold_max: f64,
}

/// Summary report parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Target acceptance rate in percent
    #[serde(default = "default_acceptance_target")]
    pub acceptance_target: f64,
    /// Target average productivity lift in percent
    #[serde(default = "default_productivity_target")]
    pub productivity_target: f64,
    #[serde(default = "default_roi_users")]
    pub roi_users: f64,
    #[serde(default = "default_roi_hours")]
    pub roi_hours_per_week: f64,
    #[serde(default = "default_roi_rate")]
    pub roi_hourly_rate: f64,
    #[serde(default = "default_roi_weeks")]
    pub roi_weeks: f64,
    /// Bar width of ASCII charts in characters
    #[serde(default = "default_chart_width")]
    pub chart_width: usize,
    /// Upper bound of the rolling effectiveness window
    #[serde(default = "default_rolling_cap")]
    pub rolling_window_cap: usize,
}

/// Strategy evolution parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    #[serde(default = "default_elite_ratio")]
    pub elite_ratio: f64,
    /// A generation runs every this many interactions
    #[serde(default = "default_min_interactions")]
    pub min_interactions: u64,
    /// Interactions kept in saved state
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
    /// Interactions in the running acceptance window
    #[serde(default = "default_acceptance_window")]
    pub acceptance_window: usize,
}

/// File locations, relative to the data directory unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_interaction_log")]
    pub interaction_log: String,
    #[serde(default = "default_nudge_log")]
    pub nudge_log: String,
    #[serde(default = "default_learning_state")]
    pub learning_state: String,
    #[serde(default = "default_evolution_state")]
    pub evolution_state: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub coach: CoachConfig,
    #[serde(default)]
    pub timing: SmartTiming,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub evolution: EvolutionConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

// Default functions
fn default_confidence_threshold() -> f64 {
    0.8
}
fn default_urgency_floor() -> f64 {
    0.3
}
fn default_ten() -> usize {
    10
}
fn default_interval_step() -> u32 {
    15
}
fn default_max_interval() -> u32 {
    120
}
fn default_confidence_step_up() -> f64 {
    0.05
}
fn default_max_override() -> f64 {
    0.95
}
fn default_confidence_step_down() -> f64 {
    0.02
}
fn default_min_override() -> f64 {
    0.5
}
fn default_reinforce_effectiveness() -> f64 {
    0.7
}
fn default_session_step() -> f64 {
    0.05
}
fn default_session_min() -> f64 {
    0.6
}
fn default_session_max() -> f64 {
    0.9
}
fn default_acceptance_target() -> f64 {
    65.0
}
fn default_productivity_target() -> f64 {
    12.0
}
fn default_roi_users() -> f64 {
    50.0
}
fn default_roi_hours() -> f64 {
    40.0
}
fn default_roi_rate() -> f64 {
    83.0
}
fn default_roi_weeks() -> f64 {
    13.0
}
fn default_chart_width() -> usize {
    50
}
fn default_rolling_cap() -> usize {
    20
}
fn default_population_size() -> usize {
    8
}
fn default_mutation_rate() -> f64 {
    0.3
}
fn default_crossover_rate() -> f64 {
    0.4
}
fn default_elite_ratio() -> f64 {
    0.25
}
fn default_min_interactions() -> u64 {
    5
}
fn default_history_cap() -> usize {
    100
}
fn default_acceptance_window() -> usize {
    50
}
fn default_interaction_log() -> String {
    "coaching_interactions.jsonl".into()
}
fn default_nudge_log() -> String {
    "nudge_generation_log.jsonl".into()
}
fn default_learning_state() -> String {
    "learning_state.json".into()
}
fn default_evolution_state() -> String {
    "evolution_state.json".into()
}
fn default_output_dir() -> String {
    "outputs".into()
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            urgency_floor: default_urgency_floor(),
            dismissal_window: 10,
            interval_step_minutes: 15,
            max_interval_minutes: 120,
            confidence_step_up: default_confidence_step_up(),
            max_confidence_override: default_max_override(),
            confidence_step_down: default_confidence_step_down(),
            min_confidence_override: default_min_override(),
            reinforce_effectiveness: default_reinforce_effectiveness(),
            session_window: 10,
            session_step: default_session_step(),
            session_threshold_min: default_session_min(),
            session_threshold_max: default_session_max(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            acceptance_target: default_acceptance_target(),
            productivity_target: default_productivity_target(),
            roi_users: default_roi_users(),
            roi_hours_per_week: default_roi_hours(),
            roi_hourly_rate: default_roi_rate(),
            roi_weeks: default_roi_weeks(),
            chart_width: default_chart_width(),
            rolling_window_cap: default_rolling_cap(),
        }
    }
}

impl ReportConfig {
    /// Quarterly value of one unit of productivity lift.
    pub fn roi_multiplier(&self) -> f64 {
        self.roi_users * self.roi_hours_per_week * self.roi_hourly_rate * self.roi_weeks
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            mutation_rate: default_mutation_rate(),
            crossover_rate: default_crossover_rate(),
            elite_ratio: default_elite_ratio(),
            min_interactions: default_min_interactions(),
            history_cap: default_history_cap(),
            acceptance_window: default_acceptance_window(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            interaction_log: default_interaction_log(),
            nudge_log: default_nudge_log(),
            learning_state: default_learning_state(),
            evolution_state: default_evolution_state(),
            output_dir: default_output_dir(),
        }
    }
}

impl PathsConfig {
    /// Resolve a configured path against a base directory.
    pub fn resolve(base: &Path, configured: &str) -> PathBuf {
        let p = Path::new(configured);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            base.join(p)
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
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

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
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn collect_keys(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
        match value {
            serde_json::Value::Object(map) => {
                for (k, v) in map {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    Self::collect_keys(&key, v, out);
                }
            }
            serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
            other => out.push((prefix.to_string(), other.to_string())),
        }
    }

    /// Default config file location.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
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

    /// Every leaf key with its current value, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            Self::collect_keys("", &json, &mut out);
        }
        out.sort();
        out
    }

    /// Update a value in memory. Rejects unknown keys and invalid values.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Update a value and persist the config.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// Check ranges the TOML types cannot express.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let unit_fields = [
            ("coach.confidence_threshold", self.coach.confidence_threshold),
            ("coach.urgency_floor", self.coach.urgency_floor),
            ("coach.max_confidence_override", self.coach.max_confidence_override),
            ("coach.min_confidence_override", self.coach.min_confidence_override),
            ("coach.session_threshold_min", self.coach.session_threshold_min),
            ("coach.session_threshold_max", self.coach.session_threshold_max),
            ("timing.quiet_override_load", self.timing.quiet_override_load),
            ("evolution.mutation_rate", self.evolution.mutation_rate),
            ("evolution.crossover_rate", self.evolution.crossover_rate),
            ("evolution.elite_ratio", self.evolution.elite_ratio),
        ];
        for (key, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{value} is outside [0, 1]"),
                });
            }
        }

        if self.coach.min_confidence_override > self.coach.max_confidence_override {
            return Err(ConfigError::InvalidValue {
                key: "coach.min_confidence_override".into(),
                message: "must not exceed coach.max_confidence_override".into(),
            });
        }
        if self.evolution.population_size < 2 {
            return Err(ConfigError::InvalidValue {
                key: "evolution.population_size".into(),
                message: "must be at least 2".into(),
            });
        }
        if self.evolution.min_interactions == 0 {
            return Err(ConfigError::InvalidValue {
                key: "evolution.min_interactions".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.timing.first_hour_cutoff > 23
            || self.timing.end_of_day_hour > 24
            || self.timing.lunch_start > self.timing.lunch_end
        {
            return Err(ConfigError::InvalidValue {
                key: "timing".into(),
                message: "hours must be within a day and lunch_start <= lunch_end".into(),
            });
        }
        Ok(())
    }

    /// Absolute path of a configured file under `base`.
    pub fn interaction_log_path(&self, base: &Path) -> PathBuf {
        PathsConfig::resolve(base, &self.paths.interaction_log)
    }

    pub fn nudge_log_path(&self, base: &Path) -> PathBuf {
        PathsConfig::resolve(base, &self.paths.nudge_log)
    }

    pub fn learning_state_path(&self, base: &Path) -> PathBuf {
        PathsConfig::resolve(base, &self.paths.learning_state)
    }

    pub fn evolution_state_path(&self, base: &Path) -> PathBuf {
        PathsConfig::resolve(base, &self.paths.evolution_state)
    }

    pub fn output_dir(&self, base: &Path) -> PathBuf {
        PathsConfig::resolve(base, &self.paths.output_dir)
    }
}
