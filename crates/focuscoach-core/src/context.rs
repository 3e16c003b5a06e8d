//! User context ingestion.
//!
//! A [`UserContext`] is the typed snapshot every coaching decision starts
//! from. It is either assembled directly through [`UserContextBuilder`]
//! (which clamps unit-interval signals) or extracted from a window of raw
//! [`TelemetrySample`] rows.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Coarse time-of-day bucket derived from the hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    /// Before 09:00
    EarlyMorning,
    /// 09:00-11:59
    Morning,
    /// 12:00-13:59
    Midday,
    /// 14:00-16:59
    Afternoon,
    /// 17:00 onwards
    Evening,
}

impl TimeOfDay {
    pub fn from_hour(hour: u8) -> Self {
        match hour {
            0..=8 => TimeOfDay::EarlyMorning,
            9..=11 => TimeOfDay::Morning,
            12..=13 => TimeOfDay::Midday,
            14..=16 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }
}

/// Attention state of the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusState {
    Deep,
    Shallow,
    Distracted,
}

impl FocusState {
    /// Derive focus state from session length and window switching.
    pub fn infer(focus_duration_min: u32, window_switches: u32) -> Self {
        if focus_duration_min > 45 && window_switches < 5 {
            FocusState::Deep
        } else if window_switches > 10 || focus_duration_min < 15 {
            FocusState::Distracted
        } else {
            FocusState::Shallow
        }
    }
}

/// Boolean observations computed from context signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextFlag {
    HighTabCount,
    FrequentSwitching,
    GoodFocus,
    ShortFocus,
    CognitiveOverload,
    LowCoreWork,
    EndOfDay,
    HighInterruptions,
    MeetingHeavyDay,
    NoBreaks,
}

/// One raw telemetry row as produced by the activity tracker.
///
/// Field names follow the telemetry export so rows deserialize directly
/// from JSON Lines. Missing columns fall back to the tracker's defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub user_id: u64,
    #[serde(default)]
    pub persona_type: Option<String>,
    #[serde(default = "default_tab_count")]
    pub tab_count: u32,
    #[serde(default)]
    pub window_switches_15min: u32,
    #[serde(default = "default_focus_duration")]
    pub focus_session_duration: u32,
    #[serde(default = "default_half")]
    pub cognitive_load_score: f64,
    #[serde(default = "default_app")]
    pub app_active: String,
    #[serde(default = "default_task_category")]
    pub task_category: String,
    #[serde(default = "default_keystrokes")]
    pub keystrokes_per_min: f64,
    #[serde(default)]
    pub break_duration_min: u32,
    #[serde(default)]
    pub interruption_count: u32,
    #[serde(default = "default_core_work")]
    pub core_work_percentage: f64,
    #[serde(default = "default_half")]
    pub value_score: f64,
    #[serde(default = "default_productivity")]
    pub productivity_score: f64,
    #[serde(default)]
    pub meeting_duration_min: u32,
    #[serde(default)]
    pub energy_level: Option<f64>,
    #[serde(default)]
    pub stress_level: Option<f64>,
}

fn default_tab_count() -> u32 {
    3
}
fn default_focus_duration() -> u32 {
    15
}
fn default_half() -> f64 {
    0.5
}
fn default_app() -> String {
    "Browser".into()
}
fn default_task_category() -> String {
    "support".into()
}
fn default_keystrokes() -> f64 {
    60.0
}
fn default_core_work() -> f64 {
    0.3
}
fn default_productivity() -> f64 {
    0.6
}

/// Typed snapshot of a user's working state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    /// Hour of day (0-23)
    pub hour: u8,
    pub time_of_day: TimeOfDay,
    /// Task cognitive load (0.0-1.0)
    pub cognitive_load: f64,
    /// Energy level (0.0-1.0)
    pub energy_level: f64,
    /// Stress level (0.0-1.0)
    pub stress_level: f64,
    /// Attention level (0.0-1.0)
    pub attention_level: f64,
    pub focus_state: FocusState,
    pub tab_count: u32,
    pub window_switches: u32,
    pub focus_duration_min: u32,
    pub break_duration_min: u32,
    pub interruption_count: u32,
    pub meeting_duration_min: u32,
    pub keystrokes_per_min: f64,
    /// Share of time spent on core work (0.0-1.0)
    pub core_work_ratio: f64,
    /// Value creation score (0.0-1.0)
    pub value_score: f64,
    /// Productivity score (0.0-1.0)
    pub productivity_score: f64,
    pub app_active: String,
    pub task_category: String,
    #[serde(default)]
    pub recent_activities: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
    #[serde(default)]
    pub flags: BTreeSet<ContextFlag>,
}

impl UserContext {
    pub fn builder() -> UserContextBuilder {
        UserContextBuilder::default()
    }

    /// Extract a context from a window of telemetry samples.
    ///
    /// The latest sample supplies point-in-time readings. Switches, breaks,
    /// interruptions and meeting time are summed over the whole window.
    pub fn from_samples(samples: &[TelemetrySample]) -> Result<Self, ValidationError> {
        let latest = samples
            .iter()
            .max_by_key(|s| s.timestamp)
            .ok_or_else(|| ValidationError::EmptyCollection("telemetry samples".into()))?;

        let window_switches: u32 = saturating_total(samples, |s| s.window_switches_15min);
        let break_duration: u32 = saturating_total(samples, |s| s.break_duration_min);
        let interruptions: u32 = saturating_total(samples, |s| s.interruption_count);
        let meetings: u32 = saturating_total(samples, |s| s.meeting_duration_min);

        let mut activities: Vec<String> = samples
            .iter()
            .rev()
            .take(5)
            .map(|s| format!("{}:{}", s.app_active, s.task_category))
            .collect();
        activities.reverse();

        let cognitive_load = latest.cognitive_load_score.clamp(0.0, 1.0);
        let energy = latest
            .energy_level
            .unwrap_or(latest.productivity_score)
            .clamp(0.0, 1.0);
        let stress = latest.stress_level.unwrap_or(cognitive_load).clamp(0.0, 1.0);

        let ctx = UserContext::builder()
            .hour(latest.timestamp.hour() as u8)
            .cognitive_load(cognitive_load)
            .energy_level(energy)
            .stress_level(stress)
            .tab_count(latest.tab_count)
            .window_switches(window_switches)
            .focus_duration(latest.focus_session_duration)
            .break_duration(break_duration)
            .interruptions(interruptions)
            .meetings(meetings)
            .keystrokes_per_min(latest.keystrokes_per_min)
            .core_work_ratio(latest.core_work_percentage)
            .value_score(latest.value_score)
            .productivity_score(latest.productivity_score)
            .app_active(&latest.app_active)
            .task_category(&latest.task_category)
            .recent_activities(activities)
            .build();

        Ok(ctx)
    }

    /// Check every unit-interval signal and the hour.
    ///
    /// Contexts built through the builder always pass; this guards contexts
    /// deserialized from user-supplied JSON.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.hour > 23 {
            return Err(ValidationError::OutOfRange {
                field: "hour".into(),
                value: self.hour as f64,
                min: 0.0,
                max: 23.0,
            });
        }

        let unit_fields = [
            ("cognitive_load", self.cognitive_load),
            ("energy_level", self.energy_level),
            ("stress_level", self.stress_level),
            ("attention_level", self.attention_level),
            ("core_work_ratio", self.core_work_ratio),
            ("value_score", self.value_score),
            ("productivity_score", self.productivity_score),
        ];
        for (field, value) in unit_fields {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::unit_interval(field, value));
            }
        }

        if !self.keystrokes_per_min.is_finite() || self.keystrokes_per_min < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "keystrokes_per_min".into(),
                message: "must be a non-negative number".into(),
            });
        }

        Ok(())
    }

    pub fn has_flag(&self, flag: ContextFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Whether the active application is a code editor.
    pub fn is_coding_app(&self) -> bool {
        ["VSCode", "Visual Studio", "IntelliJ", "PyCharm", "Sublime"]
            .iter()
            .any(|app| self.app_active.contains(app))
    }
}

fn saturating_total(samples: &[TelemetrySample], field: impl Fn(&TelemetrySample) -> u32) -> u32 {
    samples.iter().map(field).fold(0u32, u32::saturating_add)
}

/// Compute boolean context flags from raw signals.
pub fn compute_flags(ctx: &UserContext) -> BTreeSet<ContextFlag> {
    let mut flags = BTreeSet::new();

    if ctx.tab_count > 5 {
        flags.insert(ContextFlag::HighTabCount);
    }
    if ctx.window_switches > 10 {
        flags.insert(ContextFlag::FrequentSwitching);
    }
    if ctx.focus_duration_min > 45 {
        flags.insert(ContextFlag::GoodFocus);
    } else if ctx.focus_duration_min < 15 {
        flags.insert(ContextFlag::ShortFocus);
    }
    if ctx.cognitive_load > 0.8 {
        flags.insert(ContextFlag::CognitiveOverload);
    }
    if ctx.core_work_ratio < 0.3 {
        flags.insert(ContextFlag::LowCoreWork);
    }
    if ctx.hour > 16 {
        flags.insert(ContextFlag::EndOfDay);
    }
    if ctx.interruption_count > 5 {
        flags.insert(ContextFlag::HighInterruptions);
    }
    if ctx.meeting_duration_min > 240 {
        flags.insert(ContextFlag::MeetingHeavyDay);
    }
    if ctx.break_duration_min < 5 {
        flags.insert(ContextFlag::NoBreaks);
    }

    flags
}

/// Builder for [`UserContext`]; clamps unit-interval inputs.
#[derive(Debug, Clone)]
pub struct UserContextBuilder {
    hour: u8,
    cognitive_load: f64,
    energy_level: f64,
    stress_level: f64,
    attention_level: Option<f64>,
    tab_count: u32,
    window_switches: u32,
    focus_duration_min: u32,
    break_duration_min: u32,
    interruption_count: u32,
    meeting_duration_min: u32,
    keystrokes_per_min: f64,
    core_work_ratio: f64,
    value_score: f64,
    productivity_score: f64,
    app_active: String,
    task_category: String,
    recent_activities: Vec<String>,
    goals: Vec<String>,
    preferences: BTreeMap<String, String>,
}

impl Default for UserContextBuilder {
    fn default() -> Self {
        Self {
            hour: 10,
            cognitive_load: 0.5,
            energy_level: 0.6,
            stress_level: 0.4,
            attention_level: None,
            tab_count: default_tab_count(),
            window_switches: 5,
            focus_duration_min: default_focus_duration(),
            break_duration_min: 5,
            interruption_count: 2,
            meeting_duration_min: 0,
            keystrokes_per_min: default_keystrokes(),
            core_work_ratio: default_core_work(),
            value_score: default_half(),
            productivity_score: default_productivity(),
            app_active: default_app(),
            task_category: default_task_category(),
            recent_activities: Vec::new(),
            goals: Vec::new(),
            preferences: BTreeMap::new(),
        }
    }
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl UserContextBuilder {
    pub fn hour(mut self, hour: u8) -> Self {
        self.hour = hour.min(23);
        self
    }
    pub fn cognitive_load(mut self, v: f64) -> Self {
        self.cognitive_load = unit(v);
        self
    }
    pub fn energy_level(mut self, v: f64) -> Self {
        self.energy_level = unit(v);
        self
    }
    pub fn stress_level(mut self, v: f64) -> Self {
        self.stress_level = unit(v);
        self
    }
    pub fn attention_level(mut self, v: f64) -> Self {
        self.attention_level = Some(unit(v));
        self
    }
    pub fn tab_count(mut self, v: u32) -> Self {
        self.tab_count = v;
        self
    }
    pub fn window_switches(mut self, v: u32) -> Self {
        self.window_switches = v;
        self
    }
    pub fn focus_duration(mut self, minutes: u32) -> Self {
        self.focus_duration_min = minutes;
        self
    }
    pub fn break_duration(mut self, minutes: u32) -> Self {
        self.break_duration_min = minutes;
        self
    }
    pub fn interruptions(mut self, v: u32) -> Self {
        self.interruption_count = v;
        self
    }
    pub fn meetings(mut self, minutes: u32) -> Self {
        self.meeting_duration_min = minutes;
        self
    }
    pub fn keystrokes_per_min(mut self, v: f64) -> Self {
        self.keystrokes_per_min = if v.is_finite() { v.max(0.0) } else { 0.0 };
        self
    }
    pub fn core_work_ratio(mut self, v: f64) -> Self {
        self.core_work_ratio = unit(v);
        self
    }
    pub fn value_score(mut self, v: f64) -> Self {
        self.value_score = unit(v);
        self
    }
    pub fn productivity_score(mut self, v: f64) -> Self {
        self.productivity_score = unit(v);
        self
    }
    pub fn app_active(mut self, app: &str) -> Self {
        self.app_active = app.to_string();
        self
    }
    pub fn task_category(mut self, category: &str) -> Self {
        self.task_category = category.to_string();
        self
    }
    pub fn recent_activities(mut self, activities: Vec<String>) -> Self {
        self.recent_activities = activities;
        self
    }
    pub fn goals(mut self, goals: Vec<String>) -> Self {
        self.goals = goals;
        self
    }
    pub fn preference(mut self, key: &str, value: &str) -> Self {
        self.preferences.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> UserContext {
        // Attention falls off linearly with switching when not measured directly
        let attention = self
            .attention_level
            .unwrap_or_else(|| 1.0 - (self.window_switches as f64 / 20.0).min(1.0));

        let mut ctx = UserContext {
            hour: self.hour,
            time_of_day: TimeOfDay::from_hour(self.hour),
            cognitive_load: self.cognitive_load,
            energy_level: self.energy_level,
            stress_level: self.stress_level,
            attention_level: attention,
            focus_state: FocusState::infer(self.focus_duration_min, self.window_switches),
            tab_count: self.tab_count,
            window_switches: self.window_switches,
            focus_duration_min: self.focus_duration_min,
            break_duration_min: self.break_duration_min,
            interruption_count: self.interruption_count,
            meeting_duration_min: self.meeting_duration_min,
            keystrokes_per_min: self.keystrokes_per_min,
            core_work_ratio: self.core_work_ratio,
            value_score: self.value_score,
            productivity_score: self.productivity_score,
            app_active: self.app_active,
            task_category: self.task_category,
            recent_activities: self.recent_activities,
            goals: self.goals,
            preferences: self.preferences,
            flags: BTreeSet::new(),
        };
        ctx.flags = compute_flags(&ctx);
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(minute: u32, switches: u32) -> TelemetrySample {
        TelemetrySample {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 14, minute, 0).unwrap(),
            user_id: 7,
            persona_type: Some("analyst".into()),
            tab_count: 8,
            window_switches_15min: switches,
            focus_session_duration: 12,
            cognitive_load_score: 0.85,
            app_active: "Excel".into(),
            task_category: "analysis".into(),
            keystrokes_per_min: 70.0,
            break_duration_min: 1,
            interruption_count: 2,
            core_work_percentage: 0.2,
            value_score: 0.35,
            productivity_score: 0.5,
            meeting_duration_min: 0,
            energy_level: None,
            stress_level: None,
        }
    }

    #[test]
    fn time_of_day_buckets() {
        assert_eq!(TimeOfDay::from_hour(8), TimeOfDay::EarlyMorning);
        assert_eq!(TimeOfDay::from_hour(9), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(13), TimeOfDay::Midday);
        assert_eq!(TimeOfDay::from_hour(16), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
    }

    #[test]
    fn builder_clamps_unit_signals() {
        let ctx = UserContext::builder()
            .cognitive_load(5.0)
            .energy_level(-1.0)
            .stress_level(f64::NAN)
            .build();
        assert_eq!(ctx.cognitive_load, 1.0);
        assert_eq!(ctx.energy_level, 0.0);
        assert_eq!(ctx.stress_level, 0.0);
        assert!(ctx.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_deserialized_context() {
        let mut ctx = UserContext::builder().build();
        ctx.cognitive_load = 5.0;
        let err = ctx.validate().unwrap_err();
        assert_eq!(err, ValidationError::unit_interval("cognitive_load", 5.0));
    }

    #[test]
    fn from_samples_sums_window_counters() {
        let samples = vec![sample(0, 4), sample(15, 5), sample(30, 3)];
        let ctx = UserContext::from_samples(&samples).unwrap();

        assert_eq!(ctx.window_switches, 12);
        assert_eq!(ctx.break_duration_min, 3);
        assert_eq!(ctx.interruption_count, 6);
        assert_eq!(ctx.hour, 14);
        assert_eq!(ctx.recent_activities.len(), 3);
        assert!(ctx.has_flag(ContextFlag::HighTabCount));
        assert!(ctx.has_flag(ContextFlag::FrequentSwitching));
        assert!(ctx.has_flag(ContextFlag::CognitiveOverload));
        assert!(ctx.has_flag(ContextFlag::LowCoreWork));
        assert!(ctx.has_flag(ContextFlag::HighInterruptions));
        assert!(ctx.has_flag(ContextFlag::NoBreaks));
        assert!(ctx.has_flag(ContextFlag::ShortFocus));
        assert_eq!(ctx.focus_state, FocusState::Distracted);
    }

    #[test]
    fn from_samples_saturates_huge_counters() {
        let mut first = sample(0, u32::MAX);
        first.interruption_count = u32::MAX - 1;
        let samples = vec![first, sample(15, 9)];
        let ctx = UserContext::from_samples(&samples).unwrap();

        assert_eq!(ctx.window_switches, u32::MAX);
        assert_eq!(ctx.interruption_count, u32::MAX);
        assert_eq!(ctx.break_duration_min, 2);
    }

    #[test]
    fn from_samples_rejects_empty_window() {
        let err = UserContext::from_samples(&[]).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyCollection(_)));
    }

    #[test]
    fn telemetry_row_uses_tracker_defaults() {
        let row: TelemetrySample =
            serde_json::from_str(r#"{"timestamp":"2024-03-04T10:00:00Z"}"#).unwrap();
        assert_eq!(row.tab_count, 3);
        assert_eq!(row.focus_session_duration, 15);
        assert_eq!(row.app_active, "Browser");
        assert_eq!(row.core_work_percentage, 0.3);
    }

    #[test]
    fn focus_state_inference() {
        assert_eq!(FocusState::infer(60, 2), FocusState::Deep);
        assert_eq!(FocusState::infer(30, 12), FocusState::Distracted);
        assert_eq!(FocusState::infer(10, 2), FocusState::Distracted);
        assert_eq!(FocusState::infer(30, 6), FocusState::Shallow);
    }
}
