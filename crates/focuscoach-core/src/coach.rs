//! Coaching engine.
//!
//! [`Coach`] runs the pipeline for one user context at a time:
//!
//! 1. Gating: timing windows, nudge spacing, dismissal back-off, daily
//!    budget and flow protection ([`Coach::should_send`]).
//! 2. Scoring: every dimension is analysed and the most urgent one triggers.
//! 3. Content: persona-specialised text, else the dimension template, then
//!    the persona's tone.
//! 4. Confidence: compared against the persona override or the global bar.
//! 5. Strategy: the selector picks a strategy whose intervention supplies
//!    action steps and a follow-up.
//!
//! Responses are fed back through [`Coach::record_interaction`], which
//! scores effectiveness and adapts the persona profiles.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Timelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::UserContext;
use crate::error::Result;
use crate::interaction::{
    DismissalReason, Interaction, NudgeLog, NudgeLogEntry, NudgeRecord, Outcome,
};
use crate::persona::{Persona, PersonaBook, PersonaProfile};
use crate::scoring::{self, Analysis, Dimension};
use crate::selector::{NudgeType, Strategy, StrategySelector};
use crate::storage::{CoachConfig, Config, ReportConfig};
use crate::templates::{self, ActionStep, TemplateCatalog};
use crate::timing::{self, SmartTiming, TimingBlock};

/// Snooze choices offered with every nudge.
pub const SNOOZE_OPTIONS: [&str; 3] = ["15min", "1hour", "rest-of-day"];

/// A generated coaching nudge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nudge {
    pub id: Uuid,
    pub user_id: u64,
    pub persona: Persona,
    pub text: String,
    pub nudge_type: NudgeType,
    pub strategy: Strategy,
    pub trigger_dimension: Dimension,
    pub confidence: f64,
    pub urgency_score: f64,
    pub expected_outcome: String,
    pub trigger_reason: String,
    pub snooze_options: Vec<String>,
    pub action_steps: Vec<ActionStep>,
    pub follow_up: String,
    pub timestamp: DateTime<Utc>,
}

/// Why the coach stayed silent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    Timing { block: TimingBlock },
    TooSoon { minutes_since: i64, interval_minutes: u32 },
    RecentDismissals { rejected: usize },
    DailyLimit { limit: u32 },
    InFlow,
    NotUrgent { urgency: f64 },
    LowConfidence { confidence: f64, threshold: f64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Timing { block } => write!(f, "poor timing ({block})"),
            SkipReason::TooSoon {
                minutes_since,
                interval_minutes,
            } => write!(
                f,
                "last nudge was {minutes_since} min ago (interval {interval_minutes} min)"
            ),
            SkipReason::RecentDismissals { rejected } => {
                write!(f, "{rejected} recent dismissals")
            }
            SkipReason::DailyLimit { limit } => write!(f, "daily limit of {limit} reached"),
            SkipReason::InFlow => f.write_str("user is in flow"),
            SkipReason::NotUrgent { urgency } => {
                write!(f, "nothing urgent (top urgency {urgency:.2})")
            }
            SkipReason::LowConfidence {
                confidence,
                threshold,
            } => write!(f, "confidence {confidence:.2} below threshold {threshold:.2}"),
        }
    }
}

/// Result of one coaching pass.
#[derive(Debug, Clone, PartialEq)]
pub enum CoachDecision {
    Nudge(Box<Nudge>),
    Skipped(SkipReason),
}

impl CoachDecision {
    pub fn nudge(&self) -> Option<&Nudge> {
        match self {
            CoachDecision::Nudge(n) => Some(n),
            CoachDecision::Skipped(_) => None,
        }
    }
}

/// A change the coach made to a persona profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdaptationChange {
    NudgeInterval { old: u32, new: u32 },
    AvoidHour { hour: u8 },
    ConfidenceThreshold { old: f64, new: f64 },
}

impl fmt::Display for AdaptationChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdaptationChange::NudgeInterval { old, new } => {
                write!(f, "nudge interval {old} -> {new} min")
            }
            AdaptationChange::AvoidHour { hour } => write!(f, "avoid hour {hour}:00"),
            AdaptationChange::ConfidenceThreshold { old, new } => {
                write!(f, "confidence threshold {old:.2} -> {new:.2}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adaptation {
    pub persona: Persona,
    pub change: AdaptationChange,
    pub timestamp: DateTime<Utc>,
}

/// Running performance of one persona.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaPerformance {
    pub interactions: u64,
    pub accepted: u64,
    pub total_effectiveness: f64,
    pub dismissals: BTreeMap<DismissalReason, u64>,
}

impl PersonaPerformance {
    pub fn acceptance_rate(&self) -> f64 {
        if self.interactions == 0 {
            return 0.0;
        }
        self.accepted as f64 / self.interactions as f64
    }

    pub fn mean_effectiveness(&self) -> f64 {
        if self.interactions == 0 {
            return 0.0;
        }
        self.total_effectiveness / self.interactions as f64
    }

    /// Most common dismissal reasons, most frequent first.
    pub fn top_dismissals(&self, n: usize) -> Vec<(DismissalReason, u64)> {
        let mut reasons: Vec<_> = self.dismissals.iter().map(|(r, c)| (*r, *c)).collect();
        reasons.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        reasons.truncate(n);
        reasons
    }
}

/// Learning signals accumulated across sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningMetrics {
    pub total_interactions: u64,
    pub accepted: u64,
    pub persona_performance: BTreeMap<Persona, PersonaPerformance>,
    /// (count, summed effectiveness) per nudge type
    pub nudge_type_effectiveness: BTreeMap<NudgeType, (u64, f64)>,
}

impl LearningMetrics {
    fn record(&mut self, interaction: &Interaction) {
        self.total_interactions += 1;
        let perf = self
            .persona_performance
            .entry(interaction.persona)
            .or_default();
        perf.interactions += 1;
        perf.total_effectiveness += interaction.effectiveness_score;
        if interaction.outcome.accepted {
            self.accepted += 1;
            perf.accepted += 1;
        } else {
            *perf.dismissals.entry(interaction.outcome.reason()).or_default() += 1;
        }

        let entry = self
            .nudge_type_effectiveness
            .entry(interaction.nudge.nudge_type)
            .or_default();
        entry.0 += 1;
        entry.1 += interaction.effectiveness_score;
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.total_interactions == 0 {
            return 0.0;
        }
        self.accepted as f64 / self.total_interactions as f64
    }

    pub fn learning_status(&self) -> &'static str {
        match self.total_interactions {
            0 => "Starting",
            1..=10 => "Building",
            _ => "Active",
        }
    }
}

/// Counters for the current session only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub nudges_generated: u64,
    pub nudges_skipped: u64,
    pub interactions: u64,
    pub accepted: u64,
    pub total_productivity: f64,
    pub total_satisfaction: f64,
}

/// End-of-session figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub nudges_generated: u64,
    pub nudges_skipped: u64,
    pub interactions: u64,
    /// Percent
    pub acceptance_rate: f64,
    /// Percent, averaged over accepted nudges
    pub avg_productivity: f64,
    pub quarterly_roi: f64,
    pub meets_acceptance_target: bool,
    pub meets_productivity_target: bool,
    pub learning_status: String,
}

/// Persisted learning between sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningState {
    pub saved_at: DateTime<Utc>,
    pub global_threshold: f64,
    pub personas: PersonaBook,
    pub metrics: LearningMetrics,
    /// Timing in effect when saved; the config file stays authoritative
    pub timing: SmartTiming,
    #[serde(default)]
    pub adaptations: Vec<Adaptation>,
}

impl LearningState {
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::info!("Learning state saved to {}", path.display());
        Ok(())
    }

    /// Load saved state. Missing or unreadable files yield `None`.
    pub fn load(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Could not read learning state {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(
                    "Ignoring corrupt learning state {}: {e}",
                    path.display()
                );
                None
            }
        }
    }
}

/// Confidence that a nudge will land.
pub fn calculate_confidence(profile: &PersonaProfile, analysis: &Analysis, ctx: &UserContext) -> f64 {
    let mut confidence = 0.7;
    confidence += (profile.acceptance_rate - 0.5) * 0.3;
    confidence += (analysis.overall_urgency - 0.5) * 0.3;

    match ctx.flags.len() {
        0 => confidence -= 0.1,
        n if n > 2 => confidence += 0.1,
        _ => {}
    }

    if profile.persona == Persona::Analyst
        && (ctx.app_active.contains("Excel") || ctx.app_active.contains("PowerBI"))
    {
        confidence += 0.15;
    }

    confidence.clamp(0.1, 0.95)
}

/// Quality of one interaction in [0, 1]. Rejections score zero.
pub fn effectiveness_score(confidence: f64, outcome: &Outcome) -> f64 {
    if !outcome.accepted {
        return 0.0;
    }
    let confidence_weight = confidence * 0.3;
    let impact_weight = (outcome.productivity_impact + outcome.satisfaction_impact) * 0.5;
    let response_time = outcome.response_time_seconds.unwrap_or(30.0);
    let response_weight = (30.0 / response_time.max(1.0)).min(0.2);
    (confidence_weight + impact_weight + response_weight).clamp(0.0, 1.0)
}

/// The coaching engine.
pub struct Coach<R: Rng> {
    config: CoachConfig,
    timing: SmartTiming,
    personas: PersonaBook,
    templates: TemplateCatalog,
    selector: StrategySelector,
    global_threshold: f64,
    nudge_history: Vec<Nudge>,
    interactions: Vec<Interaction>,
    adaptations: Vec<Adaptation>,
    metrics: LearningMetrics,
    session: SessionMetrics,
    nudge_log: Option<NudgeLog>,
    rng: R,
}

impl<R: Rng> Coach<R> {
    pub fn new(config: &Config, rng: R) -> Self {
        Self {
            config: config.coach.clone(),
            timing: config.timing.clone(),
            personas: PersonaBook::default(),
            templates: TemplateCatalog::default(),
            selector: StrategySelector::default(),
            global_threshold: config.coach.confidence_threshold,
            nudge_history: Vec::new(),
            interactions: Vec::new(),
            adaptations: Vec::new(),
            metrics: LearningMetrics::default(),
            session: SessionMetrics::default(),
            nudge_log: None,
            rng,
        }
    }

    /// Also append every generated nudge to a generation log.
    pub fn with_nudge_log(mut self, log: NudgeLog) -> Self {
        self.nudge_log = Some(log);
        self
    }

    pub fn personas(&self) -> &PersonaBook {
        &self.personas
    }

    pub fn personas_mut(&mut self) -> &mut PersonaBook {
        &mut self.personas
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    pub fn global_threshold(&self) -> f64 {
        self.global_threshold
    }

    pub fn nudge_history(&self) -> &[Nudge] {
        &self.nudge_history
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn adaptations(&self) -> &[Adaptation] {
        &self.adaptations
    }

    pub fn metrics(&self) -> &LearningMetrics {
        &self.metrics
    }

    pub fn session(&self) -> &SessionMetrics {
        &self.session
    }

    /// Confidence bar for a persona.
    pub fn threshold_for(&self, persona: Persona) -> f64 {
        self.personas
            .get(persona)
            .confidence_override
            .unwrap_or(self.global_threshold)
    }

    /// Snapshot the learned state.
    pub fn learning_state(&self, now: DateTime<Utc>) -> LearningState {
        LearningState {
            saved_at: now,
            global_threshold: self.global_threshold,
            personas: self.personas.clone(),
            metrics: self.metrics.clone(),
            timing: self.timing.clone(),
            adaptations: self.adaptations.clone(),
        }
    }

    /// Resume from saved state. Timing stays as configured.
    pub fn restore(&mut self, state: LearningState) {
        self.global_threshold = state.global_threshold;
        self.personas.merge(state.personas);
        self.metrics = state.metrics;
        self.adaptations = state.adaptations;
    }

    /// Gate a nudge before any content work is done.
    pub fn should_send(
        &self,
        user_id: u64,
        persona: Persona,
        ctx: &UserContext,
        now: DateTime<Utc>,
    ) -> std::result::Result<(), SkipReason> {
        let profile = self.personas.get(persona);

        self.timing
            .check(profile, ctx)
            .map_err(|block| SkipReason::Timing { block })?;

        if let Some(last) = self.nudge_history.iter().rev().find(|n| n.user_id == user_id) {
            let minutes_since = (now - last.timestamp).num_minutes();
            if minutes_since < profile.nudge_interval_minutes as i64 {
                return Err(SkipReason::TooSoon {
                    minutes_since,
                    interval_minutes: profile.nudge_interval_minutes,
                });
            }
        }

        let rejected = self
            .interactions
            .iter()
            .rev()
            .filter(|i| i.user_id == user_id)
            .take(self.config.dismissal_window)
            .filter(|i| !i.outcome.accepted)
            .count();
        if profile.dismissal_sensitivity > 0 && rejected >= profile.dismissal_sensitivity {
            return Err(SkipReason::RecentDismissals { rejected });
        }

        let today = now.date_naive();
        let sent_today = self
            .nudge_history
            .iter()
            .filter(|n| n.user_id == user_id && n.timestamp.date_naive() == today)
            .count();
        if sent_today >= profile.daily_limit as usize {
            return Err(SkipReason::DailyLimit {
                limit: profile.daily_limit,
            });
        }

        if profile.flow_protection && self.timing.flow_state_detection && timing::is_in_flow(ctx) {
            return Err(SkipReason::InFlow);
        }

        Ok(())
    }

    /// Run the full pipeline for one context.
    pub fn coach(
        &mut self,
        user_id: u64,
        persona: Persona,
        ctx: &UserContext,
        now: DateTime<Utc>,
    ) -> CoachDecision {
        match self.build_nudge(user_id, persona, ctx, now) {
            Ok(nudge) => {
                self.session.nudges_generated += 1;
                if let Some(log) = &self.nudge_log {
                    let entry = NudgeLogEntry {
                        timestamp: now,
                        user_id,
                        persona,
                        nudge: nudge.clone(),
                        context_flags: ctx.flags.iter().copied().collect(),
                        confidence_threshold_used: self.threshold_for(persona),
                    };
                    if let Err(e) = log.append(&entry) {
                        tracing::warn!("Failed to write nudge log: {e}");
                    }
                }
                self.nudge_history.push(nudge.clone());
                CoachDecision::Nudge(Box::new(nudge))
            }
            Err(reason) => {
                self.session.nudges_skipped += 1;
                tracing::debug!(user_id, persona = %persona, "nudge skipped: {reason}");
                CoachDecision::Skipped(reason)
            }
        }
    }

    fn build_nudge(
        &mut self,
        user_id: u64,
        persona: Persona,
        ctx: &UserContext,
        now: DateTime<Utc>,
    ) -> std::result::Result<Nudge, SkipReason> {
        self.should_send(user_id, persona, ctx, now)?;

        let analysis = scoring::analyze(ctx);
        let (dimension, urgency) = analysis
            .most_urgent()
            .map(|d| (d.dimension, d.urgency))
            .unwrap_or((Dimension::Focus, 0.0));
        if urgency < self.config.urgency_floor {
            return Err(SkipReason::NotUrgent { urgency });
        }

        let profile = self.personas.get(persona);
        let base = match self.templates.specialized_text(persona, ctx, &mut self.rng) {
            Some(text) => text,
            None => self.templates.render_dimension_text(dimension, &analysis, ctx),
        };
        let text = self
            .templates
            .apply_tone(profile.language_style, &base, ctx, &mut self.rng);

        let confidence = calculate_confidence(profile, &analysis, ctx);
        let threshold = profile.confidence_override.unwrap_or(self.global_threshold);
        if confidence < threshold {
            return Err(SkipReason::LowConfidence {
                confidence,
                threshold,
            });
        }

        let mut expected_outcome = templates::expected_outcome(dimension).to_string();
        let app = ctx.app_active.as_str();
        match persona {
            Persona::Analyst if app.contains("Excel") || app.contains("PowerBI") => {
                expected_outcome.push_str(" with specialized tool optimization");
            }
            Persona::Developer if app.contains("VSCode") => {
                expected_outcome.push_str(" through development environment optimization");
            }
            _ => {}
        }

        let scores = scoring::signal_scores(ctx, &analysis);
        let strategy = self.selector.select(ctx, &scores);
        let intervention = self.templates.assemble(strategy, ctx, None);

        Ok(Nudge {
            id: Uuid::new_v4(),
            user_id,
            persona,
            text,
            nudge_type: dimension.nudge_type(),
            strategy,
            trigger_dimension: dimension,
            confidence,
            urgency_score: urgency,
            expected_outcome,
            trigger_reason: templates::trigger_reason(ctx),
            snooze_options: SNOOZE_OPTIONS.iter().map(|s| s.to_string()).collect(),
            action_steps: intervention.action_steps,
            follow_up: intervention.follow_up,
            timestamp: now,
        })
    }

    /// Feed a user response back into the engine.
    pub fn record_interaction(
        &mut self,
        user_id: u64,
        persona: Persona,
        nudge: &Nudge,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> Interaction {
        let effectiveness = effectiveness_score(nudge.confidence, &outcome);
        let interaction = Interaction {
            timestamp: now,
            user_id,
            persona,
            nudge: NudgeRecord::from(nudge),
            outcome,
            effectiveness_score: effectiveness,
        };

        self.metrics.record(&interaction);
        self.session.interactions += 1;
        if interaction.outcome.accepted {
            self.session.accepted += 1;
            self.session.total_productivity += interaction.outcome.productivity_impact;
            self.session.total_satisfaction += interaction.outcome.satisfaction_impact;
        }
        self.adapt(&interaction, now.hour() as u8);
        self.interactions.push(interaction.clone());
        interaction
    }

    fn adapt(&mut self, interaction: &Interaction, hour: u8) {
        let persona = interaction.persona;
        let cfg = &self.config;
        let global = self.global_threshold;
        let profile = self.personas.get_mut(persona);
        let current_threshold = profile.confidence_override.unwrap_or(global);

        let change = if interaction.outcome.accepted {
            if interaction.effectiveness_score > cfg.reinforce_effectiveness
                && current_threshold > cfg.min_confidence_override
            {
                let new = (current_threshold - cfg.confidence_step_down).max(cfg.min_confidence_override);
                profile.confidence_override = Some(new);
                Some(AdaptationChange::ConfidenceThreshold {
                    old: current_threshold,
                    new,
                })
            } else {
                None
            }
        } else {
            match interaction.outcome.reason() {
                DismissalReason::TooFrequent => {
                    let old = profile.nudge_interval_minutes;
                    let new = (old + cfg.interval_step_minutes).min(cfg.max_interval_minutes);
                    (new != old).then(|| {
                        profile.nudge_interval_minutes = new;
                        AdaptationChange::NudgeInterval { old, new }
                    })
                }
                DismissalReason::Busy => (!profile.avoid_hours.contains(&hour)).then(|| {
                    profile.avoid_hours.push(hour);
                    profile.avoid_hours.sort_unstable();
                    AdaptationChange::AvoidHour { hour }
                }),
                DismissalReason::NotRelevant | DismissalReason::Unclear => {
                    let new = (current_threshold + cfg.confidence_step_up).min(cfg.max_confidence_override);
                    (new > current_threshold).then(|| {
                        profile.confidence_override = Some(new);
                        AdaptationChange::ConfidenceThreshold {
                            old: current_threshold,
                            new,
                        }
                    })
                }
                _ => None,
            }
        };

        if let Some(change) = change {
            tracing::info!("Adapted {persona}: {change}");
            self.adaptations.push(Adaptation {
                persona,
                change,
                timestamp: interaction.timestamp,
            });
        }
    }

    /// Nudge the global threshold toward recent session performance.
    ///
    /// Returns the new threshold when it changed.
    pub fn mid_session_update(&mut self) -> Option<f64> {
        let window = self.config.session_window.max(1);
        let recent: Vec<&Interaction> = self.interactions.iter().rev().take(window).collect();
        if recent.is_empty() {
            return None;
        }
        let acceptance =
            recent.iter().filter(|i| i.outcome.accepted).count() as f64 / recent.len() as f64;

        let old = self.global_threshold;
        let new = if acceptance < 0.5 {
            (old - self.config.session_step).max(self.config.session_threshold_min)
        } else if acceptance > 0.9 {
            (old + self.config.session_step).min(self.config.session_threshold_max)
        } else {
            old
        };

        tracing::debug!("Mid-session check: {:.1}% acceptance", acceptance * 100.0);
        if (new - old).abs() < f64::EPSILON {
            return None;
        }
        tracing::info!("Global confidence threshold {old:.2} -> {new:.2}");
        self.global_threshold = new;
        Some(new)
    }

    /// Figures for the current session.
    pub fn session_summary(&self, report: &ReportConfig) -> SessionSummary {
        let s = &self.session;
        let acceptance_rate = if s.interactions == 0 {
            0.0
        } else {
            s.accepted as f64 / s.interactions as f64 * 100.0
        };
        let avg_productivity = if s.accepted == 0 {
            0.0
        } else {
            s.total_productivity / s.accepted as f64 * 100.0
        };
        SessionSummary {
            nudges_generated: s.nudges_generated,
            nudges_skipped: s.nudges_skipped,
            interactions: s.interactions,
            acceptance_rate,
            avg_productivity,
            quarterly_roi: s.total_productivity * report.roi_multiplier(),
            meets_acceptance_target: acceptance_rate > report.acceptance_target,
            meets_productivity_target: avg_productivity > report.productivity_target,
            learning_status: self.metrics.learning_status().to_string(),
        }
    }
}
