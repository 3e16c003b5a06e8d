//! Simulated users.
//!
//! [`UserOutcomeSimulator`] decides how a user responds to a nudge and
//! [`TelemetryGenerator`] produces plausible activity rows to coach on.
//! Both draw from an injected RNG so seeded runs are reproducible.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::coach::Nudge;
use crate::context::{ContextFlag, TelemetrySample, UserContext};
use crate::interaction::{DismissalReason, Outcome};
use crate::persona::{Persona, PersonaBook};
use crate::selector::NudgeType;

/// Situational factors that shift acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SituationTag {
    HighFocusSession,
    MultipleInterruptions,
    EndOfDay,
    MeetingHeavyDay,
    DeadlinePressure,
    MondayMorning,
    FridayAfternoon,
}

impl SituationTag {
    pub fn acceptance_modifier(&self) -> f64 {
        match self {
            SituationTag::HighFocusSession => -0.25,
            SituationTag::MultipleInterruptions => 0.35,
            SituationTag::EndOfDay => -0.15,
            SituationTag::MeetingHeavyDay => 0.25,
            SituationTag::DeadlinePressure => 0.20,
            SituationTag::MondayMorning => -0.10,
            SituationTag::FridayAfternoon => -0.20,
        }
    }
}

/// Derive situation tags from a context and the wall-clock moment.
pub fn situation_tags(ctx: &UserContext, now: DateTime<Utc>) -> Vec<SituationTag> {
    let mut tags = Vec::new();
    if ctx.has_flag(ContextFlag::GoodFocus) {
        tags.push(SituationTag::HighFocusSession);
    }
    if ctx.has_flag(ContextFlag::HighInterruptions) {
        tags.push(SituationTag::MultipleInterruptions);
    }
    if ctx.has_flag(ContextFlag::EndOfDay) {
        tags.push(SituationTag::EndOfDay);
    }
    if ctx.has_flag(ContextFlag::MeetingHeavyDay) {
        tags.push(SituationTag::MeetingHeavyDay);
    }
    if ctx.stress_level > 0.7 {
        tags.push(SituationTag::DeadlinePressure);
    }
    match now.weekday() {
        Weekday::Mon if now.hour() < 12 => tags.push(SituationTag::MondayMorning),
        Weekday::Fri if now.hour() >= 12 => tags.push(SituationTag::FridayAfternoon),
        _ => {}
    }
    tags
}

/// Fatigue snapshot for one simulated user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub fatigue_level: f64,
    pub receptiveness: f64,
}

/// Projected effect of a coaching period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LongTermImpact {
    pub productivity_improvement: f64,
    pub satisfaction_improvement: f64,
    pub behavior_change_score: f64,
    pub sustained_adoption_probability: f64,
}

fn base_acceptance(persona: Persona) -> f64 {
    match persona {
        Persona::Developer => 0.72,
        Persona::Analyst => 0.68,
        Persona::Manager => 0.45,
        Persona::Designer => 0.75,
        Persona::CustomerSupport => 0.70,
    }
}

/// (productivity lift, satisfaction lift)
fn effectiveness(persona: Persona, nudge_type: NudgeType) -> (f64, f64) {
    use NudgeType::*;
    match (persona, nudge_type) {
        (Persona::Developer, Focus) => (0.18, 0.12),
        (Persona::Developer, Wellbeing) => (0.08, 0.15),
        (Persona::Developer, ValueCreation) => (0.15, 0.10),
        (Persona::Analyst, Focus) => (0.15, 0.10),
        (Persona::Analyst, Wellbeing) => (0.06, 0.18),
        (Persona::Analyst, ValueCreation) => (0.12, 0.12),
        (Persona::Manager, Focus) => (0.10, 0.08),
        (Persona::Manager, Wellbeing) => (0.05, 0.20),
        (Persona::Manager, ValueCreation) => (0.08, 0.15),
        (Persona::Designer, Focus) => (0.20, 0.15),
        (Persona::Designer, Wellbeing) => (0.10, 0.22),
        (Persona::Designer, ValueCreation) => (0.12, 0.10),
        _ => (0.08, 0.10),
    }
}

fn response_time_range(persona: Persona) -> (f64, f64) {
    match persona {
        Persona::Developer => (5.0, 30.0),
        Persona::Analyst => (10.0, 45.0),
        Persona::Manager => (2.0, 20.0),
        Persona::Designer => (15.0, 60.0),
        Persona::CustomerSupport => (5.0, 30.0),
    }
}

fn positive_feedback(nudge_type: NudgeType) -> &'static [&'static str] {
    match nudge_type {
        NudgeType::Focus => &[
            "Good reminder, closing tabs now",
            "Needed that push to focus",
            "Perfect timing, entering deep work",
        ],
        NudgeType::Wellbeing => &[
            "Thanks, taking that break",
            "Good catch on the long streak",
            "Stretching now, appreciate it",
        ],
        NudgeType::ValueCreation => &[
            "Will block time for important work",
            "Good point about automation",
            "Restructuring my priorities",
        ],
        NudgeType::Productivity => &["Helpful suggestion"],
    }
}

fn negative_feedback(reason: DismissalReason) -> &'static [&'static str] {
    match reason {
        DismissalReason::Busy => &[
            "In the middle of something",
            "Can't break focus right now",
            "Not now",
        ],
        DismissalReason::NotRelevant => &[
            "Doesn't apply to my current task",
            "Not helpful for what I'm doing",
            "Misunderstood my situation",
        ],
        DismissalReason::TooFrequent => &[
            "Too many interruptions today",
            "Getting these too often",
            "Need fewer nudges",
        ],
        DismissalReason::Unclear => &[
            "Not sure what you mean",
            "Suggestion unclear",
            "What specifically should I do?",
        ],
        _ => &["Not helpful"],
    }
}

/// Quality adjustment for nudge wording.
pub fn nudge_quality(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let mut quality = 0.0;
    if ["tabs", "minutes", "hours", "%"].iter().any(|m| text.contains(m)) {
        quality += 0.05;
    }
    if ["want to", "how about", "ready for"].iter().any(|p| lower.contains(p)) {
        quality += 0.05;
    }
    if ["close", "block", "schedule", "try", "take", "stretch"]
        .iter()
        .any(|w| lower.contains(w))
    {
        quality += 0.05;
    }
    if ["take a break", "be more productive", "focus better"]
        .iter()
        .any(|p| lower.contains(p))
    {
        quality -= 0.05;
    }
    quality
}

/// Decides how simulated users respond to nudges.
pub struct UserOutcomeSimulator<R: Rng> {
    personas: PersonaBook,
    fatigue: HashMap<u64, f64>,
    rng: R,
}

impl<R: Rng> UserOutcomeSimulator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            personas: PersonaBook::default(),
            fatigue: HashMap::new(),
            rng,
        }
    }

    /// Draw dismissal reasons from these profiles instead of the defaults.
    pub fn with_personas(mut self, personas: PersonaBook) -> Self {
        self.personas = personas;
        self
    }

    /// Probability in [0.1, 0.9] that a nudge is accepted.
    pub fn acceptance_probability(&self, nudge: &Nudge, tags: &[SituationTag]) -> f64 {
        let situational: f64 = tags.iter().map(SituationTag::acceptance_modifier).sum();
        let confidence = (nudge.confidence - 0.5) * 0.3;
        let fatigue = -0.1 * self.fatigue.get(&nudge.user_id).copied().unwrap_or(0.0);
        let p = base_acceptance(nudge.persona)
            + situational
            + confidence
            + fatigue
            + nudge_quality(&nudge.text);
        p.clamp(0.1, 0.9)
    }

    /// Simulate one user response.
    pub fn simulate(&mut self, nudge: &Nudge, tags: &[SituationTag]) -> Outcome {
        let p = self.acceptance_probability(nudge, tags);
        if self.rng.gen::<f64>() < p {
            self.accept(nudge)
        } else {
            self.reject(nudge, tags)
        }
    }

    fn accept(&mut self, nudge: &Nudge) -> Outcome {
        let (productivity, satisfaction) = effectiveness(nudge.persona, nudge.nudge_type);
        let productivity = productivity * self.rng.gen_range(0.7..=1.3);
        let satisfaction = satisfaction * self.rng.gen_range(0.8..=1.2);
        let (lo, hi) = response_time_range(nudge.persona);
        let response_time = self.rng.gen_range(lo..=hi);
        let feedback = positive_feedback(nudge.nudge_type)
            .choose(&mut self.rng)
            .copied()
            .unwrap_or("Helpful suggestion");

        let mut outcome = Outcome::accepted(productivity, satisfaction)
            .with_response_time(response_time)
            .with_feedback(feedback);
        outcome.follow_through_probability = Some((0.7 + (nudge.confidence - 0.5) * 0.4).min(0.95));
        outcome
    }

    fn reject(&mut self, nudge: &Nudge, tags: &[SituationTag]) -> Outcome {
        let reason = self.dismissal_reason(nudge.persona, tags);
        *self.fatigue.entry(nudge.user_id).or_insert(0.0) += 0.2;
        let response_time = self.rng.gen_range(0.5..=3.0);
        let feedback = negative_feedback(reason)
            .choose(&mut self.rng)
            .copied()
            .unwrap_or("Not helpful");
        Outcome::dismissed(reason)
            .with_response_time(response_time)
            .with_feedback(feedback)
    }

    /// Pick from the persona's usual dismissals, leaning towards "busy" in
    /// deep focus and "not relevant" late in the day.
    fn dismissal_reason(&mut self, persona: Persona, tags: &[SituationTag]) -> DismissalReason {
        let common = &self.personas.get(persona).common_dismissals;
        if !common.is_empty() {
            let focused = tags.contains(&SituationTag::HighFocusSession);
            let late = tags.contains(&SituationTag::EndOfDay);
            return common
                .choose_weighted(&mut self.rng, |reason| match reason {
                    DismissalReason::Busy if focused => 2.0,
                    DismissalReason::NotRelevant if late => 2.0,
                    _ => 1.0,
                })
                .copied()
                .unwrap_or(DismissalReason::Busy);
        }

        let mut weights = [
            (DismissalReason::Busy, 0.4),
            (DismissalReason::NotRelevant, 0.25),
            (DismissalReason::TooFrequent, 0.20),
            (DismissalReason::Unclear, 0.15),
        ];
        if tags.contains(&SituationTag::HighFocusSession) {
            weights[0].1 = 0.7;
        } else if tags.contains(&SituationTag::EndOfDay) {
            weights[1].1 = 0.5;
        }
        weights
            .choose_weighted(&mut self.rng, |(_, w)| *w)
            .map(|(reason, _)| *reason)
            .unwrap_or(DismissalReason::Busy)
    }

    /// New day for a user.
    pub fn reset_fatigue(&mut self, user_id: u64) {
        self.fatigue.insert(user_id, 0.0);
    }

    pub fn user_stats(&self, user_id: u64) -> UserStats {
        let fatigue_level = self.fatigue.get(&user_id).copied().unwrap_or(0.0);
        UserStats {
            fatigue_level,
            receptiveness: 1.0 - fatigue_level * 0.2,
        }
    }
}

/// Diminishing-returns projection over `days` of coaching.
pub fn long_term_impact(outcomes: &[Outcome], days: u32) -> LongTermImpact {
    let accepted: Vec<&Outcome> = outcomes.iter().filter(|o| o.accepted).collect();
    if accepted.is_empty() {
        return LongTermImpact {
            productivity_improvement: 0.0,
            satisfaction_improvement: 0.0,
            behavior_change_score: 0.0,
            sustained_adoption_probability: 0.0,
        };
    }

    let period = days as f64 / 30.0;
    let total_productivity: f64 = accepted.iter().map(|o| o.productivity_impact).sum();
    let total_satisfaction: f64 = accepted.iter().map(|o| o.satisfaction_impact).sum();
    let per_day = accepted.len() as f64 / days.max(1) as f64;
    let behavior_change_score = (per_day * 0.15).min(1.0);

    LongTermImpact {
        productivity_improvement: (total_productivity * (1.0 - 0.3 * period)).max(0.0),
        satisfaction_improvement: (total_satisfaction * (1.0 - 0.2 * period)).max(0.0),
        behavior_change_score,
        sustained_adoption_probability: 0.65 + behavior_change_score * 0.25,
    }
}

struct PersonaActivity {
    persona: Persona,
    weight: f64,
    apps: &'static [&'static str],
    load_range: (f64, f64),
    categories: &'static [&'static str],
}

static ACTIVITY: [PersonaActivity; 5] = [
    PersonaActivity {
        persona: Persona::CustomerSupport,
        weight: 0.20,
        apps: &["CRM", "Email", "Chat", "Phone", "Knowledge Base"],
        load_range: (0.4, 0.8),
        categories: &["support", "communication"],
    },
    PersonaActivity {
        persona: Persona::Analyst,
        weight: 0.30,
        apps: &["Excel", "PowerBI", "SQL", "Python", "Tableau"],
        load_range: (0.6, 0.9),
        categories: &["analysis", "reporting", "communication"],
    },
    PersonaActivity {
        persona: Persona::Developer,
        weight: 0.25,
        apps: &["VSCode", "Terminal", "Browser", "Git", "Docker"],
        load_range: (0.7, 0.95),
        categories: &["coding", "review", "communication"],
    },
    PersonaActivity {
        persona: Persona::Designer,
        weight: 0.10,
        apps: &["Figma", "Photoshop", "Sketch", "Browser", "Slack"],
        load_range: (0.5, 0.8),
        categories: &["design", "research", "communication"],
    },
    PersonaActivity {
        persona: Persona::Manager,
        weight: 0.15,
        apps: &["Outlook", "Teams", "Excel", "PowerPoint", "Calendar"],
        load_range: (0.5, 0.85),
        categories: &["planning", "meetings", "communication"],
    },
];

fn activity(persona: Persona) -> &'static PersonaActivity {
    ACTIVITY
        .iter()
        .find(|a| a.persona == persona)
        .unwrap_or(&ACTIVITY[0])
}

/// Seeded telemetry source for simulation sessions.
pub struct TelemetryGenerator {
    rng: Mcg128Xsl64,
}

impl TelemetryGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mcg128Xsl64::seed_from_u64(seed),
        }
    }

    /// Weighted persona draw.
    pub fn pick_persona(&mut self) -> Persona {
        ACTIVITY
            .choose_weighted(&mut self.rng, |a| a.weight)
            .map(|a| a.persona)
            .unwrap_or(Persona::Analyst)
    }

    /// One sample for a user at a moment.
    pub fn sample(&mut self, user_id: u64, persona: Persona, timestamp: DateTime<Utc>) -> TelemetrySample {
        let act = activity(persona);
        let rng = &mut self.rng;
        let cognitive_load = rng.gen_range(act.load_range.0..=act.load_range.1);
        let productivity_score = rng.gen_range(0.4..=0.9);
        let stress_baseline = rng.gen_range(0.2..=0.6);

        TelemetrySample {
            timestamp,
            user_id,
            persona_type: Some(persona.as_str().to_string()),
            tab_count: rng.gen_range(2..=15),
            window_switches_15min: rng.gen_range(0..=25),
            focus_session_duration: rng.gen_range(5..=120),
            cognitive_load_score: round3(cognitive_load),
            app_active: act.apps.choose(rng).copied().unwrap_or("Browser").to_string(),
            task_category: act
                .categories
                .choose(rng)
                .copied()
                .unwrap_or("communication")
                .to_string(),
            keystrokes_per_min: rng.gen_range(20..=100) as f64,
            break_duration_min: rng.gen_range(0..=30),
            interruption_count: rng.gen_range(0..=8),
            core_work_percentage: round3(rng.gen_range(0.2..=0.9)),
            value_score: round3(rng.gen_range(0.2..=0.8)),
            productivity_score: round3(productivity_score),
            meeting_duration_min: if persona == Persona::Manager {
                rng.gen_range(0..=90)
            } else {
                rng.gen_range(0..=30)
            },
            energy_level: Some(round3((productivity_score + rng.gen_range(-0.1..=0.1)).clamp(0.0, 1.0))),
            stress_level: Some(round3((stress_baseline + cognitive_load * 0.4).min(1.0))),
        }
    }

    /// `samples_per_user` rows per user at 15-minute steps from `start`.
    ///
    /// Users are numbered from 1 and keep one persona for the whole run.
    /// Rows are ordered by timestamp, then user.
    pub fn generate(
        &mut self,
        users: u64,
        samples_per_user: usize,
        start: DateTime<Utc>,
    ) -> Vec<TelemetrySample> {
        let personas: Vec<(u64, Persona)> = (1..=users).map(|id| (id, self.pick_persona())).collect();
        let mut samples = Vec::with_capacity(users as usize * samples_per_user);
        for step in 0..samples_per_user {
            let timestamp = start + Duration::minutes(15 * step as i64);
            for &(user_id, persona) in &personas {
                samples.push(self.sample(user_id, persona, timestamp));
            }
        }
        samples
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Dimension;
    use crate::selector::Strategy;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn nudge(persona: Persona, text: &str, confidence: f64) -> Nudge {
        Nudge {
            id: Uuid::new_v4(),
            user_id: 9,
            persona,
            text: text.to_string(),
            nudge_type: NudgeType::Focus,
            strategy: Strategy::DeepFocus,
            trigger_dimension: Dimension::Focus,
            confidence,
            urgency_score: 0.7,
            expected_outcome: String::new(),
            trigger_reason: String::new(),
            snooze_options: Vec::new(),
            action_steps: Vec::new(),
            follow_up: String::new(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 8, 10, 0, 0).unwrap(),
        }
    }

    fn sim(seed: u64) -> UserOutcomeSimulator<Mcg128Xsl64> {
        UserOutcomeSimulator::new(Mcg128Xsl64::seed_from_u64(seed))
    }

    #[test]
    fn quality_rewards_specific_polite_actions() {
        assert!((nudge_quality("Want to try closing 5 tabs?") - 0.15).abs() < 1e-9);
        assert!((nudge_quality("Maybe take a break") - 0.0).abs() < 1e-9);
        assert_eq!(nudge_quality("Hello"), 0.0);
    }

    #[test]
    fn acceptance_probability_combines_modifiers() {
        let s = sim(1);
        let n = nudge(Persona::Developer, "Hello", 0.5);
        assert!((s.acceptance_probability(&n, &[]) - 0.72).abs() < 1e-9);

        let p = s.acceptance_probability(&n, &[SituationTag::HighFocusSession]);
        assert!((p - 0.47).abs() < 1e-9);

        let capped = s.acceptance_probability(&n, &[SituationTag::MultipleInterruptions]);
        assert_eq!(capped, 0.9);

        let manager = nudge(Persona::Manager, "Hello", 0.5);
        let floor = s.acceptance_probability(
            &manager,
            &[SituationTag::HighFocusSession, SituationTag::FridayAfternoon],
        );
        assert_eq!(floor, 0.1);
    }

    #[test]
    fn accepted_outcomes_stay_in_table_ranges() {
        let mut s = sim(3);
        let n = nudge(Persona::Designer, "Want to try closing 5 tabs?", 0.9);
        let mut seen_accept = false;
        for _ in 0..50 {
            let outcome = s.simulate(&n, &[SituationTag::MeetingHeavyDay]);
            if outcome.accepted {
                seen_accept = true;
                assert!((0.14..=0.26).contains(&outcome.productivity_impact));
                assert!((0.12..=0.18).contains(&outcome.satisfaction_impact));
                let rt = outcome.response_time_seconds.unwrap();
                assert!((15.0..=60.0).contains(&rt));
                assert!((outcome.follow_through_probability.unwrap() - 0.86).abs() < 1e-9);
            }
        }
        assert!(seen_accept);
    }

    #[test]
    fn rejections_build_fatigue() {
        let mut s = sim(5);
        let n = nudge(Persona::Manager, "Hello", 0.1);
        let tags = [SituationTag::HighFocusSession, SituationTag::FridayAfternoon];
        let mut rejections = 0;
        for _ in 0..20 {
            let outcome = s.simulate(&n, &tags);
            if !outcome.accepted {
                rejections += 1;
                assert_eq!(outcome.productivity_impact, 0.0);
                assert_eq!(outcome.satisfaction_impact, -0.02);
                assert!(outcome.dismissal_reason.is_some());
            }
        }
        let stats = s.user_stats(9);
        assert!((stats.fatigue_level - 0.2 * rejections as f64).abs() < 1e-9);
        s.reset_fatigue(9);
        assert_eq!(s.user_stats(9).receptiveness, 1.0);
    }

    #[test]
    fn rejections_use_the_persona_dismissal_reasons() {
        let mut s = sim(8);
        let n = nudge(Persona::Developer, "Hello", 0.1);
        let tags = [SituationTag::HighFocusSession, SituationTag::FridayAfternoon];
        let listed = PersonaBook::default().get(Persona::Developer).common_dismissals.clone();
        let mut rejections = 0;
        for _ in 0..60 {
            let outcome = s.simulate(&n, &tags);
            if let Some(reason) = outcome.dismissal_reason {
                rejections += 1;
                assert!(listed.contains(&reason), "unexpected {reason:?}");
            }
        }
        assert!(rejections > 0);
    }

    #[test]
    fn learned_dismissals_replace_the_defaults() {
        let mut book = PersonaBook::default();
        book.get_mut(Persona::Analyst).common_dismissals = vec![DismissalReason::Unclear];
        let mut s = sim(12).with_personas(book);
        let n = nudge(Persona::Analyst, "Hello", 0.1);
        for _ in 0..40 {
            let outcome = s.simulate(&n, &[SituationTag::HighFocusSession]);
            if !outcome.accepted {
                assert_eq!(outcome.dismissal_reason, Some(DismissalReason::Unclear));
            }
        }
    }

    #[test]
    fn long_term_impact_applies_diminishing_returns() {
        let outcomes = vec![
            Outcome::accepted(0.1, 0.1),
            Outcome::accepted(0.2, 0.1),
            Outcome::dismissed(DismissalReason::Busy),
        ];
        let impact = long_term_impact(&outcomes, 30);
        assert!((impact.productivity_improvement - 0.21).abs() < 1e-9);
        assert!((impact.satisfaction_improvement - 0.16).abs() < 1e-9);
        assert!((impact.behavior_change_score - 0.01).abs() < 1e-9);

        let empty = long_term_impact(&[], 30);
        assert_eq!(empty.behavior_change_score, 0.0);
    }

    #[test]
    fn situation_tags_follow_context_and_calendar() {
        let ctx = UserContext::builder()
            .hour(10)
            .focus_duration(60)
            .interruptions(7)
            .stress_level(0.8)
            .build();
        let monday = Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap();
        let tags = situation_tags(&ctx, monday);
        assert!(tags.contains(&SituationTag::HighFocusSession));
        assert!(tags.contains(&SituationTag::MultipleInterruptions));
        assert!(tags.contains(&SituationTag::DeadlinePressure));
        assert!(tags.contains(&SituationTag::MondayMorning));
        assert!(!tags.contains(&SituationTag::FridayAfternoon));
    }

    #[test]
    fn generator_is_deterministic_per_seed() {
        let start = Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap();
        let a = TelemetryGenerator::new(42).generate(3, 4, start);
        let b = TelemetryGenerator::new(42).generate(3, 4, start);
        assert_eq!(a.len(), 12);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.user_id, y.user_id);
            assert_eq!(x.tab_count, y.tab_count);
            assert_eq!(x.app_active, y.app_active);
        }
        assert_eq!(a[3].timestamp, start + Duration::minutes(15));
        for s in &a {
            assert!((0.0..=1.0).contains(&s.cognitive_load_score));
            assert!(UserContext::from_samples(std::slice::from_ref(s)).unwrap().validate().is_ok());
        }
    }
}
