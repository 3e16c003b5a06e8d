//! Context scoring.
//!
//! Two layers of scores are produced from a [`UserContext`]:
//!
//! - [`SignalScores`]: the three headline signals (cognitive load,
//!   receptivity, urgency) consumed by the strategy selector.
//! - [`Analysis`]: one [`DimensionAnalysis`] per coaching dimension, each
//!   with a health score, an urgency score and human-readable findings.
//!
//! Every score is clamped to [0.0, 1.0].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::UserContext;
use crate::selector::NudgeType;

/// Coaching dimension that can trigger a nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Focus,
    Productivity,
    Wellbeing,
    ValueCreation,
    Automation,
    ContextSwitching,
    TimeManagement,
}

impl Dimension {
    /// Declared order; also the tie-break order for most-urgent selection.
    pub fn all() -> [Dimension; 7] {
        [
            Dimension::Focus,
            Dimension::Productivity,
            Dimension::Wellbeing,
            Dimension::ValueCreation,
            Dimension::Automation,
            Dimension::ContextSwitching,
            Dimension::TimeManagement,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Focus => "focus",
            Dimension::Productivity => "productivity",
            Dimension::Wellbeing => "wellbeing",
            Dimension::ValueCreation => "value_creation",
            Dimension::Automation => "automation",
            Dimension::ContextSwitching => "context_switching",
            Dimension::TimeManagement => "time_management",
        }
    }

    /// Nudge category a dimension reports under.
    pub fn nudge_type(&self) -> NudgeType {
        match self {
            Dimension::Focus | Dimension::ContextSwitching => NudgeType::Focus,
            Dimension::Wellbeing => NudgeType::Wellbeing,
            Dimension::ValueCreation | Dimension::Automation => NudgeType::ValueCreation,
            Dimension::Productivity | Dimension::TimeManagement => NudgeType::Productivity,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Headline signals for strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalScores {
    /// Combined cognitive load (0.0-1.0)
    pub cognitive_load: f64,
    /// Willingness to act on a nudge right now (0.0-1.0)
    pub receptivity: f64,
    /// How pressing an intervention is (0.0-1.0)
    pub urgency: f64,
}

/// Result of analysing one dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionAnalysis {
    pub dimension: Dimension,
    /// Health of the dimension (0.0-1.0, higher = better)
    pub score: f64,
    /// Need for intervention (0.0-1.0)
    pub urgency: f64,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    /// Automation opportunities; only populated for [`Dimension::Automation`]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opportunities: Vec<String>,
}

impl DimensionAnalysis {
    fn new(dimension: Dimension, score: f64) -> Self {
        let score = clamp_unit(score);
        Self {
            dimension,
            score,
            urgency: 1.0 - score,
            issues: Vec::new(),
            recommendations: Vec::new(),
            opportunities: Vec::new(),
        }
    }

    fn finding(&mut self, issue: String, recommendation: &str) {
        self.issues.push(issue);
        self.recommendations.push(recommendation.to_string());
    }
}

/// All dimension analyses for one context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub dimensions: Vec<DimensionAnalysis>,
    /// Mean urgency across dimensions (0.5 when nothing was analysed)
    pub overall_urgency: f64,
}

impl Analysis {
    /// Most urgent dimension; earlier dimensions win ties.
    pub fn most_urgent(&self) -> Option<&DimensionAnalysis> {
        self.dimensions.iter().fold(None, |best, d| match best {
            Some(b) if b.urgency >= d.urgency => Some(b),
            _ => Some(d),
        })
    }

    pub fn get(&self, dimension: Dimension) -> Option<&DimensionAnalysis> {
        self.dimensions.iter().find(|d| d.dimension == dimension)
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Combined cognitive load from task load, interruption and switching pressure.
pub fn cognitive_load(ctx: &UserContext) -> f64 {
    let interruption_pressure = (ctx.interruption_count as f64 / 10.0).min(1.0);
    let switching_pressure = (ctx.window_switches as f64 / 20.0).min(1.0);
    clamp_unit(mean(&[ctx.cognitive_load, interruption_pressure, switching_pressure]))
}

/// Receptivity from energy, stress and load.
pub fn receptivity(ctx: &UserContext, load: f64) -> f64 {
    clamp_unit(mean(&[ctx.energy_level, 1.0 - ctx.stress_level, 1.0 - load]))
}

/// Score the headline signals for a context.
pub fn signal_scores(ctx: &UserContext, analysis: &Analysis) -> SignalScores {
    let load = cognitive_load(ctx);
    SignalScores {
        cognitive_load: load,
        receptivity: receptivity(ctx, load),
        urgency: clamp_unit(analysis.overall_urgency),
    }
}

/// Analyse every dimension of a context.
pub fn analyze(ctx: &UserContext) -> Analysis {
    let dimensions = vec![
        analyze_focus(ctx),
        analyze_productivity(ctx),
        analyze_wellbeing(ctx),
        analyze_value_creation(ctx),
        analyze_automation(ctx),
        analyze_context_switching(ctx),
        analyze_time_management(ctx),
    ];

    let overall_urgency = if dimensions.is_empty() {
        0.5
    } else {
        mean(&dimensions.iter().map(|d| d.urgency).collect::<Vec<_>>())
    };

    Analysis {
        dimensions,
        overall_urgency,
    }
}

pub fn analyze_focus(ctx: &UserContext) -> DimensionAnalysis {
    // More switches = lower focus
    let score = (0.8 - ctx.window_switches as f64 / 20.0).clamp(0.1, 1.0);
    let mut a = DimensionAnalysis::new(Dimension::Focus, score);

    if ctx.tab_count > 5 {
        a.finding(
            format!("High tab count ({})", ctx.tab_count),
            "Close unused tabs or organize into workspaces",
        );
    }
    if ctx.window_switches > 10 {
        a.finding(
            format!("Frequent window switching ({})", ctx.window_switches),
            "Try focus mode or dedicated work blocks",
        );
    }
    if ctx.focus_duration_min < 15 {
        a.finding(
            format!("Short focus sessions ({}min)", ctx.focus_duration_min),
            "Set up 25-minute focused work periods",
        );
    }
    a
}

pub fn analyze_productivity(ctx: &UserContext) -> DimensionAnalysis {
    let score = ((ctx.keystrokes_per_min / 100.0) * 0.4 + ctx.value_score * 0.6).clamp(0.1, 1.0);
    let mut a = DimensionAnalysis::new(Dimension::Productivity, score);

    if ctx.core_work_ratio < 0.3 {
        a.finding(
            format!("Low core work time ({:.1}%)", ctx.core_work_ratio * 100.0),
            "Block time for core work activities",
        );
    }
    if ctx.interruption_count > 5 {
        a.finding(
            format!("High interruption count ({})", ctx.interruption_count),
            "Enable focus mode to reduce interruptions",
        );
    }
    a
}

pub fn analyze_wellbeing(ctx: &UserContext) -> DimensionAnalysis {
    let mut score = 1.0 - ctx.cognitive_load;
    if ctx.break_duration_min < 10 {
        score *= 0.8;
    }
    let mut a = DimensionAnalysis::new(Dimension::Wellbeing, score);

    if ctx.cognitive_load > 0.8 {
        a.finding("High cognitive load detected".into(), "Take a 5-minute break to reset");
    }
    if ctx.break_duration_min < 5 {
        a.finding("No breaks taken recently".into(), "Schedule regular 5-minute breaks");
    }
    a
}

pub fn analyze_value_creation(ctx: &UserContext) -> DimensionAnalysis {
    let mut a = DimensionAnalysis::new(Dimension::ValueCreation, ctx.value_score);

    if ctx.value_score < 0.4 {
        a.finding(
            format!("Low value creation score ({:.1})", ctx.value_score),
            "Focus on high-value activities",
        );
    }
    if ctx.task_category == "support" && ctx.core_work_ratio < 0.2 {
        a.finding(
            "Too much reactive support work".into(),
            "Batch support tasks into dedicated blocks",
        );
    }
    a
}

pub fn analyze_automation(ctx: &UserContext) -> DimensionAnalysis {
    let app = ctx.app_active.as_str();
    let mut potential: f64 = 0.3;
    let mut opportunities = Vec::new();

    if app.contains("Excel") && ctx.window_switches > 5 {
        opportunities.push("Excel keyboard shortcuts could reduce navigation time".to_string());
        potential += 0.3;
    }
    if app.contains("PowerBI") || app.contains("Power BI") {
        opportunities.push("PowerBI templates could save hours per week".to_string());
        potential += 0.4;
    }
    if ctx.tab_count > 6 {
        opportunities.push("Browser workspace organization could improve focus".to_string());
        potential += 0.2;
    }
    if app.contains("VSCode") || app.contains("Visual Studio") {
        opportunities
            .push("VSCode workspace optimization could reduce context switching".to_string());
        potential += 0.3;
    }

    let urgency = potential.min(1.0);
    DimensionAnalysis {
        dimension: Dimension::Automation,
        score: 1.0 - urgency,
        urgency,
        issues: Vec::new(),
        recommendations: opportunities.clone(),
        opportunities,
    }
}

pub fn analyze_context_switching(ctx: &UserContext) -> DimensionAnalysis {
    let score = (1.0 - ctx.window_switches as f64 / 15.0).max(0.1);
    let mut a = DimensionAnalysis::new(Dimension::ContextSwitching, score);

    if ctx.window_switches > 15 {
        a.issues.push("Excessive context switching detected".into());
    }
    if ctx.tab_count > 8 {
        a.issues.push("High tab count contributing to switching".into());
    }
    a
}

pub fn analyze_time_management(ctx: &UserContext) -> DimensionAnalysis {
    let mut a = DimensionAnalysis::new(Dimension::TimeManagement, ctx.core_work_ratio);

    if ctx.meeting_duration_min > 240 {
        a.issues.push("Meeting-heavy day detected".into());
    }
    if ctx.core_work_ratio < 0.3 {
        a.issues.push("Low core work percentage".into());
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn focus_score_drops_with_switching() {
        let calm = UserContext::builder().window_switches(0).build();
        let busy = UserContext::builder().window_switches(20).build();
        assert!((analyze_focus(&calm).score - 0.8).abs() < 1e-9);
        assert!((analyze_focus(&busy).score - 0.1).abs() < 1e-9);
        assert!((analyze_focus(&busy).urgency - 0.9).abs() < 1e-9);
    }

    #[test]
    fn wellbeing_penalizes_missing_breaks() {
        let ctx = UserContext::builder().cognitive_load(0.5).break_duration(0).build();
        let a = analyze_wellbeing(&ctx);
        assert!((a.score - 0.4).abs() < 1e-9);
        assert_eq!(a.issues, vec!["No breaks taken recently".to_string()]);
    }

    #[test]
    fn automation_accumulates_opportunities() {
        let ctx = UserContext::builder()
            .app_active("Excel + PowerBI")
            .window_switches(8)
            .tab_count(9)
            .build();
        let a = analyze_automation(&ctx);
        assert_eq!(a.opportunities.len(), 3);
        assert_eq!(a.urgency, 1.0);
        assert_eq!(a.score, 0.0);
    }

    #[test]
    fn most_urgent_prefers_earlier_dimension_on_tie() {
        let analysis = Analysis {
            dimensions: vec![
                DimensionAnalysis::new(Dimension::Focus, 0.2),
                DimensionAnalysis::new(Dimension::Wellbeing, 0.2),
            ],
            overall_urgency: 0.8,
        };
        assert_eq!(analysis.most_urgent().unwrap().dimension, Dimension::Focus);
    }

    #[test]
    fn overall_urgency_is_mean_of_dimensions() {
        let ctx = UserContext::builder().build();
        let analysis = analyze(&ctx);
        let expected: f64 =
            analysis.dimensions.iter().map(|d| d.urgency).sum::<f64>() / analysis.dimensions.len() as f64;
        assert!((analysis.overall_urgency - expected).abs() < 1e-12);
        assert_eq!(analysis.dimensions.len(), 7);
    }

    #[test]
    fn dimension_nudge_types() {
        assert_eq!(Dimension::ContextSwitching.nudge_type(), NudgeType::Focus);
        assert_eq!(Dimension::Automation.nudge_type(), NudgeType::ValueCreation);
        assert_eq!(Dimension::TimeManagement.nudge_type(), NudgeType::Productivity);
    }

    proptest! {
        #[test]
        fn all_scores_stay_in_unit_interval(
            load in -2.0f64..3.0,
            energy in -2.0f64..3.0,
            stress in -2.0f64..3.0,
            switches in 0u32..200,
            tabs in 0u32..100,
            interruptions in 0u32..100,
            kpm in 0.0f64..500.0,
            value in -1.0f64..2.0,
            core in -1.0f64..2.0,
            breaks in 0u32..120,
        ) {
            let ctx = UserContext::builder()
                .cognitive_load(load)
                .energy_level(energy)
                .stress_level(stress)
                .window_switches(switches)
                .tab_count(tabs)
                .interruptions(interruptions)
                .keystrokes_per_min(kpm)
                .value_score(value)
                .core_work_ratio(core)
                .break_duration(breaks)
                .build();
            let analysis = analyze(&ctx);
            for d in &analysis.dimensions {
                prop_assert!((0.0..=1.0).contains(&d.score), "{} score {}", d.dimension, d.score);
                prop_assert!((0.0..=1.0).contains(&d.urgency), "{} urgency {}", d.dimension, d.urgency);
            }
            let signals = signal_scores(&ctx, &analysis);
            prop_assert!((0.0..=1.0).contains(&signals.cognitive_load));
            prop_assert!((0.0..=1.0).contains(&signals.receptivity));
            prop_assert!((0.0..=1.0).contains(&signals.urgency));
        }
    }
}
