//! Context-scored strategy selection.
//!
//! The selector walks an ordered rule table and returns the strategy of the
//! first rule whose condition holds. Declaration order is the tie-break:
//! safety rules (overload, exhaustion) sit above opportunity rules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::{ContextFlag, UserContext};
use crate::scoring::SignalScores;

/// Reporting category of a nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeType {
    Focus,
    Wellbeing,
    ValueCreation,
    Productivity,
}

impl NudgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NudgeType::Focus => "focus",
            NudgeType::Wellbeing => "wellbeing",
            NudgeType::ValueCreation => "value_creation",
            NudgeType::Productivity => "productivity",
        }
    }
}

impl fmt::Display for NudgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intervention strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Step away and reset an overloaded or exhausted state
    Recovery,
    /// Take an overdue break
    BreakReminder,
    /// Protect a high-energy window for demanding work
    DeepFocus,
    /// Cut the sources of distraction
    DistractionShield,
    /// Reserve calendar time for core work
    TimeBlocking,
    /// Reconnect with goals when energy dips
    Motivation,
    /// Anchor a new routine while the user is receptive
    HabitFormation,
    /// Leave the user alone
    Maintain,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Recovery => "recovery",
            Strategy::BreakReminder => "break_reminder",
            Strategy::DeepFocus => "deep_focus",
            Strategy::DistractionShield => "distraction_shield",
            Strategy::TimeBlocking => "time_blocking",
            Strategy::Motivation => "motivation",
            Strategy::HabitFormation => "habit_formation",
            Strategy::Maintain => "maintain",
        }
    }

    pub fn nudge_type(&self) -> NudgeType {
        match self {
            Strategy::Recovery | Strategy::BreakReminder => NudgeType::Wellbeing,
            Strategy::DeepFocus | Strategy::DistractionShield => NudgeType::Focus,
            Strategy::TimeBlocking | Strategy::HabitFormation => NudgeType::Productivity,
            Strategy::Motivation | Strategy::Maintain => NudgeType::ValueCreation,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition half of a selection rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    CognitiveLoadAbove { threshold: f64 },
    Exhausted { stress_above: f64, energy_below: f64 },
    BreakOverdue { focus_minutes_above: u32 },
    AttentionBelow { threshold: f64 },
    Energized { energy_above: f64, load_below: f64 },
    Flag { flag: ContextFlag },
    ReceptivityBelow { threshold: f64 },
    GoalsWithLowEnergy { energy_below: f64 },
    ReceptivityAbove { threshold: f64 },
    Always,
}

impl Condition {
    pub fn matches(&self, ctx: &UserContext, scores: &SignalScores) -> bool {
        match *self {
            Condition::CognitiveLoadAbove { threshold } => scores.cognitive_load > threshold,
            Condition::Exhausted {
                stress_above,
                energy_below,
            } => ctx.stress_level > stress_above && ctx.energy_level < energy_below,
            Condition::BreakOverdue {
                focus_minutes_above,
            } => {
                ctx.has_flag(ContextFlag::NoBreaks) && ctx.focus_duration_min > focus_minutes_above
            }
            Condition::AttentionBelow { threshold } => ctx.attention_level < threshold,
            Condition::Energized {
                energy_above,
                load_below,
            } => ctx.energy_level > energy_above && scores.cognitive_load < load_below,
            Condition::Flag { flag } => ctx.has_flag(flag),
            Condition::ReceptivityBelow { threshold } => scores.receptivity < threshold,
            Condition::GoalsWithLowEnergy { energy_below } => {
                !ctx.goals.is_empty() && ctx.energy_level < energy_below
            }
            Condition::ReceptivityAbove { threshold } => scores.receptivity > threshold,
            Condition::Always => true,
        }
    }
}

/// One row of the selection table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRule {
    pub condition: Condition,
    pub strategy: Strategy,
}

/// First-match-wins strategy selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySelector {
    rules: Vec<SelectionRule>,
}

impl Default for StrategySelector {
    fn default() -> Self {
        use Condition::*;
        let rules = vec![
            (CognitiveLoadAbove { threshold: 0.8 }, Strategy::Recovery),
            (
                Exhausted {
                    stress_above: 0.7,
                    energy_below: 0.3,
                },
                Strategy::Recovery,
            ),
            (
                BreakOverdue {
                    focus_minutes_above: 90,
                },
                Strategy::BreakReminder,
            ),
            (AttentionBelow { threshold: 0.3 }, Strategy::DistractionShield),
            (
                Energized {
                    energy_above: 0.7,
                    load_below: 0.3,
                },
                Strategy::DeepFocus,
            ),
            (
                Flag {
                    flag: ContextFlag::LowCoreWork,
                },
                Strategy::TimeBlocking,
            ),
            (ReceptivityBelow { threshold: 0.3 }, Strategy::Maintain),
            (GoalsWithLowEnergy { energy_below: 0.5 }, Strategy::Motivation),
            (ReceptivityAbove { threshold: 0.6 }, Strategy::HabitFormation),
        ];

        Self::with_rules(
            rules
                .into_iter()
                .map(|(condition, strategy)| SelectionRule {
                    condition,
                    strategy,
                })
                .collect(),
        )
    }
}

impl StrategySelector {
    /// Build a selector from custom rules. Falls back to `Maintain` when no
    /// rule matches.
    pub fn with_rules(rules: Vec<SelectionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[SelectionRule] {
        &self.rules
    }

    pub fn select(&self, ctx: &UserContext, scores: &SignalScores) -> Strategy {
        self.rules
            .iter()
            .find(|rule| rule.condition.matches(ctx, scores))
            .map(|rule| rule.strategy)
            .unwrap_or(Strategy::Maintain)
    }
}
