//! Nudge and intervention content.
//!
//! [`TemplateCatalog`] owns every piece of user-facing text: dimension nudge
//! templates, persona-specialised lines, tone vocabulary and the
//! multi-step strategy interventions. Placeholders use `{name}` syntax and
//! are always filled from the context before text leaves this module.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::context::{ContextFlag, UserContext};
use crate::persona::{CommunicationStyle, LanguageStyle, Persona, PersonalityType};
use crate::scoring::{Analysis, Dimension};
use crate::selector::{NudgeType, Strategy};

/// When an intervention should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    Now,
    NextBreak,
    InMinutes(u32),
}

impl std::fmt::Display for Timing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timing::Now => f.write_str("now"),
            Timing::NextBreak => f.write_str("at the next break"),
            Timing::InMinutes(m) => write!(f, "in {m} minutes"),
        }
    }
}

/// One concrete step of an intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStep {
    pub step: String,
    pub time_estimate_min: u32,
    pub success_metric: String,
}

/// Multi-step intervention built for a selected strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub strategy: Strategy,
    pub nudge_type: NudgeType,
    pub message: String,
    pub action_steps: Vec<ActionStep>,
    pub timing: Timing,
    pub follow_up: String,
}

/// Named nudge template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKey {
    HighSwitches,
    NoDeepWork,
    CognitiveOverload,
    TabManagement,
    LongStreak,
    NoBreaks,
    LateHours,
    CognitiveLoad,
    LowCoreWork,
    AutomationOpportunity,
    HighValueFocus,
    EmailBatching,
    WindowSwitching,
    InterruptionManagement,
    TimeBlocking,
}

impl TemplateKey {
    pub fn nudge_type(&self) -> NudgeType {
        use TemplateKey::*;
        match self {
            HighSwitches | NoDeepWork | CognitiveOverload | TabManagement => NudgeType::Focus,
            LongStreak | NoBreaks | LateHours | CognitiveLoad => NudgeType::Wellbeing,
            LowCoreWork | AutomationOpportunity | HighValueFocus | EmailBatching => {
                NudgeType::ValueCreation
            }
            WindowSwitching | InterruptionManagement | TimeBlocking => NudgeType::Productivity,
        }
    }
}

/// Strategy intervention before placeholder substitution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyTemplate {
    pub message: String,
    pub steps: Vec<ActionStep>,
    pub timing: Timing,
    pub follow_up: String,
}

/// Every text fragment the coach can emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateCatalog {
    pub nudges: BTreeMap<TemplateKey, String>,
    pub fallback: String,
    pub excel_shortcuts: Vec<String>,
    pub powerbi_templates: Vec<String>,
    pub data_focus: Vec<String>,
    pub vscode_optimizations: Vec<String>,
    pub consultative_prefixes: Vec<String>,
    pub avoid_words: Vec<String>,
    pub strategies: BTreeMap<String, StrategyTemplate>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn step(step: &str, minutes: u32, metric: &str) -> ActionStep {
    ActionStep {
        step: step.to_string(),
        time_estimate_min: minutes,
        success_metric: metric.to_string(),
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        use TemplateKey::*;

        let nudges = [
            (HighSwitches, "Lots of context switching detected. Want to try closing {tab_count} tabs for a focused sprint?"),
            (NoDeepWork, "It's been 2 hours without deep focus time. Ready for a distraction-free session?"),
            (CognitiveOverload, "Your cognitive load is peaking. How about a 5-minute break to reset?"),
            (TabManagement, "Want to try consolidating those {tab_count} browser tabs into 2-3? Research shows it could help you stay more focused."),
            (LongStreak, "You've been at it for {hours} hours straight. Time to stretch and hydrate?"),
            (NoBreaks, "No breaks detected today. A quick walk could boost your afternoon productivity."),
            (LateHours, "Working late again? Consider wrapping up to maintain tomorrow's performance."),
            (CognitiveLoad, "Want to try a 5-minute break to reset? Your cognitive load suggests it could help."),
            (LowCoreWork, "Only {core_percentage}% on core tasks today. Want to block time for important work?"),
            (AutomationOpportunity, "I notice repetitive tasks. Want to try automating {task_type}?"),
            (HighValueFocus, "Perfect time for high-value work. Want to try a focused 90-minute session?"),
            (EmailBatching, "Want to try email batching? Checking email just 3x daily could free up 90 minutes for your core work."),
            (WindowSwitching, "High window switching detected. Want to try focus mode for better flow?"),
            (InterruptionManagement, "Multiple interruptions detected. Want to try blocking focus time?"),
            (TimeBlocking, "Want to try time-blocking? Setting aside 30 minutes for {task_type} could help reduce context switching."),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect();

        let strategies = [
            (
                Strategy::Recovery,
                StrategyTemplate {
                    message: "You've been carrying a heavy load for {minutes} minutes. Step away and let your mind reset before the next push.".into(),
                    steps: vec![
                        step("Stand up and look away from the screen", 2, "Eyes off screen for two minutes"),
                        step("Take a short walk or stretch", 5, "Return feeling less tense"),
                        step("Write down the single next action before resuming", 3, "One clear next step on paper"),
                    ],
                    timing: Timing::Now,
                    follow_up: "Check in after 30 minutes to see whether load has dropped.".into(),
                },
            ),
            (
                Strategy::BreakReminder,
                StrategyTemplate {
                    message: "You've worked {minutes} minutes without a real break. A short pause now protects the rest of your afternoon.".into(),
                    steps: vec![
                        step("Save your work and note where you stopped", 1, "Resume point recorded"),
                        step("Take a 5-minute break away from the desk", 5, "Break logged"),
                        step("Hydrate before starting again", 1, "Glass of water finished"),
                    ],
                    timing: Timing::Now,
                    follow_up: "Remind again after the next 90-minute block.".into(),
                },
            ),
            (
                Strategy::DeepFocus,
                StrategyTemplate {
                    message: "Your energy is high and load is light. This is the window for your hardest {task_type} work.".into(),
                    steps: vec![
                        step("Close everything except the task at hand", 2, "Down to the essential windows"),
                        step("Silence notifications", 1, "Do-not-disturb enabled"),
                        step("Work one focused block on the most valuable task", 50, "Block completed without switching"),
                    ],
                    timing: Timing::Now,
                    follow_up: "Review what the block produced at its end.".into(),
                },
            ),
            (
                Strategy::DistractionShield,
                StrategyTemplate {
                    message: "{switches} window switches and {tab_count} open tabs are splitting your attention. Time to put a shield up.".into(),
                    steps: vec![
                        step("Close or park tabs unrelated to the current task", 3, "Five or fewer tabs open"),
                        step("Turn on focus mode for chat and mail", 1, "Notifications paused"),
                        step("Commit to one task for 25 minutes", 25, "No window switches during the session"),
                    ],
                    timing: Timing::Now,
                    follow_up: "Compare switch count in the next 15-minute window.".into(),
                },
            ),
            (
                Strategy::TimeBlocking,
                StrategyTemplate {
                    message: "Only {core_percentage}% of today went to core work. Reserve a block for it before the day fills up.".into(),
                    steps: vec![
                        step("Pick the one core task that matters most today", 2, "Task chosen"),
                        step("Block 90 minutes on the calendar for it", 3, "Calendar block created"),
                        step("Batch reactive work into a single later slot", 5, "Reactive work grouped"),
                    ],
                    timing: Timing::NextBreak,
                    follow_up: "Check core work share at the end of the day.".into(),
                },
            ),
            (
                Strategy::Motivation,
                StrategyTemplate {
                    message: "Energy is dipping. Reconnect with what you're working toward before picking the next {task_type} task.".into(),
                    steps: vec![
                        step("Re-read your goal for this week", 2, "Goal in view"),
                        step("Pick one small step that moves it forward", 3, "Step chosen"),
                        step("Finish that step before anything else", 20, "Step done"),
                    ],
                    timing: Timing::InMinutes(15),
                    follow_up: "Celebrate the finished step and pick the next.".into(),
                },
            ),
            (
                Strategy::HabitFormation,
                StrategyTemplate {
                    message: "You're in a good state to build a routine. Anchor a 25-minute focus session to the start of your next {task_type} task.".into(),
                    steps: vec![
                        step("Choose a trigger that already happens daily", 2, "Trigger named"),
                        step("Run one 25-minute session right after it", 25, "Session completed"),
                        step("Track the session in your log", 1, "Streak recorded"),
                    ],
                    timing: Timing::NextBreak,
                    follow_up: "Repeat tomorrow at the same trigger.".into(),
                },
            ),
            (
                Strategy::Maintain,
                StrategyTemplate {
                    message: "Things look steady. Keep going with your current {task_type} work.".into(),
                    steps: vec![step("Continue the current task", 25, "Task progressed")],
                    timing: Timing::NextBreak,
                    follow_up: "No follow-up needed.".into(),
                },
            ),
        ]
        .into_iter()
        .map(|(s, t)| (s.as_str().to_string(), t))
        .collect();

        Self {
            nudges,
            fallback: "Want to try a focused 25-minute work session? It could help boost your productivity and focus.".into(),
            excel_shortcuts: strings(&[
                "Try Ctrl+Arrow keys to navigate data regions - saves ~30 seconds per task",
                "Use Alt+Tab to switch between Excel sheets - saves 15+ clicks per hour",
                "Consider Ctrl+Shift+L for instant filters - saves ~2 minutes per dataset",
                "Want to try some Excel shortcuts? Using Ctrl+Arrow keys to navigate between data regions can save up to 30% of your clicking time.",
            ]),
            powerbi_templates: strings(&[
                "Create PowerBI templates now - could save 5+ hours next week",
                "Try DAX shortcuts with CALCULATE functions - speeds up reports by 40%",
                "Set up automatic data refresh - eliminates manual updates",
                "Want to try blocking out 90 minutes for focused PowerBI work? Creating report templates now could save you 5+ hours next week.",
            ]),
            data_focus: strings(&[
                "Perfect time for deep data analysis - your environment looks optimized",
                "Want to block 90 minutes for report creation? Your focus patterns show this is your peak time",
            ]),
            vscode_optimizations: strings(&[
                "Want to try grouping your VSCode tabs into workspaces? It could cut your context switching by 50% and help you stay in flow.",
                "Use Cmd+Shift+P for quick commands - saves navigation time",
                "Try workspace-specific settings - improves focus by 30%",
                "Want to try organizing your browser tabs into dedicated workspaces? Research shows this can cut context-switching time by 30%.",
            ]),
            consultative_prefixes: strings(&[
                "When you have a moment, consider",
                "At your convenience, you might",
                "If it helps, you could try",
                "You might find it useful to",
            ]),
            avoid_words: strings(&["Want to try", "You should", "Need to"]),
            strategies,
        }
    }
}

/// Substitute `{name}` placeholders.
pub fn fill(template: &str, vars: &[(&str, String)]) -> String {
    vars.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{name}}}"), value)
    })
}

/// Placeholder values derived from a context.
pub fn context_vars(ctx: &UserContext) -> Vec<(&'static str, String)> {
    vec![
        ("tab_count", ctx.tab_count.to_string()),
        ("hours", format!("{:.1}", f64::from(ctx.focus_duration_min) / 60.0)),
        ("core_percentage", ((ctx.core_work_ratio * 100.0).round() as u32).to_string()),
        ("task_type", ctx.task_category.clone()),
        ("minutes", ctx.focus_duration_min.to_string()),
        ("switches", ctx.window_switches.to_string()),
    ]
}

fn pick<R: Rng + ?Sized>(options: &[String], rng: &mut R) -> Option<String> {
    options.choose(rng).cloned()
}

impl TemplateCatalog {
    /// Template text for a key, falling back to the generic session nudge.
    pub fn nudge(&self, key: TemplateKey) -> &str {
        self.nudges
            .get(&key)
            .map(String::as_str)
            .unwrap_or(self.fallback.as_str())
    }

    /// Fill a template with context values plus explicit overrides.
    pub fn render(&self, key: TemplateKey, ctx: &UserContext, overrides: &[(&str, String)]) -> String {
        let text = fill(self.nudge(key), overrides);
        fill(&text, &context_vars(ctx))
    }

    /// Base nudge text for the most urgent dimension.
    pub fn render_dimension_text(
        &self,
        dimension: Dimension,
        analysis: &Analysis,
        ctx: &UserContext,
    ) -> String {
        match dimension {
            Dimension::Focus => {
                if ctx.tab_count > 5 {
                    self.render(TemplateKey::TabManagement, ctx, &[])
                } else if ctx.window_switches > 10 {
                    let tabs = ctx.tab_count.saturating_sub(3).max(3);
                    self.render(
                        TemplateKey::HighSwitches,
                        ctx,
                        &[("tab_count", tabs.to_string())],
                    )
                } else {
                    self.render(TemplateKey::NoDeepWork, ctx, &[])
                }
            }
            Dimension::Productivity => {
                if ctx.core_work_ratio < 0.3 {
                    self.render(
                        TemplateKey::TimeBlocking,
                        ctx,
                        &[("task_type", "core work".to_string())],
                    )
                } else {
                    self.render(TemplateKey::InterruptionManagement, ctx, &[])
                }
            }
            Dimension::ValueCreation => {
                if ctx.value_score < 0.4 {
                    self.render(TemplateKey::LowCoreWork, ctx, &[])
                } else {
                    self.render(TemplateKey::HighValueFocus, ctx, &[])
                }
            }
            Dimension::Wellbeing => {
                if ctx.cognitive_load > 0.8 {
                    self.render(TemplateKey::CognitiveLoad, ctx, &[])
                } else if ctx.break_duration_min < 5 {
                    self.render(TemplateKey::NoBreaks, ctx, &[])
                } else {
                    self.render(TemplateKey::LongStreak, ctx, &[("hours", "2".to_string())])
                }
            }
            Dimension::Automation => analysis
                .get(Dimension::Automation)
                .and_then(|a| a.opportunities.first())
                .map(|first| {
                    format!(
                        "Want to try {}? It could significantly improve your workflow efficiency.",
                        first.to_lowercase()
                    )
                })
                .unwrap_or_else(|| self.fallback.clone()),
            Dimension::ContextSwitching | Dimension::TimeManagement => self.fallback.clone(),
        }
    }

    /// Tool-specific text for personas with specialised templates.
    pub fn specialized_text<R: Rng + ?Sized>(
        &self,
        persona: Persona,
        ctx: &UserContext,
        rng: &mut R,
    ) -> Option<String> {
        let app = ctx.app_active.as_str();
        match persona {
            Persona::Analyst => {
                if app.contains("Excel") {
                    pick(&self.excel_shortcuts, rng)
                } else if app.contains("PowerBI") || app.contains("Power BI") {
                    pick(&self.powerbi_templates, rng)
                } else if ctx.focus_duration_min > 20 {
                    pick(&self.data_focus, rng)
                } else {
                    None
                }
            }
            Persona::Developer if app.contains("VSCode") || app.contains("Visual Studio") => {
                pick(&self.vscode_optimizations, rng)
            }
            _ => None,
        }
    }

    /// Adjust wording to a persona's language style.
    pub fn apply_tone<R: Rng + ?Sized>(
        &self,
        style: LanguageStyle,
        text: &str,
        ctx: &UserContext,
        rng: &mut R,
    ) -> String {
        match style {
            LanguageStyle::Consultative => {
                let mut text = text.to_string();
                for avoid in &self.avoid_words {
                    if text.contains(avoid.as_str()) {
                        if let Some(prefix) = pick(&self.consultative_prefixes, rng) {
                            text = text.replacen(avoid.as_str(), &prefix, 1);
                        }
                    }
                }
                strip_emoji(&text)
            }
            LanguageStyle::TechnicalDirect => {
                let mut text = text.to_string();
                let app = ctx.app_active.as_str();
                if app.contains("VSCode") || app.contains("Visual Studio") {
                    if text.contains("tabs") && !text.contains("VSCode") {
                        text = text.replace("tabs", "VSCode tabs");
                    }
                    if !text.to_lowercase().contains("workspace") && text.contains("organization") {
                        text.push_str(" You could group them into workspaces for better organization.");
                    }
                }
                text
            }
            _ => text.to_string(),
        }
    }

    /// Build the full intervention for a strategy.
    pub fn assemble(
        &self,
        strategy: Strategy,
        ctx: &UserContext,
        personality: Option<PersonalityType>,
    ) -> Intervention {
        let vars = context_vars(ctx);
        let (message, steps, timing, follow_up) = match self.strategies.get(strategy.as_str()) {
            Some(t) => (
                fill(&t.message, &vars),
                t.steps
                    .iter()
                    .map(|s| ActionStep {
                        step: fill(&s.step, &vars),
                        time_estimate_min: s.time_estimate_min,
                        success_metric: fill(&s.success_metric, &vars),
                    })
                    .collect(),
                t.timing,
                fill(&t.follow_up, &vars),
            ),
            None => (self.fallback.clone(), Vec::new(), Timing::NextBreak, String::new()),
        };

        let message = match personality.map(|p| p.profile().communication) {
            Some(CommunicationStyle::Enthusiastic) => format!("Great moment for this! {message}"),
            Some(CommunicationStyle::Supportive) => format!("{message} You've got this."),
            Some(CommunicationStyle::Structured) => {
                format!("{message} Plan: {} steps.", steps.len())
            }
            Some(CommunicationStyle::Reflective) => {
                format!("Take a second to consider: {message}")
            }
            Some(CommunicationStyle::Direct) | None => message,
        };

        Intervention {
            strategy,
            nudge_type: strategy.nudge_type(),
            message,
            action_steps: steps,
            timing,
            follow_up,
        }
    }
}

fn strip_emoji(text: &str) -> String {
    const EMOJI: &[char] = &[
        '🎯', '🚀', '💡', '🔧', '⚡', '\u{fe0f}', '✨', '🤔', '💻', '📊', '🎨',
    ];
    text.chars()
        .filter(|c| !EMOJI.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Expected outcome line for a triggering dimension.
pub fn expected_outcome(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Focus => "Improved focus and reduced context switching leading to higher productivity",
        Dimension::Productivity => "Increased core work completion and better time allocation",
        Dimension::ValueCreation => "Higher value output and more meaningful work accomplishment",
        Dimension::Wellbeing => "Reduced stress and improved work-life balance",
        Dimension::Automation => "Streamlined workflow and reduced manual effort",
        Dimension::ContextSwitching => "Reduced cognitive load and improved task completion",
        Dimension::TimeManagement => "Better time allocation and increased efficiency",
    }
}

/// Human-readable list of the signals that triggered a nudge.
pub fn trigger_reason(ctx: &UserContext) -> String {
    let mut reasons = Vec::new();
    if ctx.has_flag(ContextFlag::HighTabCount) {
        reasons.push(format!("High tab count ({})", ctx.tab_count));
    }
    if ctx.has_flag(ContextFlag::FrequentSwitching) {
        reasons.push(format!(
            "Frequent context switching ({} switches)",
            ctx.window_switches
        ));
    }
    if ctx.has_flag(ContextFlag::LowCoreWork) {
        reasons.push(format!(
            "Low core work percentage ({:.1}%)",
            ctx.core_work_ratio * 100.0
        ));
    }
    if ctx.has_flag(ContextFlag::CognitiveOverload) {
        reasons.push("High cognitive load detected".to_string());
    }
    if ctx.has_flag(ContextFlag::HighInterruptions) {
        reasons.push(format!("High interruption count ({})", ctx.interruption_count));
    }
    if ctx.has_flag(ContextFlag::ShortFocus) {
        reasons.push(format!("Short focus sessions ({}min)", ctx.focus_duration_min));
    }

    if reasons.is_empty() {
        "Optimization opportunity identified".to_string()
    } else {
        reasons.join("; ")
    }
}
