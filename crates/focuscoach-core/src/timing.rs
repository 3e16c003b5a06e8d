//! Smart timing rules.
//!
//! Global windows (first hour, lunch, end of day) apply to everyone.
//! Persona windows come from the [`PersonaProfile`]: quiet hours, learned
//! avoid hours and, for strict personas, the optimal-hours allow list.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::{ContextFlag, UserContext};
use crate::persona::PersonaProfile;

/// Why a moment was judged a bad time to nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingBlock {
    FirstHour,
    EndOfDay,
    Lunch,
    QuietHours,
    AvoidHour,
    OutsideOptimalHours,
}

impl fmt::Display for TimingBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimingBlock::FirstHour => "before the working day settles",
            TimingBlock::EndOfDay => "end of the working day",
            TimingBlock::Lunch => "lunch break",
            TimingBlock::QuietHours => "persona quiet hours",
            TimingBlock::AvoidHour => "hour learned from busy dismissals",
            TimingBlock::OutsideOptimalHours => "outside the persona's optimal hours",
        };
        f.write_str(s)
    }
}

/// Global timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartTiming {
    /// Block hours up to and including `first_hour_cutoff`
    #[serde(default = "default_true")]
    pub avoid_first_hour: bool,
    #[serde(default = "default_first_hour_cutoff")]
    pub first_hour_cutoff: u8,
    /// Block hours from `end_of_day_hour` onwards
    #[serde(default = "default_true")]
    pub avoid_end_of_day: bool,
    #[serde(default = "default_end_of_day_hour")]
    pub end_of_day_hour: u8,
    #[serde(default = "default_true")]
    pub lunch_break_awareness: bool,
    #[serde(default = "default_lunch_start")]
    pub lunch_start: u8,
    #[serde(default = "default_lunch_end")]
    pub lunch_end: u8,
    /// Protect flow for personas with flow protection enabled
    #[serde(default = "default_true")]
    pub flow_state_detection: bool,
    /// Task load at which quiet hours are overridden
    #[serde(default = "default_quiet_override_load")]
    pub quiet_override_load: f64,
}

fn default_true() -> bool {
    true
}
fn default_first_hour_cutoff() -> u8 {
    8
}
fn default_end_of_day_hour() -> u8 {
    17
}
fn default_lunch_start() -> u8 {
    12
}
fn default_lunch_end() -> u8 {
    13
}
fn default_quiet_override_load() -> f64 {
    0.9
}

impl Default for SmartTiming {
    fn default() -> Self {
        Self {
            avoid_first_hour: true,
            first_hour_cutoff: default_first_hour_cutoff(),
            avoid_end_of_day: true,
            end_of_day_hour: default_end_of_day_hour(),
            lunch_break_awareness: true,
            lunch_start: default_lunch_start(),
            lunch_end: default_lunch_end(),
            flow_state_detection: true,
            quiet_override_load: default_quiet_override_load(),
        }
    }
}

impl SmartTiming {
    /// Check every timing rule, returning the first that blocks.
    pub fn check(&self, profile: &PersonaProfile, ctx: &UserContext) -> Result<(), TimingBlock> {
        let hour = ctx.hour;

        if self.avoid_first_hour && hour <= self.first_hour_cutoff {
            return Err(TimingBlock::FirstHour);
        }
        if self.avoid_end_of_day && hour >= self.end_of_day_hour {
            return Err(TimingBlock::EndOfDay);
        }
        if self.lunch_break_awareness && (self.lunch_start..=self.lunch_end).contains(&hour) {
            return Err(TimingBlock::Lunch);
        }

        if profile.quiet_hours.contains(&hour) {
            // Only a real emergency breaks through quiet hours
            let urgent = ctx.cognitive_load >= self.quiet_override_load
                || ctx.has_flag(ContextFlag::CognitiveOverload)
                || ctx.has_flag(ContextFlag::HighInterruptions);
            if !urgent {
                return Err(TimingBlock::QuietHours);
            }
        }

        if profile.avoid_hours.contains(&hour) {
            return Err(TimingBlock::AvoidHour);
        }

        if profile.strict_optimal_hours
            && !profile.optimal_hours.is_empty()
            && !profile.optimal_hours.contains(&hour)
        {
            return Err(TimingBlock::OutsideOptimalHours);
        }

        Ok(())
    }

    pub fn is_optimal(&self, profile: &PersonaProfile, ctx: &UserContext) -> bool {
        self.check(profile, ctx).is_ok()
    }
}

/// Whether the user shows at least two flow indicators.
pub fn is_in_flow(ctx: &UserContext) -> bool {
    let indicators = [
        ctx.focus_duration_min > 30,
        ctx.window_switches < 5,
        ctx.is_coding_app(),
        ctx.keystrokes_per_min > 80.0,
    ];
    indicators.iter().filter(|&&hit| hit).count() >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::Persona;

    fn at(hour: u8) -> UserContext {
        UserContext::builder().hour(hour).build()
    }

    #[test]
    fn global_windows_block() {
        let timing = SmartTiming::default();
        let analyst = PersonaProfile::defaults_for(Persona::Analyst);
        assert_eq!(timing.check(&analyst, &at(8)), Err(TimingBlock::FirstHour));
        assert_eq!(timing.check(&analyst, &at(12)), Err(TimingBlock::Lunch));
        assert_eq!(timing.check(&analyst, &at(13)), Err(TimingBlock::Lunch));
        assert_eq!(timing.check(&analyst, &at(17)), Err(TimingBlock::EndOfDay));
        assert!(timing.is_optimal(&analyst, &at(11)));
    }

    #[test]
    fn disabled_windows_do_not_block() {
        let timing = SmartTiming {
            lunch_break_awareness: false,
            ..SmartTiming::default()
        };
        let analyst = PersonaProfile::defaults_for(Persona::Analyst);
        assert!(timing.is_optimal(&analyst, &at(12)));
    }

    #[test]
    fn developer_quiet_hours_yield_to_overload() {
        let timing = SmartTiming::default();
        let dev = PersonaProfile::defaults_for(Persona::Developer);
        assert_eq!(timing.check(&dev, &at(10)), Err(TimingBlock::QuietHours));

        let overloaded = UserContext::builder().hour(10).cognitive_load(0.92).build();
        assert!(timing.is_optimal(&dev, &overloaded));

        let interrupted = UserContext::builder().hour(10).interruptions(8).build();
        assert!(timing.is_optimal(&dev, &interrupted));
    }

    #[test]
    fn manager_is_strict_about_optimal_hours() {
        let timing = SmartTiming::default();
        let manager = PersonaProfile::defaults_for(Persona::Manager);
        assert_eq!(
            timing.check(&manager, &at(11)),
            Err(TimingBlock::OutsideOptimalHours)
        );
        assert!(timing.is_optimal(&manager, &at(10)));
    }

    #[test]
    fn learned_avoid_hours_block() {
        let timing = SmartTiming::default();
        let mut designer = PersonaProfile::defaults_for(Persona::Designer);
        designer.avoid_hours.push(15);
        assert_eq!(timing.check(&designer, &at(15)), Err(TimingBlock::AvoidHour));
    }

    #[test]
    fn flow_needs_two_indicators() {
        let coding = UserContext::builder()
            .app_active("VSCode")
            .focus_duration(40)
            .window_switches(8)
            .build();
        assert!(is_in_flow(&coding));

        let browsing = UserContext::builder()
            .focus_duration(40)
            .window_switches(8)
            .keystrokes_per_min(20.0)
            .build();
        assert!(!is_in_flow(&browsing));
    }
}
