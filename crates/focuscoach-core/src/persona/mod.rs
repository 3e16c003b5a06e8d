//! Work-role personas and their coaching profiles.
//!
//! A [`PersonaProfile`] carries everything the coach tunes per role:
//! delivery tone, confidence bar, nudge spacing, daily budget and timing
//! windows. Profiles start from learned defaults and are adjusted at
//! runtime by interaction feedback.

mod personality;

pub use personality::{CommunicationStyle, PersonalityProfile, PersonalityType};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::interaction::DismissalReason;

/// Work role of the coached user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Manager,
    Analyst,
    Developer,
    Designer,
    CustomerSupport,
}

impl Persona {
    pub fn all() -> [Persona; 5] {
        [
            Persona::Manager,
            Persona::Analyst,
            Persona::Developer,
            Persona::Designer,
            Persona::CustomerSupport,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Manager => "manager",
            Persona::Analyst => "analyst",
            Persona::Developer => "developer",
            Persona::Designer => "designer",
            Persona::CustomerSupport => "customer_support",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "manager" => Ok(Persona::Manager),
            "analyst" => Ok(Persona::Analyst),
            "developer" | "dev" => Ok(Persona::Developer),
            "designer" => Ok(Persona::Designer),
            "customer_support" | "support" => Ok(Persona::CustomerSupport),
            _ => Err(ValidationError::UnknownPersona(s.to_string())),
        }
    }
}

/// Delivery tone applied to nudge text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageStyle {
    Consultative,
    TechnicalHelpful,
    TechnicalDirect,
    CreativeSupportive,
    Empathetic,
}

/// Per-persona coaching parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub persona: Persona,
    pub language_style: LanguageStyle,
    /// Minimum nudge confidence (0.0-1.0); the global threshold applies when unset
    #[serde(default)]
    pub confidence_override: Option<f64>,
    /// Minimum minutes between nudges to the same user
    pub nudge_interval_minutes: u32,
    /// Maximum nudges per user per calendar day
    pub daily_limit: u32,
    /// Observed historical acceptance (0.0-1.0)
    pub acceptance_rate: f64,
    pub avg_effectiveness: f64,
    /// Preferred hours; only enforced when `strict_optimal_hours` is set
    #[serde(default)]
    pub optimal_hours: Vec<u8>,
    #[serde(default)]
    pub strict_optimal_hours: bool,
    /// Hours reserved for uninterrupted work
    #[serde(default)]
    pub quiet_hours: Vec<u8>,
    /// Hours learned from "busy" dismissals
    #[serde(default)]
    pub avoid_hours: Vec<u8>,
    /// Skip nudging while the user is in flow
    #[serde(default)]
    pub flow_protection: bool,
    /// Rejections among recent interactions that trigger back-off
    pub dismissal_sensitivity: usize,
    #[serde(default)]
    pub common_dismissals: Vec<DismissalReason>,
}

impl PersonaProfile {
    /// Learned default profile for a persona.
    pub fn defaults_for(persona: Persona) -> Self {
        match persona {
            Persona::Manager => Self {
                persona,
                language_style: LanguageStyle::Consultative,
                confidence_override: Some(0.85),
                nudge_interval_minutes: 60,
                daily_limit: 3,
                acceptance_rate: 0.571,
                avg_effectiveness: 0.27,
                optimal_hours: vec![9, 10, 14, 15],
                strict_optimal_hours: true,
                quiet_hours: Vec::new(),
                avoid_hours: Vec::new(),
                flow_protection: false,
                dismissal_sensitivity: 1,
                common_dismissals: vec![DismissalReason::Busy, DismissalReason::InMeeting],
            },
            Persona::Analyst => Self {
                persona,
                language_style: LanguageStyle::TechnicalHelpful,
                confidence_override: Some(0.6),
                nudge_interval_minutes: 30,
                daily_limit: 5,
                acceptance_rate: 0.875,
                avg_effectiveness: 0.43,
                optimal_hours: Vec::new(),
                strict_optimal_hours: false,
                quiet_hours: Vec::new(),
                avoid_hours: Vec::new(),
                flow_protection: false,
                dismissal_sensitivity: 2,
                common_dismissals: vec![DismissalReason::Busy, DismissalReason::NotRelevant],
            },
            Persona::Developer => Self {
                persona,
                language_style: LanguageStyle::TechnicalDirect,
                confidence_override: Some(0.75),
                nudge_interval_minutes: 45,
                daily_limit: 4,
                acceptance_rate: 0.778,
                avg_effectiveness: 0.38,
                optimal_hours: Vec::new(),
                strict_optimal_hours: false,
                quiet_hours: vec![9, 10, 11, 14, 15, 16],
                avoid_hours: Vec::new(),
                flow_protection: true,
                dismissal_sensitivity: 2,
                common_dismissals: vec![DismissalReason::TooFrequent, DismissalReason::InFlow],
            },
            Persona::Designer => Self {
                persona,
                language_style: LanguageStyle::CreativeSupportive,
                confidence_override: Some(0.7),
                nudge_interval_minutes: 35,
                daily_limit: 4,
                acceptance_rate: 1.0,
                avg_effectiveness: 0.47,
                optimal_hours: Vec::new(),
                strict_optimal_hours: false,
                quiet_hours: Vec::new(),
                avoid_hours: Vec::new(),
                flow_protection: false,
                dismissal_sensitivity: 2,
                common_dismissals: vec![DismissalReason::Busy, DismissalReason::NotRelevant],
            },
            Persona::CustomerSupport => Self {
                persona,
                language_style: LanguageStyle::Empathetic,
                confidence_override: Some(0.5),
                nudge_interval_minutes: 25,
                daily_limit: 4,
                acceptance_rate: 0.85,
                avg_effectiveness: 0.35,
                optimal_hours: Vec::new(),
                strict_optimal_hours: false,
                quiet_hours: Vec::new(),
                avoid_hours: Vec::new(),
                flow_protection: false,
                dismissal_sensitivity: 2,
                common_dismissals: vec![DismissalReason::Busy, DismissalReason::TooFrequent],
            },
        }
    }

    /// Observed mean effectiveness minus this persona's historical baseline.
    pub fn effectiveness_lift(&self, observed: f64) -> f64 {
        observed - self.avg_effectiveness
    }
}

/// All persona profiles, one per [`Persona`].
///
/// Serialized as a map keyed by persona; personas missing from a stored map
/// fall back to their defaults so lookups are total.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<Persona, PersonaProfile>",
    into = "BTreeMap<Persona, PersonaProfile>"
)]
pub struct PersonaBook {
    profiles: [PersonaProfile; 5],
}

impl Default for PersonaBook {
    fn default() -> Self {
        Self {
            profiles: Persona::all().map(PersonaProfile::defaults_for),
        }
    }
}

impl From<BTreeMap<Persona, PersonaProfile>> for PersonaBook {
    fn from(mut stored: BTreeMap<Persona, PersonaProfile>) -> Self {
        let profiles = Persona::all().map(|persona| {
            let mut profile = stored
                .remove(&persona)
                .unwrap_or_else(|| PersonaProfile::defaults_for(persona));
            profile.persona = persona;
            profile
        });
        Self { profiles }
    }
}

impl From<PersonaBook> for BTreeMap<Persona, PersonaProfile> {
    fn from(book: PersonaBook) -> Self {
        book.profiles.into_iter().map(|p| (p.persona, p)).collect()
    }
}

impl PersonaBook {
    pub fn get(&self, persona: Persona) -> &PersonaProfile {
        &self.profiles[persona as usize]
    }

    pub fn get_mut(&mut self, persona: Persona) -> &mut PersonaProfile {
        &mut self.profiles[persona as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PersonaProfile> {
        self.profiles.iter()
    }

    /// Overlay learned profiles onto the current ones.
    pub fn merge(&mut self, learned: PersonaBook) {
        for profile in learned.profiles {
            let persona = profile.persona;
            self.profiles[persona as usize] = profile;
        }
    }
}
