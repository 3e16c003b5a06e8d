//! MBTI-style personality types and their delivery preferences.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// How a personality type prefers to be addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationStyle {
    Direct,
    Enthusiastic,
    Supportive,
    Structured,
    Reflective,
}

/// Delivery preferences for one personality type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalityProfile {
    pub learning_style: &'static str,
    pub communication: CommunicationStyle,
    pub work_pattern: &'static str,
    pub motivation_drivers: Vec<&'static str>,
    pub cognitive_style: &'static str,
}

/// The sixteen four-letter personality codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PersonalityType {
    Intj,
    Intp,
    Entj,
    Entp,
    Infj,
    Infp,
    Enfj,
    Enfp,
    Istj,
    Isfj,
    Estj,
    Esfj,
    Istp,
    Isfp,
    Estp,
    Esfp,
}

impl PersonalityType {
    pub fn all() -> [PersonalityType; 16] {
        use PersonalityType::*;
        [
            Intj, Intp, Entj, Entp, Infj, Infp, Enfj, Enfp, Istj, Isfj, Estj, Esfj, Istp, Isfp,
            Estp, Esfp,
        ]
    }

    pub fn code(&self) -> &'static str {
        use PersonalityType::*;
        match self {
            Intj => "INTJ",
            Intp => "INTP",
            Entj => "ENTJ",
            Entp => "ENTP",
            Infj => "INFJ",
            Infp => "INFP",
            Enfj => "ENFJ",
            Enfp => "ENFP",
            Istj => "ISTJ",
            Isfj => "ISFJ",
            Estj => "ESTJ",
            Esfj => "ESFJ",
            Istp => "ISTP",
            Isfp => "ISFP",
            Estp => "ESTP",
            Esfp => "ESFP",
        }
    }

    pub fn profile(&self) -> PersonalityProfile {
        use CommunicationStyle::*;
        use PersonalityType::*;

        let (learning_style, communication, work_pattern, motivation_drivers, cognitive_style) =
            match self {
                Intj => ("systematic", Direct, "deep_focus", vec!["mastery", "autonomy"], "analytical"),
                Intp => ("conceptual", Reflective, "deep_focus", vec!["curiosity", "autonomy"], "analytical"),
                Entj => ("goal_driven", Direct, "structured", vec!["achievement", "leadership"], "strategic"),
                Entp => ("exploratory", Enthusiastic, "flexible", vec!["novelty", "debate"], "intuitive"),
                Infj => ("reflective", Supportive, "deep_focus", vec!["purpose", "growth"], "intuitive"),
                Infp => ("values_based", Supportive, "flexible", vec!["meaning", "authenticity"], "intuitive"),
                Enfj => ("collaborative", Enthusiastic, "structured", vec!["connection", "impact"], "empathetic"),
                Enfp => ("exploratory", Enthusiastic, "flexible", vec!["creativity", "connection"], "intuitive"),
                Istj => ("sequential", Structured, "structured", vec!["reliability", "order"], "practical"),
                Isfj => ("practical", Supportive, "structured", vec!["service", "stability"], "practical"),
                Estj => ("procedural", Direct, "structured", vec!["efficiency", "results"], "practical"),
                Esfj => ("social", Supportive, "structured", vec!["harmony", "recognition"], "empathetic"),
                Istp => ("hands_on", Direct, "bursty", vec!["problem_solving", "autonomy"], "analytical"),
                Isfp => ("experiential", Reflective, "flexible", vec!["expression", "freedom"], "sensory"),
                Estp => ("hands_on", Enthusiastic, "bursty", vec!["action", "challenge"], "pragmatic"),
                Esfp => ("social", Enthusiastic, "bursty", vec!["fun", "connection"], "sensory"),
            };

        PersonalityProfile {
            learning_style,
            communication,
            work_pattern,
            motivation_drivers,
            cognitive_style,
        }
    }
}

impl fmt::Display for PersonalityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PersonalityType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        PersonalityType::all()
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or_else(|| ValidationError::UnknownPersonality(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_parses_back() {
        for t in PersonalityType::all() {
            assert_eq!(t.code().parse::<PersonalityType>().unwrap(), t);
            assert_eq!(t.code().to_lowercase().parse::<PersonalityType>().unwrap(), t);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(matches!(
            "XXXX".parse::<PersonalityType>(),
            Err(ValidationError::UnknownPersonality(_))
        ));
    }

    #[test]
    fn profiles_are_complete() {
        for t in PersonalityType::all() {
            let profile = t.profile();
            assert!(!profile.motivation_drivers.is_empty(), "{t} has no drivers");
        }
        assert_eq!(PersonalityType::Intj.profile().work_pattern, "deep_focus");
        assert_eq!(
            PersonalityType::Enfp.profile().communication,
            CommunicationStyle::Enthusiastic
        );
    }

    #[test]
    fn serializes_as_uppercase_code() {
        assert_eq!(serde_json::to_string(&PersonalityType::Esfj).unwrap(), "\"ESFJ\"");
    }
}
