//! Interaction records and their JSON Lines logs.
//!
//! Every nudge the user responds to becomes one [`Interaction`] line in
//! `coaching_interactions.jsonl`. Generated nudges are additionally written
//! to `nudge_generation_log.jsonl` through the same writer.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coach::Nudge;
use crate::context::ContextFlag;
use crate::error::{LogError, Result};
use crate::persona::Persona;
use crate::scoring::Dimension;
use crate::selector::{NudgeType, Strategy};

/// Why a user dismissed a nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissalReason {
    Busy,
    NotRelevant,
    TooFrequent,
    Unclear,
    InMeeting,
    InFlow,
    #[serde(other)]
    Unknown,
}

impl DismissalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DismissalReason::Busy => "busy",
            DismissalReason::NotRelevant => "not_relevant",
            DismissalReason::TooFrequent => "too_frequent",
            DismissalReason::Unclear => "unclear",
            DismissalReason::InMeeting => "in_meeting",
            DismissalReason::InFlow => "in_flow",
            DismissalReason::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DismissalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User response to a nudge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub accepted: bool,
    /// Relative productivity change (-1.0..=1.0)
    #[serde(default)]
    pub productivity_impact: f64,
    /// Relative satisfaction change (-1.0..=1.0)
    #[serde(default)]
    pub satisfaction_impact: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissal_reason: Option<DismissalReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_through_probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<String>,
}

impl Outcome {
    pub fn accepted(productivity_impact: f64, satisfaction_impact: f64) -> Self {
        Self {
            accepted: true,
            productivity_impact,
            satisfaction_impact,
            response_time_seconds: None,
            dismissal_reason: None,
            follow_through_probability: None,
            user_feedback: None,
        }
    }

    pub fn dismissed(reason: DismissalReason) -> Self {
        Self {
            accepted: false,
            productivity_impact: 0.0,
            satisfaction_impact: -0.02,
            response_time_seconds: None,
            dismissal_reason: Some(reason),
            follow_through_probability: None,
            user_feedback: None,
        }
    }

    pub fn with_response_time(mut self, seconds: f64) -> Self {
        self.response_time_seconds = Some(seconds);
        self
    }

    pub fn with_feedback(mut self, feedback: &str) -> Self {
        self.user_feedback = Some(feedback.to_string());
        self
    }

    /// Dismissal reason, `Unknown` when a rejection carries none.
    pub fn reason(&self) -> DismissalReason {
        self.dismissal_reason.unwrap_or(DismissalReason::Unknown)
    }
}

fn default_nudge_type() -> NudgeType {
    NudgeType::ValueCreation
}

fn default_confidence() -> f64 {
    0.7
}

/// Nudge fields stored alongside each interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NudgeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default = "default_nudge_type")]
    pub nudge_type: NudgeType,
    #[serde(default)]
    pub nudge_text: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_dimension: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency_score: Option<f64>,
}

impl From<&Nudge> for NudgeRecord {
    fn from(nudge: &Nudge) -> Self {
        Self {
            id: Some(nudge.id),
            nudge_type: nudge.nudge_type,
            nudge_text: nudge.text.clone(),
            confidence: nudge.confidence,
            strategy: Some(nudge.strategy),
            trigger_dimension: Some(nudge.trigger_dimension),
            urgency_score: Some(nudge.urgency_score),
        }
    }
}

/// One line of the interaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub user_id: u64,
    pub persona: Persona,
    pub nudge: NudgeRecord,
    pub outcome: Outcome,
    #[serde(default)]
    pub effectiveness_score: f64,
}

impl Interaction {
    /// Check numeric ranges that the type system cannot express.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let checks = [
            ("outcome.productivity_impact", self.outcome.productivity_impact, -1.0, 1.0),
            ("outcome.satisfaction_impact", self.outcome.satisfaction_impact, -1.0, 1.0),
            ("nudge.confidence", self.nudge.confidence, 0.0, 1.0),
            ("effectiveness_score", self.effectiveness_score, 0.0, 1.0),
        ];
        for (field, value, min, max) in checks {
            if !value.is_finite() || value < min || value > max {
                return Err(format!("{field} = {value} is outside [{min}, {max}]"));
            }
        }
        if let Some(rt) = self.outcome.response_time_seconds {
            if !rt.is_finite() || rt < 0.0 {
                return Err(format!("outcome.response_time_seconds = {rt} is negative"));
            }
        }
        Ok(())
    }
}

/// Accepts RFC 3339 timestamps and naive ISO-8601 timestamps (read as UTC).
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

/// How the reader treats bad lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// First malformed or invalid line is an error
    #[default]
    Strict,
    /// Bad lines are logged and skipped
    Lenient,
}

/// Append one value as a JSON line, creating parent directories as needed.
pub(crate) fn append_jsonl<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let line = serde_json::to_string(value)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}

/// File-backed interaction log.
#[derive(Debug, Clone)]
pub struct InteractionLog {
    path: PathBuf,
}

impl InteractionLog {
    /// Point at a log file. The file is created on first append.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, interaction: &Interaction) -> Result<()> {
        append_jsonl(&self.path, interaction)
    }

    /// Read every record, failing on the first bad line.
    pub fn read_all(&self) -> Result<Vec<Interaction>> {
        self.read_validated(ReadMode::Strict)
    }

    /// Read and range-check every record.
    ///
    /// Blank lines are ignored. A missing file is [`LogError::NotFound`].
    pub fn read_validated(&self, mode: ReadMode) -> Result<Vec<Interaction>> {
        let file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LogError::NotFound(self.path.clone()).into());
            }
            Err(e) => return Err(e.into()),
        };

        let mut interactions = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let parsed = serde_json::from_str::<Interaction>(&line)
                .map_err(|e| LogError::Malformed {
                    line: line_no,
                    message: e.to_string(),
                })
                .and_then(|record| {
                    record
                        .validate()
                        .map(|_| record)
                        .map_err(|message| LogError::InvalidRecord {
                            line: line_no,
                            message,
                        })
                });

            match (parsed, mode) {
                (Ok(record), _) => interactions.push(record),
                (Err(err), ReadMode::Strict) => return Err(err.into()),
                (Err(err), ReadMode::Lenient) => {
                    tracing::warn!(path = %self.path.display(), "skipping log line: {err}");
                }
            }
        }

        Ok(interactions)
    }
}

/// One line of the nudge generation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NudgeLogEntry {
    pub timestamp: DateTime<Utc>,
    pub user_id: u64,
    pub persona: Persona,
    pub nudge: Nudge,
    pub context_flags: Vec<ContextFlag>,
    pub confidence_threshold_used: f64,
}

/// Append-only log of generated nudges.
#[derive(Debug, Clone)]
pub struct NudgeLog {
    path: PathBuf,
}

impl NudgeLog {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, entry: &NudgeLogEntry) -> Result<()> {
        append_jsonl(&self.path, entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use chrono::TimeZone;

    fn interaction(accepted: bool, productivity: f64) -> Interaction {
        Interaction {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap(),
            user_id: 3,
            persona: Persona::Analyst,
            nudge: NudgeRecord {
                id: None,
                nudge_type: NudgeType::Focus,
                nudge_text: "Close some tabs".into(),
                confidence: 0.8,
                strategy: None,
                trigger_dimension: Some(Dimension::Focus),
                urgency_score: None,
            },
            outcome: if accepted {
                Outcome::accepted(productivity, 0.12)
            } else {
                Outcome::dismissed(DismissalReason::Busy)
            },
            effectiveness_score: if accepted { 0.5 } else { 0.0 },
        }
    }

    #[test]
    fn append_then_read_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let log = InteractionLog::open(dir.path().join("nested/coaching_interactions.jsonl"));
        log.append(&interaction(true, 0.15)).unwrap();
        log.append(&interaction(false, 0.0)).unwrap();

        let records = log.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].outcome.accepted);
        assert_eq!(records[1].outcome.reason(), DismissalReason::Busy);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let log = InteractionLog::open(dir.path().join("absent.jsonl"));
        let err = log.read_all().unwrap_err();
        assert!(matches!(err, CoreError::Log(LogError::NotFound(_))));
    }

    #[test]
    fn strict_mode_rejects_malformed_line_with_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let good = serde_json::to_string(&interaction(true, 0.1)).unwrap();
        std::fs::write(&path, format!("{good}\n\n{{not json\n")).unwrap();

        let err = InteractionLog::open(&path).read_all().unwrap_err();
        assert!(matches!(err, CoreError::Log(LogError::Malformed { line: 3, .. })));
    }

    #[test]
    fn lenient_mode_skips_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let good = serde_json::to_string(&interaction(true, 0.1)).unwrap();
        let bad = serde_json::to_string(&interaction(true, 7.5)).unwrap();
        std::fs::write(&path, format!("{good}\nnope\n{bad}\n{good}\n")).unwrap();

        let records = InteractionLog::open(&path)
            .read_validated(ReadMode::Lenient)
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn out_of_range_impact_is_invalid_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let bad = serde_json::to_string(&interaction(true, 7.5)).unwrap();
        std::fs::write(&path, format!("{bad}\n")).unwrap();

        let err = InteractionLog::open(&path).read_all().unwrap_err();
        assert!(matches!(err, CoreError::Log(LogError::InvalidRecord { line: 1, .. })));
    }

    #[test]
    fn non_boolean_accepted_is_malformed() {
        let line = r#"{"timestamp":"2024-05-06T10:00:00","user_id":1,"persona":"manager",
            "nudge":{"nudge_type":"focus","nudge_text":"x","confidence":0.7},
            "outcome":{"accepted":"yes","productivity_impact":0.1,"satisfaction_impact":0.1},
            "effectiveness_score":0.3}"#
            .replace('\n', "");
        assert!(serde_json::from_str::<Interaction>(&line).is_err());
    }

    #[test]
    fn reads_naive_timestamps_and_null_reasons() {
        let line = r#"{"timestamp":"2024-05-06T10:00:00.123456","user_id":1,"persona":"designer",
            "nudge":{"nudge_text":"Synthetic nudge","confidence":0.6},
            "outcome":{"accepted":true,"productivity_impact":0.1,"dismissal_reason":null},
            "effectiveness_score":0.3}"#
            .replace('\n', "");
        let record: Interaction = serde_json::from_str(&line).unwrap();
        assert_eq!(record.nudge.nudge_type, NudgeType::ValueCreation);
        assert_eq!(record.outcome.dismissal_reason, None);
        assert_eq!(record.timestamp.date_naive().to_string(), "2024-05-06");
    }

    #[test]
    fn unknown_dismissal_reason_maps_to_unknown() {
        let reason: DismissalReason = serde_json::from_str("\"on_vacation\"").unwrap();
        assert_eq!(reason, DismissalReason::Unknown);
    }
}
