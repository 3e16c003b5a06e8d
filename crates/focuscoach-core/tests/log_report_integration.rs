//! Integration tests for the interaction log and summary report.

use chrono::{Duration, TimeZone, Utc};
use focuscoach_core::error::{CoreError, LogError};
use focuscoach_core::interaction::{DismissalReason, Interaction, InteractionLog, NudgeRecord, Outcome, ReadMode};
use focuscoach_core::report::{acceptance_by, write_outputs, GroupBy, SummaryReport};
use focuscoach_core::storage::ReportConfig;
use focuscoach_core::{NudgeType, Persona};

fn interaction(i: i64, accepted: bool) -> Interaction {
    Interaction {
        timestamp: Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap() + Duration::minutes(i),
        user_id: (i % 3) as u64 + 1,
        persona: if i % 2 == 0 { Persona::Analyst } else { Persona::Manager },
        nudge: NudgeRecord {
            id: None,
            nudge_type: NudgeType::Focus,
            nudge_text: "Batch your notifications for the next hour".into(),
            confidence: 0.8,
            strategy: None,
            trigger_dimension: None,
            urgency_score: None,
        },
        outcome: if accepted {
            Outcome::accepted(0.12, 0.08).with_response_time(6.0)
        } else {
            Outcome::dismissed(DismissalReason::TooFrequent)
        },
        effectiveness_score: if accepted { 0.55 } else { 0.0 },
    }
}

#[test]
fn test_append_read_and_summarize() {
    let dir = tempfile::tempdir().unwrap();
    let log = InteractionLog::open(dir.path().join("coaching_interactions.jsonl"));
    for i in 0..10 {
        log.append(&interaction(i, i < 6)).unwrap();
    }

    let rows = log.read_all().unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[3], interaction(3, true));

    let report = SummaryReport::from_interactions(&rows, &ReportConfig::default());
    assert_eq!(report.total, 10);
    assert_eq!(report.accepted, 6);
    assert_eq!(report.acceptance_rate, 60.0);
    assert!((report.avg_productivity - 12.0).abs() < 1e-9);
    assert!(!report.meets_acceptance_target());

    let by_persona = acceptance_by(&rows, GroupBy::Persona);
    assert_eq!(by_persona.len(), 2);
    assert_eq!(by_persona[0].count, 5);
}

#[test]
fn test_strict_and_lenient_reading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.jsonl");
    let log = InteractionLog::open(&path);
    log.append(&interaction(0, true)).unwrap();

    let mut content = std::fs::read_to_string(&path).unwrap();
    content.push_str("\n{not json\n\n");
    std::fs::write(&path, content).unwrap();
    log.append(&interaction(1, false)).unwrap();

    match log.read_validated(ReadMode::Strict) {
        Err(CoreError::Log(LogError::Malformed { line, .. })) => assert_eq!(line, 3),
        other => panic!("expected malformed line error, got {other:?}"),
    }
    let rows = log.read_validated(ReadMode::Lenient).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_out_of_range_impact_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let log = InteractionLog::open(dir.path().join("log.jsonl"));
    let mut bad = interaction(0, true);
    bad.outcome.productivity_impact = 4.0;
    log.append(&bad).unwrap();

    assert!(matches!(
        log.read_validated(ReadMode::Strict),
        Err(CoreError::Log(LogError::InvalidRecord { line: 1, .. }))
    ));
    assert!(log.read_validated(ReadMode::Lenient).unwrap().is_empty());
}

#[test]
fn test_missing_log_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let log = InteractionLog::open(dir.path().join("absent.jsonl"));
    assert!(matches!(log.read_all(), Err(CoreError::Log(LogError::NotFound(_)))));
}

#[test]
fn test_outputs_from_empty_log_do_not_panic() {
    let dir = tempfile::tempdir().unwrap();
    let written = write_outputs(dir.path(), &[], &ReportConfig::default()).unwrap();
    assert_eq!(written.len(), 4);
    let impact = std::fs::read_to_string(dir.path().join("productivity_impact.txt")).unwrap();
    assert!(impact.contains("No accepted nudges"));
}
