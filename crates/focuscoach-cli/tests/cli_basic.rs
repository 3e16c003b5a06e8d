//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command with `home` as the data directory.
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_focuscoach"))
        .args(args)
        .env("FOCUSCOACH_HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn write_log(home: &Path, accepted: usize, total: usize) {
    let mut lines = String::new();
    for i in 0..total {
        let persona = if i % 2 == 0 { "analyst" } else { "developer" };
        let outcome = if i < accepted {
            r#"{"accepted":true,"productivity_impact":0.15,"satisfaction_impact":0.1}"#
        } else {
            r#"{"accepted":false,"dismissal_reason":"busy"}"#
        };
        lines.push_str(&format!(
            r#"{{"timestamp":"2024-05-06T09:{i:02}:00","user_id":{i},"persona":"{persona}","nudge":{{"nudge_type":"focus","nudge_text":"Close a few tabs","confidence":0.8}},"outcome":{outcome},"effectiveness_score":0.5}}"#
        ));
        lines.push('\n');
    }
    std::fs::write(home.join("coaching_interactions.jsonl"), lines).unwrap();
}

#[test]
fn test_config_get_set_list() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "coach.confidence_threshold"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "0.8");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "coach.confidence_threshold", "0.7"]);
    assert_eq!(code, 0, "config set failed");
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "coach.confidence_threshold"]);
    assert_eq!(stdout.trim(), "0.7");

    let (code, stdout, _) = run_cli(home.path(), &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("evolution.population_size = 8"));
}

#[test]
fn test_config_rejects_unknown_and_invalid() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["config", "get", "coach.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
    assert!(stderr.contains("unknown config key: coach.nope"));

    let (code, _, stderr) = run_cli(home.path(), &["config", "set", "coach.confidence_threshold", "1.5"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_report_missing_log_exits_1() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["report"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
    assert!(stderr.contains("No interactions found at"));
}

#[test]
fn test_report_summary_and_files() {
    let home = tempfile::tempdir().unwrap();
    write_log(home.path(), 6, 10);

    let (code, stdout, _) = run_cli(home.path(), &["report"]);
    assert_eq!(code, 0, "report failed");
    assert!(stdout.contains("Total Nudges Generated: 10"));
    assert!(stdout.contains("Overall Acceptance Rate: 60.0% FAIL"));
    assert!(stdout.contains("Average Productivity Lift: 15.0% PASS"));

    let outputs = home.path().join("outputs");
    for name in [
        "summary_report.txt",
        "acceptance_rates.txt",
        "productivity_impact.txt",
        "effectiveness_timeline.txt",
    ] {
        assert!(outputs.join(name).exists(), "missing {name}");
    }
}

#[test]
fn test_report_json() {
    let home = tempfile::tempdir().unwrap();
    write_log(home.path(), 3, 4);
    let (code, stdout, _) = run_cli(home.path(), &["report", "--json", "--no-files"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["total"], 4);
    assert_eq!(parsed["acceptance_rate"], 75.0);
    assert!(!home.path().join("outputs").exists());
}

#[test]
fn test_coach_json() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        home.path(),
        &[
            "coach", "--persona", "analyst", "--hour", "10", "--tabs", "14", "--switches", "20",
            "--load", "0.9", "--seed", "3", "--json",
        ],
    );
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed.get("nudge").is_some() || parsed.get("skipped").is_some());
}

#[test]
fn test_coach_lunch_hour_skips() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["coach", "--hour", "12", "--seed", "1"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("No nudge:"));
}

#[test]
fn test_coach_rejects_unknown_persona() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["coach", "--persona", "astronaut"]);
    assert_ne!(code, 0);
}

#[test]
fn test_simulate_saves_learning_state() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        home.path(),
        &[
            "simulate", "--users", "3", "--samples", "8", "--seed", "7", "--start",
            "2024-05-07T10:00:00Z", "--fresh",
        ],
    );
    assert_eq!(code, 0, "simulate failed");
    assert!(stdout.contains("Simulated 3 users x 8 samples (seed 7)"));
    assert!(stdout.contains("30-day projection:"));
    assert!(home.path().join("learning_state.json").exists());

    let (code, stdout, _) = run_cli(home.path(), &["learning", "show"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Learning state"));

    let (code, _, _) = run_cli(home.path(), &["learning", "reset"]);
    assert_eq!(code, 0);
    assert!(!home.path().join("learning_state.json").exists());
}

#[test]
fn test_simulate_json_includes_user_stats_and_projection() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        home.path(),
        &[
            "simulate", "--users", "3", "--samples", "8", "--seed", "11", "--start",
            "2024-05-07T10:00:00Z", "--fresh", "--projection-days", "60", "--json",
        ],
    );
    assert_eq!(code, 0, "simulate failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed.get("interactions").is_some());
    assert_eq!(parsed["projection_days"], 60);
    assert!(parsed["long_term"]["sustained_adoption_probability"].is_f64());

    let users = parsed["users"].as_array().unwrap();
    assert_eq!(users.len(), 3);
    for user in users {
        assert!(user["fatigue_level"].as_f64().unwrap() >= 0.0);
        assert!(user["receptiveness"].as_f64().unwrap() <= 1.0);
    }
}

#[test]
fn test_evolve_exports_and_applies() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        home.path(),
        &["evolve", "--iterations", "4", "--fresh", "--apply", "--json"],
    );
    assert_eq!(code, 0, "evolve failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["evolution_metadata"]["total_generations"], 4);
    assert_eq!(parsed["evolution_metadata"]["total_interactions"], 20);
    assert_eq!(parsed["persona_strategies"].as_object().unwrap().len(), 5);

    assert!(home.path().join("outputs/evolved_intelligence.json").exists());
    assert!(home.path().join("evolution_state.json").exists());
    assert!(home.path().join("learning_state.json").exists());
}

#[test]
fn test_persona_and_personality() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["persona", "list"]);
    assert_eq!(code, 0);
    for persona in ["manager", "analyst", "developer", "designer", "customer_support"] {
        assert!(stdout.contains(persona));
    }

    let (code, stdout, _) = run_cli(home.path(), &["persona", "show", "developer"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["flow_protection"], true);

    let (code, stdout, _) = run_cli(home.path(), &["personality", "show", "intj"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed.get("communication").is_some());
}

#[test]
fn test_completions() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("focuscoach"));
}
