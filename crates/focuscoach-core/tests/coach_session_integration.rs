//! End-to-end coaching sessions over simulated users.

use chrono::{TimeZone, Utc};
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;

use focuscoach_core::coach::{Coach, CoachDecision, LearningState};
use focuscoach_core::context::UserContext;
use focuscoach_core::evolution::EvolutionEngine;
use focuscoach_core::interaction::{Interaction, InteractionLog};
use focuscoach_core::persona::Persona;
use focuscoach_core::report::SummaryReport;
use focuscoach_core::simulator::{situation_tags, TelemetryGenerator, UserOutcomeSimulator};
use focuscoach_core::Config;

fn run_session(seed: u64, log: &InteractionLog) -> (Coach<Mcg128Xsl64>, Vec<Interaction>) {
    let config = Config::default();
    let mut coach = Coach::new(&config, Mcg128Xsl64::seed_from_u64(seed));
    let mut users = UserOutcomeSimulator::new(Mcg128Xsl64::seed_from_u64(seed + 1));
    let start = Utc.with_ymd_and_hms(2024, 5, 7, 9, 30, 0).unwrap();

    let mut recorded = Vec::new();
    for sample in TelemetryGenerator::new(seed).generate(6, 24, start) {
        let persona: Persona = sample
            .persona_type
            .as_deref()
            .and_then(|p| p.parse().ok())
            .expect("generator labels every row");
        let ctx = UserContext::from_samples(std::slice::from_ref(&sample)).unwrap();
        if let CoachDecision::Nudge(nudge) = coach.coach(sample.user_id, persona, &ctx, sample.timestamp) {
            let outcome = users.simulate(&nudge, &situation_tags(&ctx, sample.timestamp));
            let interaction = coach.record_interaction(sample.user_id, persona, &nudge, outcome, sample.timestamp);
            log.append(&interaction).unwrap();
            recorded.push(interaction);
        }
    }
    (coach, recorded)
}

#[test]
fn test_session_log_matches_coach_counters() {
    let dir = tempfile::tempdir().unwrap();
    let log = InteractionLog::open(dir.path().join("coaching_interactions.jsonl"));
    let (coach, recorded) = run_session(21, &log);

    let session = coach.session();
    assert_eq!(session.interactions as usize, recorded.len());
    assert_eq!(coach.nudge_history().len() as u64, session.nudges_generated);

    if recorded.is_empty() {
        return;
    }
    let rows = log.read_all().unwrap();
    assert_eq!(rows.len(), recorded.len());

    let config = Config::default();
    let report = SummaryReport::from_interactions(&rows, &config.report);
    let summary = coach.session_summary(&config.report);
    assert_eq!(report.total as u64, summary.interactions);
    assert!((report.acceptance_rate - summary.acceptance_rate).abs() < 1e-9);
    assert!((report.avg_productivity - summary.avg_productivity).abs() < 1e-9);
    for row in &rows {
        assert!((0.0..=1.0).contains(&row.effectiveness_score));
    }
}

#[test]
fn test_seeded_sessions_are_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let (_, a) = run_session(5, &InteractionLog::open(dir.path().join("a.jsonl")));
    let (_, b) = run_session(5, &InteractionLog::open(dir.path().join("b.jsonl")));

    let strip = |rows: &[Interaction]| -> Vec<(u64, String, bool)> {
        rows.iter()
            .map(|i| (i.user_id, i.nudge.nudge_text.clone(), i.outcome.accepted))
            .collect()
    };
    assert_eq!(strip(&a), strip(&b));
}

#[test]
fn test_learning_state_carries_between_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("learning_state.json");
    let (coach, _) = run_session(9, &InteractionLog::open(dir.path().join("log.jsonl")));
    coach.learning_state(Utc::now()).save(&state_path).unwrap();

    let mut next = Coach::new(&Config::default(), Mcg128Xsl64::seed_from_u64(10));
    next.restore(LearningState::load(&state_path).unwrap());
    assert_eq!(next.metrics().total_interactions, coach.metrics().total_interactions);
    assert_eq!(next.metrics().accepted, coach.metrics().accepted);
    assert!((next.global_threshold() - coach.global_threshold()).abs() < 1e-9);
    for persona in Persona::all() {
        assert!((next.threshold_for(persona) - coach.threshold_for(persona)).abs() < 1e-9);
        assert_eq!(
            next.personas().get(persona).nudge_interval_minutes,
            coach.personas().get(persona).nudge_interval_minutes
        );
    }
}

#[test]
fn test_evolved_strategies_reach_the_coach() {
    let config = Config::default();
    let mut engine = EvolutionEngine::new(config.evolution.clone(), Mcg128Xsl64::seed_from_u64(3));
    let mut rng = Mcg128Xsl64::seed_from_u64(4);
    let start = Utc.with_ymd_and_hms(2024, 5, 7, 9, 0, 0).unwrap();
    for i in focuscoach_core::evolution::synthetic_interactions(40, start, &mut rng) {
        engine.process_feedback(&i);
    }
    assert_eq!(engine.metrics().generations, 8);

    let mut coach = Coach::new(&config, Mcg128Xsl64::seed_from_u64(5));
    let mut state = coach.learning_state(start);
    engine.apply_to(&mut state.personas);
    coach.restore(state);

    for (persona, best) in engine.best_strategies() {
        assert_eq!(coach.threshold_for(persona), best.confidence_threshold);
        assert_eq!(
            coach.personas().get(persona).nudge_interval_minutes,
            best.timing_rules.interval_minutes
        );
    }
}
