//! Seeded end-to-end coaching session over simulated users.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::Args;
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::Serialize;

use focuscoach_core::coach::{Coach, CoachDecision, LearningState, SessionSummary};
use focuscoach_core::context::{TelemetrySample, UserContext};
use focuscoach_core::interaction::{InteractionLog, NudgeLog, Outcome};
use focuscoach_core::persona::Persona;
use focuscoach_core::report::format_thousands;
use focuscoach_core::simulator::{
    long_term_impact, situation_tags, LongTermImpact, TelemetryGenerator, UserOutcomeSimulator,
    UserStats,
};

use super::{pass_fail, Workspace};

/// Telemetry rows per user that make up one coaching context.
const CONTEXT_WINDOW: usize = 4;

#[derive(Args)]
pub struct SimulateArgs {
    /// Number of simulated users
    #[arg(long, default_value_t = 10)]
    users: u64,
    /// Telemetry rows per user, 15 minutes apart
    #[arg(long, default_value_t = 32)]
    samples: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Session start (RFC 3339), defaults to 09:00 UTC today
    #[arg(long)]
    start: Option<DateTime<Utc>>,
    /// Ignore saved learning state
    #[arg(long)]
    fresh: bool,
    /// Days of coaching the long-term projection covers
    #[arg(long, default_value_t = 30)]
    projection_days: u32,
    /// Output the session summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct UserRow {
    user_id: u64,
    persona: Persona,
    #[serde(flatten)]
    stats: UserStats,
}

#[derive(Serialize)]
struct SimulationOutput {
    #[serde(flatten)]
    summary: SessionSummary,
    users: Vec<UserRow>,
    projection_days: u32,
    long_term: LongTermImpact,
}

fn default_start() -> DateTime<Utc> {
    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default();
    Utc::now().date_naive().and_time(nine).and_utc()
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.users == 0 || args.samples == 0 {
        return Err("--users and --samples must be at least 1".into());
    }
    let ws = Workspace::load()?;
    let cfg = &ws.config;
    let state_path = cfg.learning_state_path(&ws.base);
    let log = InteractionLog::open(cfg.interaction_log_path(&ws.base));

    let mut coach = Coach::new(cfg, Mcg128Xsl64::seed_from_u64(args.seed))
        .with_nudge_log(NudgeLog::open(cfg.nudge_log_path(&ws.base)));
    if !args.fresh {
        if let Some(state) = LearningState::load(&state_path) {
            tracing::info!("Restored learning state from {}", state_path.display());
            coach.restore(state);
        }
    }
    let mut users = UserOutcomeSimulator::new(Mcg128Xsl64::seed_from_u64(args.seed.wrapping_add(1)))
        .with_personas(coach.personas().clone());

    let start = args.start.unwrap_or_else(default_start);
    let samples = TelemetryGenerator::new(args.seed).generate(args.users, args.samples, start);

    let update_every = (args.samples / 4).max(5);
    let mut windows: HashMap<u64, Vec<TelemetrySample>> = HashMap::new();
    let mut last_day: HashMap<u64, NaiveDate> = HashMap::new();
    let mut personas: BTreeMap<u64, Persona> = BTreeMap::new();
    let mut outcomes: Vec<Outcome> = Vec::new();

    for (step, rows) in samples.chunks(args.users as usize).enumerate() {
        for sample in rows {
            let window = windows.entry(sample.user_id).or_default();
            window.push(sample.clone());
            if window.len() > CONTEXT_WINDOW {
                window.remove(0);
            }

            let persona: Persona = match sample.persona_type.as_deref().map(str::parse::<Persona>) {
                Some(Ok(p)) => p,
                _ => continue,
            };
            personas.insert(sample.user_id, persona);

            let day = sample.timestamp.date_naive();
            if last_day.insert(sample.user_id, day) != Some(day) {
                users.reset_fatigue(sample.user_id);
            }
            let ctx = UserContext::from_samples(window)?;

            if let CoachDecision::Nudge(nudge) = coach.coach(sample.user_id, persona, &ctx, sample.timestamp) {
                let tags = situation_tags(&ctx, sample.timestamp);
                let outcome = users.simulate(&nudge, &tags);
                outcomes.push(outcome.clone());
                let interaction = coach.record_interaction(sample.user_id, persona, &nudge, outcome, sample.timestamp);
                log.append(&interaction)?;
            }
        }

        if (step + 1) % update_every == 0 {
            if let Some(threshold) = coach.mid_session_update() {
                tracing::info!("Mid-session threshold now {threshold:.2}");
            }
        }
    }

    coach.learning_state(Utc::now()).save(&state_path)?;
    let summary = coach.session_summary(&cfg.report);
    let rows: Vec<UserRow> = personas
        .into_iter()
        .map(|(user_id, persona)| UserRow {
            user_id,
            persona,
            stats: users.user_stats(user_id),
        })
        .collect();
    let projection = long_term_impact(&outcomes, args.projection_days);

    if args.json {
        let output = SimulationOutput {
            summary,
            users: rows,
            projection_days: args.projection_days,
            long_term: projection,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Simulated {} users x {} samples (seed {})",
        args.users, args.samples, args.seed
    );
    println!("  Nudges generated: {}", summary.nudges_generated);
    println!("  Nudges skipped:   {}", summary.nudges_skipped);
    println!("  Interactions:     {}", summary.interactions);
    println!(
        "  Acceptance rate:  {:.1}% {} (Target: >{:.0}%)",
        summary.acceptance_rate,
        pass_fail(summary.meets_acceptance_target),
        cfg.report.acceptance_target
    );
    println!(
        "  Avg productivity: {:.1}% {} (Target: >{:.0}%)",
        summary.avg_productivity,
        pass_fail(summary.meets_productivity_target),
        cfg.report.productivity_target
    );
    println!("  Quarterly ROI:    ${}", format_thousands(summary.quarterly_roi));
    println!("  Learning status:  {}", summary.learning_status);

    println!("\nUser fatigue at end of session:");
    for row in &rows {
        println!(
            "  user {:>3} {:<17} fatigue {:.1}  receptiveness {:.2}",
            row.user_id,
            row.persona.as_str(),
            row.stats.fatigue_level,
            row.stats.receptiveness
        );
    }

    println!("\n{}-day projection:", args.projection_days);
    println!("  Productivity improvement: {:.1}%", projection.productivity_improvement * 100.0);
    println!("  Satisfaction improvement: {:.1}%", projection.satisfaction_improvement * 100.0);
    println!("  Behavior change score:    {:.2}", projection.behavior_change_score);
    println!(
        "  Sustained adoption:       {:.0}%",
        projection.sustained_adoption_probability * 100.0
    );
    println!("Interactions appended to {}", log.path().display());
    Ok(())
}
