//! One-shot coaching for a context given on the command line or read from
//! a telemetry export.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{Timelike, Utc};
use clap::Args;
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;

use focuscoach_core::coach::{Coach, CoachDecision, LearningState, Nudge};
use focuscoach_core::context::{TelemetrySample, UserContext};
use focuscoach_core::interaction::NudgeLog;
use focuscoach_core::persona::{Persona, PersonalityType};
use focuscoach_core::templates::Intervention;

use super::Workspace;

#[derive(Args)]
pub struct CoachArgs {
    /// Work role (manager, analyst, developer, designer, customer_support)
    #[arg(long, default_value = "analyst")]
    persona: Persona,
    /// User id; with --telemetry defaults to the user of the latest row
    #[arg(long)]
    user: Option<u64>,
    /// Hour of day (0-23), defaults to the current UTC hour
    #[arg(long)]
    hour: Option<u8>,
    /// Cognitive load (0.0-1.0)
    #[arg(long, default_value_t = 0.5)]
    load: f64,
    /// Energy level (0.0-1.0)
    #[arg(long, default_value_t = 0.7)]
    energy: f64,
    /// Stress level (0.0-1.0)
    #[arg(long, default_value_t = 0.3)]
    stress: f64,
    #[arg(long, default_value_t = 5)]
    tabs: u32,
    /// Window switches in the last 15 minutes
    #[arg(long, default_value_t = 5)]
    switches: u32,
    /// Minutes in the current focus session
    #[arg(long, default_value_t = 30)]
    focus: u32,
    /// Break minutes taken recently
    #[arg(long, default_value_t = 0)]
    breaks: u32,
    #[arg(long, default_value_t = 0)]
    interruptions: u32,
    /// Meeting minutes today
    #[arg(long, default_value_t = 0)]
    meetings: u32,
    /// Share of time on core work (0.0-1.0)
    #[arg(long, default_value_t = 0.3)]
    core_work: f64,
    /// Active application
    #[arg(long, default_value = "Browser")]
    app: String,
    #[arg(long, default_value = "general")]
    category: String,
    /// Build the context from a telemetry JSONL file instead of flags
    #[arg(long)]
    telemetry: Option<PathBuf>,
    /// Personality code (e.g. INTJ) for an extra strategy intervention
    #[arg(long)]
    personality: Option<PersonalityType>,
    /// RNG seed for text variation
    #[arg(long)]
    seed: Option<u64>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

fn read_telemetry(path: &Path) -> Result<Vec<TelemetrySample>, Box<dyn std::error::Error>> {
    let file = std::fs::File::open(path)
        .map_err(|e| format!("cannot open telemetry {}: {e}", path.display()))?;
    let mut samples = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let sample: TelemetrySample = serde_json::from_str(&line)
            .map_err(|e| format!("telemetry line {}: {e}", idx + 1))?;
        samples.push(sample);
    }
    Ok(samples)
}

fn context_from_flags(args: &CoachArgs) -> Result<UserContext, Box<dyn std::error::Error>> {
    let hour = args.hour.unwrap_or(Utc::now().hour() as u8);
    let ctx = UserContext::builder()
        .hour(hour)
        .cognitive_load(args.load)
        .energy_level(args.energy)
        .stress_level(args.stress)
        .tab_count(args.tabs)
        .window_switches(args.switches)
        .focus_duration(args.focus)
        .break_duration(args.breaks)
        .interruptions(args.interruptions)
        .meetings(args.meetings)
        .core_work_ratio(args.core_work)
        .app_active(&args.app)
        .task_category(&args.category)
        .build();
    ctx.validate()?;
    Ok(ctx)
}

fn context_from_telemetry(
    args: &CoachArgs,
    path: &Path,
) -> Result<(u64, Persona, UserContext), Box<dyn std::error::Error>> {
    let samples = read_telemetry(path)?;
    let user = match args.user {
        Some(u) => u,
        None => samples
            .iter()
            .max_by_key(|s| s.timestamp)
            .map(|s| s.user_id)
            .ok_or("telemetry file has no rows")?,
    };
    let rows: Vec<TelemetrySample> = samples.into_iter().filter(|s| s.user_id == user).collect();
    if rows.is_empty() {
        return Err(format!("no telemetry rows for user {user}").into());
    }

    let persona = rows
        .iter()
        .rev()
        .find_map(|s| s.persona_type.as_deref().and_then(|p| p.parse().ok()))
        .unwrap_or(args.persona);
    let ctx = UserContext::from_samples(&rows)?;
    Ok((user, persona, ctx))
}

fn print_nudge(nudge: &Nudge) {
    println!("Nudge for {} (user {})", nudge.persona, nudge.user_id);
    println!("  {}", nudge.text);
    println!(
        "  type: {}  strategy: {}  trigger: {}",
        nudge.nudge_type, nudge.strategy, nudge.trigger_dimension
    );
    println!(
        "  confidence: {:.2}  urgency: {:.2}",
        nudge.confidence, nudge.urgency_score
    );
    println!("  why: {}", nudge.trigger_reason);
    println!("  expected: {}", nudge.expected_outcome);
    if !nudge.action_steps.is_empty() {
        println!("  steps:");
        for (i, step) in nudge.action_steps.iter().enumerate() {
            println!(
                "    {}. {} (~{} min) - {}",
                i + 1,
                step.step,
                step.time_estimate_min,
                step.success_metric
            );
        }
    }
    if !nudge.follow_up.is_empty() {
        println!("  follow-up: {}", nudge.follow_up);
    }
    println!("  snooze: {}", nudge.snooze_options.join(", "));
}

fn print_intervention(personality: PersonalityType, intervention: &Intervention) {
    println!("\n{personality} intervention ({})", intervention.strategy);
    println!("  {}", intervention.message);
    for (i, step) in intervention.action_steps.iter().enumerate() {
        println!("    {}. {}", i + 1, step.step);
    }
    println!("  deliver: {}", intervention.timing);
}

pub fn run(args: CoachArgs) -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::load()?;

    let (user, persona, ctx) = match &args.telemetry {
        Some(path) => context_from_telemetry(&args, path)?,
        None => (args.user.unwrap_or(1), args.persona, context_from_flags(&args)?),
    };

    let rng = match args.seed {
        Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
        None => Mcg128Xsl64::from_entropy(),
    };
    let mut coach = Coach::new(&ws.config, rng)
        .with_nudge_log(NudgeLog::open(ws.config.nudge_log_path(&ws.base)));
    if let Some(state) = LearningState::load(&ws.config.learning_state_path(&ws.base)) {
        coach.restore(state);
    }

    let decision = coach.coach(user, persona, &ctx, Utc::now());
    let intervention = match (&decision, args.personality) {
        (CoachDecision::Nudge(nudge), Some(p)) => {
            Some((p, coach.templates().assemble(nudge.strategy, &ctx, Some(p))))
        }
        _ => None,
    };

    if args.json {
        let body = match &decision {
            CoachDecision::Nudge(nudge) => serde_json::json!({
                "nudge": nudge,
                "intervention": intervention.as_ref().map(|(_, i)| i),
            }),
            CoachDecision::Skipped(reason) => serde_json::json!({
                "skipped": reason,
                "message": reason.to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    match &decision {
        CoachDecision::Nudge(nudge) => {
            print_nudge(nudge);
            if let Some((p, i)) = &intervention {
                print_intervention(*p, i);
            }
        }
        CoachDecision::Skipped(reason) => println!("No nudge: {reason}"),
    }
    Ok(())
}
