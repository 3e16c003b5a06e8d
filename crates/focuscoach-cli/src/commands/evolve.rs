//! Strategy evolution runs.

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;

use focuscoach_core::coach::{Coach, LearningState};
use focuscoach_core::evolution::{synthetic_interactions, EvolutionEngine};
use focuscoach_core::interaction::{InteractionLog, ReadMode};

use super::Workspace;

/// Synthetic interactions generated per iteration.
const BATCH: usize = 5;

#[derive(Args)]
pub struct EvolveArgs {
    /// Iterations of synthetic feedback
    #[arg(long, default_value_t = 100)]
    iterations: usize,
    /// Feed the interaction log through the engine first
    #[arg(long)]
    from_log: bool,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Start from fresh populations instead of saved evolution state
    #[arg(long)]
    fresh: bool,
    /// Export path (defaults to <output_dir>/evolved_intelligence.json)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Push the best strategies into the saved learning state
    #[arg(long)]
    apply: bool,
    /// Print the exported intelligence as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: EvolveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::load()?;
    let cfg = &ws.config;
    let state_path = cfg.evolution_state_path(&ws.base);

    let mut engine = EvolutionEngine::new(cfg.evolution.clone(), Mcg128Xsl64::seed_from_u64(args.seed));
    if !args.fresh && engine.load_state(&state_path) {
        tracing::info!("Resumed evolution from {}", state_path.display());
    }

    let mut fed = 0usize;
    if args.from_log {
        let log = InteractionLog::open(cfg.interaction_log_path(&ws.base));
        for interaction in log.read_validated(ReadMode::Lenient)? {
            engine.process_feedback(&interaction);
            fed += 1;
        }
        tracing::info!("Loaded {fed} logged interactions");
    }

    let mut rng = Mcg128Xsl64::seed_from_u64(args.seed.wrapping_add(1));
    let start = Utc::now();
    for iteration in 0..args.iterations {
        let offset = chrono::Duration::minutes((iteration * BATCH) as i64);
        for interaction in synthetic_interactions(BATCH, start + offset, &mut rng) {
            engine.process_feedback(&interaction);
            fed += 1;
        }
    }

    let now = Utc::now();
    engine.save_state(&state_path, now)?;
    let export_path = args
        .output
        .unwrap_or_else(|| cfg.output_dir(&ws.base).join("evolved_intelligence.json"));
    let intelligence = engine.export_intelligence(&export_path, now)?;

    if args.apply {
        let learning_path = cfg.learning_state_path(&ws.base);
        let mut state = LearningState::load(&learning_path)
            .unwrap_or_else(|| Coach::new(cfg, Mcg128Xsl64::seed_from_u64(args.seed)).learning_state(now));
        let updated = engine.apply_to(&mut state.personas);
        state.saved_at = now;
        state.save(&learning_path)?;
        if !args.json {
            println!("Applied evolved strategies to {} personas", updated.len());
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&intelligence)?);
        return Ok(());
    }

    let meta = &intelligence.evolution_metadata;
    println!("Processed {fed} interactions");
    println!("  Generations:  {}", meta.total_generations);
    println!("  Interactions: {}", meta.total_interactions);
    println!("  Best fitness: {:.3}", meta.best_fitness_score);
    println!("\nBest strategies:");
    for (persona, s) in &intelligence.persona_strategies {
        println!(
            "  {:<17} fitness {:.3}  acceptance {:>5.1}%  threshold {:.2}  interval {:>3}m  gen {}  ({})",
            persona.as_str(),
            s.fitness_score,
            s.acceptance_rate * 100.0,
            s.confidence_threshold,
            s.timing_rules.interval_minutes,
            s.generation,
            s.language_style
        );
    }
    println!("\nExported to {}", export_path.display());
    Ok(())
}
