use clap::Subcommand;

use focuscoach_core::coach::LearningState;

use super::Workspace;

#[derive(Subcommand)]
pub enum LearningAction {
    /// Show saved learning progress
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Delete saved learning state
    Reset,
}

pub fn run(action: LearningAction) -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::load()?;
    let path = ws.config.learning_state_path(&ws.base);

    match action {
        LearningAction::Show { json } => {
            let Some(state) = LearningState::load(&path) else {
                println!("No learning state at {}", path.display());
                return Ok(());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
                return Ok(());
            }

            let m = &state.metrics;
            println!("Learning state ({})", state.saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("  Status:             {}", m.learning_status());
            println!("  Interactions:       {}", m.total_interactions);
            println!("  Acceptance rate:    {:.1}%", m.acceptance_rate() * 100.0);
            println!("  Global threshold:   {:.2}", state.global_threshold);
            println!("  Adaptations:        {}", state.adaptations.len());

            if !m.persona_performance.is_empty() {
                println!("\nBy persona:");
                for (persona, perf) in &m.persona_performance {
                    let dismissals: Vec<String> = perf
                        .top_dismissals(2)
                        .into_iter()
                        .map(|(reason, n)| format!("{}x{n}", reason.as_str()))
                        .collect();
                    let effectiveness = perf.mean_effectiveness();
                    let lift = state.personas.get(*persona).effectiveness_lift(effectiveness);
                    println!(
                        "  {:<17} {:>4} nudges  {:>5.1}% accepted  effectiveness {:.2} ({:+.2} vs baseline)  {}",
                        persona.as_str(),
                        perf.interactions,
                        perf.acceptance_rate() * 100.0,
                        effectiveness,
                        lift,
                        dismissals.join(" ")
                    );
                }
            }

            if !state.adaptations.is_empty() {
                println!("\nRecent adaptations:");
                for a in state.adaptations.iter().rev().take(5) {
                    println!("  {} {}: {}", a.timestamp.format("%m-%d %H:%M"), a.persona, a.change);
                }
            }
        }
        LearningAction::Reset => {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            println!("learning state reset");
        }
    }
    Ok(())
}
