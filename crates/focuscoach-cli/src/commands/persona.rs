use clap::Subcommand;

use focuscoach_core::coach::LearningState;
use focuscoach_core::persona::{Persona, PersonaBook, PersonalityType};

use super::Workspace;

#[derive(Subcommand)]
pub enum PersonaAction {
    /// List persona profiles
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one persona profile
    Show {
        persona: Persona,
    },
}

#[derive(Subcommand)]
pub enum PersonalityAction {
    /// List personality codes
    List,
    /// Show delivery preferences for a code
    Show {
        /// Four-letter code, e.g. INTJ
        code: PersonalityType,
    },
}

/// Default profiles overlaid with anything learned so far.
fn current_book() -> Result<PersonaBook, Box<dyn std::error::Error>> {
    let ws = Workspace::load()?;
    let mut book = PersonaBook::default();
    if let Some(state) = LearningState::load(&ws.config.learning_state_path(&ws.base)) {
        book.merge(state.personas);
    }
    Ok(book)
}

pub fn run_persona(action: PersonaAction) -> Result<(), Box<dyn std::error::Error>> {
    let book = current_book()?;
    match action {
        PersonaAction::List { json } => {
            if json {
                let profiles: Vec<_> = book.iter().collect();
                println!("{}", serde_json::to_string_pretty(&profiles)?);
                return Ok(());
            }
            println!(
                "{:<17} {:<20} {:>9} {:>9} {:>6} {:>10}",
                "persona", "style", "threshold", "interval", "daily", "acceptance"
            );
            for p in book.iter() {
                let threshold = p
                    .confidence_override
                    .map(|t| format!("{t:.2}"))
                    .unwrap_or_else(|| "global".into());
                println!(
                    "{:<17} {:<20} {:>9} {:>8}m {:>6} {:>9.1}%",
                    p.persona.as_str(),
                    format!("{:?}", p.language_style),
                    threshold,
                    p.nudge_interval_minutes,
                    p.daily_limit,
                    p.acceptance_rate * 100.0
                );
            }
        }
        PersonaAction::Show { persona } => {
            println!("{}", serde_json::to_string_pretty(book.get(persona))?);
        }
    }
    Ok(())
}

pub fn run_personality(action: PersonalityAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PersonalityAction::List => {
            for t in PersonalityType::all() {
                let profile = t.profile();
                println!("{t}  {:?}, {}", profile.communication, profile.work_pattern);
            }
        }
        PersonalityAction::Show { code } => {
            println!("{}", serde_json::to_string_pretty(&code.profile())?);
        }
    }
    Ok(())
}
