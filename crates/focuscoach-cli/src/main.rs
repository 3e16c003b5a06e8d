use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focuscoach", version, about = "Context-aware productivity coaching")]
struct Cli {
    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Coach one user context
    Coach(commands::coach::CoachArgs),
    /// Run a seeded coaching session against simulated users
    Simulate(commands::simulate::SimulateArgs),
    /// Summarize the interaction log and write charts
    Report(commands::report::ReportArgs),
    /// Evolve per-persona coaching strategies
    Evolve(commands::evolve::EvolveArgs),
    /// Persona profiles
    Persona {
        #[command(subcommand)]
        action: commands::persona::PersonaAction,
    },
    /// Personality type delivery preferences
    Personality {
        #[command(subcommand)]
        action: commands::persona::PersonalityAction,
    },
    /// Saved learning state
    Learning {
        #[command(subcommand)]
        action: commands::learning::LearningAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Coach(args) => commands::coach::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Report(args) => commands::report::run(args),
        Commands::Evolve(args) => commands::evolve::run(args),
        Commands::Persona { action } => commands::persona::run_persona(action),
        Commands::Personality { action } => commands::persona::run_personality(action),
        Commands::Learning { action } => commands::learning::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "focuscoach", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
