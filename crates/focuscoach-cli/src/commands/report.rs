use std::path::PathBuf;

use clap::Args;

use focuscoach_core::interaction::{InteractionLog, ReadMode};
use focuscoach_core::report::{write_outputs, SummaryReport};

use super::Workspace;

#[derive(Args)]
pub struct ReportArgs {
    /// Interaction log (defaults to the configured log)
    #[arg(long)]
    log: Option<PathBuf>,
    /// Directory for the report and chart files
    #[arg(long)]
    output: Option<PathBuf>,
    /// Fail on malformed log lines instead of skipping them
    #[arg(long)]
    strict: bool,
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
    /// Print only; write no files
    #[arg(long)]
    no_files: bool,
}

pub fn run(args: ReportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::load()?;
    let path = args
        .log
        .unwrap_or_else(|| ws.config.interaction_log_path(&ws.base));
    let mode = if args.strict {
        ReadMode::Strict
    } else {
        ReadMode::Lenient
    };

    let interactions = InteractionLog::open(&path).read_validated(mode)?;

    let summary = SummaryReport::from_interactions(&interactions, &ws.config.report);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render_text());
    }

    if !args.no_files {
        let dir = args.output.unwrap_or_else(|| ws.config.output_dir(&ws.base));
        let written = write_outputs(&dir, &interactions, &ws.config.report)?;
        if !args.json {
            println!("\nReport files saved to {}", dir.display());
            for file in written {
                println!("  {}", file.display());
            }
        }
    }
    Ok(())
}
