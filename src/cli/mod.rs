//! Command-line interface.
//!
//! Every command accepts `--json` for machine-readable output and `--user`
//! to select whose data it acts on.

pub mod commands;
pub mod context;
pub mod output;
pub mod table;

use clap::{Parser, Subcommand};

pub use context::AppContext;

use commands::{
    cache::CacheArgs, init::InitArgs, plan::PlanArgs, plateau::PlateauArgs,
    progress::ProgressArgs, suggestion::SuggestionArgs, workout::WorkoutArgs,
};

#[derive(Parser, Debug)]
#[command(name = "overload")]
#[command(about = "Overload - progressive overload analysis and plateau interventions", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// User the command acts for
    #[arg(short, long, global = true, env = "OVERLOAD_USER", default_value = "default")]
    pub user: String,

    /// Override the configured log level
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the project directory, default config, and database
    Init(InitArgs),
    /// Log and list workouts
    Workout(WorkoutArgs),
    /// Progression analysis and next-session suggestions
    Progress(ProgressArgs),
    /// Plateau detection, interventions, and alerts
    Plateau(PlateauArgs),
    /// Record suggestion feedback and view acceptance statistics
    Suggestion(SuggestionArgs),
    /// Suggest exercises for the next workout
    Plan(PlanArgs),
    /// Inspect and clear the suggestion cache
    Cache(CacheArgs),
}

/// Print the error and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({ "success": false, "error": format!("{err:#}") });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1)
}
