//! Workout planning CLI command.

use anyhow::Result;
use clap::Args;

use crate::cli::context::AppContext;
use crate::cli::output::{format_weight, output, CommandOutput};
use crate::cli::table::{list_table, render_list};
use crate::domain::models::{Config, WorkoutContext, WorkoutSuggestion, DEFAULT_MAX_EXERCISES};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Maximum number of exercises
    #[arg(short, long, default_value_t = DEFAULT_MAX_EXERCISES)]
    pub max_exercises: usize,

    /// Time available in minutes
    #[arg(short = 't', long)]
    pub minutes: Option<u32>,

    /// Training focus, e.g. "upper body"
    #[arg(short, long)]
    pub focus: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct PlanOutput {
    pub exercises: Vec<WorkoutSuggestion>,
}

impl CommandOutput for PlanOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["exercise", "sets", "reps", "weight", "rest", "notes"]);
        for e in &self.exercises {
            table.add_row(vec![
                e.exercise_name.clone(),
                e.sets.to_string(),
                e.reps.to_string(),
                format_weight(e.weight),
                format!("{}s", e.rest_seconds),
                e.notes.clone(),
            ]);
        }
        render_list("exercise", &table, self.exercises.len())
    }
}

pub async fn execute(args: PlanArgs, user_id: &str, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    let context = WorkoutContext {
        max_exercises: args.max_exercises,
        available_minutes: args.minutes,
        focus: args.focus,
    };
    let exercises = ctx.service.generate_workout_suggestions(user_id, &context).await?;
    output(&PlanOutput { exercises }, json_mode);
    Ok(())
}
