//! Workout CLI commands.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::output::{format_weight, output, CommandOutput, MessageOutput};
use crate::cli::table::{list_table, render_list};
use crate::domain::models::{Config, ExerciseEntry, SetRecord, WorkoutLog};
use crate::domain::ports::WorkoutRepository;

#[derive(Args, Debug)]
pub struct WorkoutArgs {
    #[command(subcommand)]
    pub command: WorkoutCommands,
}

#[derive(Subcommand, Debug)]
pub enum WorkoutCommands {
    /// Log a workout
    Log {
        /// Exercise with its sets, e.g. "Squat=100x5,100x5,100x4"
        #[arg(short, long = "exercise", required = true)]
        exercises: Vec<String>,
        /// When the workout happened (RFC 3339, defaults to now)
        #[arg(long)]
        at: Option<String>,
        /// Log the workout as not completed
        #[arg(long)]
        incomplete: bool,
    },
    /// List recent workouts
    List {
        /// Maximum number of workouts to display
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },
    /// Delete a workout
    Delete {
        /// Workout ID
        id: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct WorkoutOutput {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub completed: bool,
    pub exercises: Vec<ExerciseEntry>,
}

impl From<&WorkoutLog> for WorkoutOutput {
    fn from(workout: &WorkoutLog) -> Self {
        Self {
            id: workout.id.clone(),
            timestamp: workout.timestamp,
            completed: workout.completed,
            exercises: workout.exercises.clone(),
        }
    }
}

fn summarize(entry: &ExerciseEntry) -> String {
    let sets: Vec<String> = entry
        .sets
        .iter()
        .map(|s| format!("{}x{}", format_weight(s.weight), s.reps))
        .collect();
    format!("{} {}", entry.exercise_name, sets.join(","))
}

#[derive(Debug, serde::Serialize)]
pub struct WorkoutLoggedOutput {
    pub workout: WorkoutOutput,
    pub alerts_resolved: usize,
}

impl CommandOutput for WorkoutLoggedOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Workout logged: {}", self.workout.id)];
        for entry in &self.workout.exercises {
            lines.push(format!("  - {}", summarize(entry)));
        }
        if self.alerts_resolved > 0 {
            lines.push(format!("\nResolved {} plateau alert(s).", self.alerts_resolved));
        }
        lines.join("\n")
    }
}

#[derive(Debug, serde::Serialize)]
pub struct WorkoutListOutput {
    pub workouts: Vec<WorkoutOutput>,
    pub total: usize,
}

impl CommandOutput for WorkoutListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "date", "done", "exercises"]);
        for workout in &self.workouts {
            let exercises: Vec<String> = workout.exercises.iter().map(summarize).collect();
            table.add_row(vec![
                workout.id.chars().take(8).collect::<String>(),
                workout.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                if workout.completed { "yes" } else { "no" }.to_string(),
                exercises.join("; "),
            ]);
        }
        render_list("workout", &table, self.total)
    }
}

/// Parse `NAME=WEIGHTxREPS,WEIGHTxREPS,...`.
pub fn parse_exercise(arg: &str) -> Result<ExerciseEntry> {
    let (name, sets) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected NAME=WEIGHTxREPS,... but got '{arg}'"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Exercise name is empty in '{arg}'");
    }

    let sets = sets
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_set)
        .collect::<Result<Vec<_>>>()?;
    if sets.is_empty() {
        bail!("No sets given for {name}");
    }

    Ok(ExerciseEntry {
        exercise_name: name.to_string(),
        sets,
    })
}

fn parse_set(set: &str) -> Result<SetRecord> {
    let (weight, reps) = set
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("Expected WEIGHTxREPS but got '{set}'"))?;
    let weight: f64 = weight
        .trim()
        .parse()
        .with_context(|| format!("Invalid weight in '{set}'"))?;
    let reps: u32 = reps
        .trim()
        .parse()
        .with_context(|| format!("Invalid reps in '{set}'"))?;
    if !weight.is_finite() || weight < 0.0 {
        bail!("Weight must be a non-negative number in '{set}'");
    }
    Ok(SetRecord::new(weight, reps))
}

pub async fn execute(args: WorkoutArgs, user_id: &str, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    match args.command {
        WorkoutCommands::Log {
            exercises,
            at,
            incomplete,
        } => {
            let timestamp = match at {
                Some(at) => DateTime::parse_from_rfc3339(&at)
                    .with_context(|| format!("Invalid timestamp: {at}"))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };
            let mut workout = WorkoutLog::new(user_id, timestamp);
            workout.completed = !incomplete;
            for arg in &exercises {
                workout.exercises.push(parse_exercise(arg)?);
            }
            ctx.workouts.save(&workout).await?;

            let alerts_resolved = if workout.completed {
                let names: Vec<String> = workout
                    .exercises
                    .iter()
                    .map(|e| e.exercise_name.clone())
                    .collect();
                ctx.service.handle_workout_completed(user_id, &names).await?
            } else {
                0
            };

            let out = WorkoutLoggedOutput {
                workout: WorkoutOutput::from(&workout),
                alerts_resolved,
            };
            output(&out, json_mode);
        }

        WorkoutCommands::List { limit } => {
            let workouts = ctx.workouts.recent(user_id, limit).await?;
            let out = WorkoutListOutput {
                total: workouts.len(),
                workouts: workouts.iter().map(WorkoutOutput::from).collect(),
            };
            output(&out, json_mode);
        }

        WorkoutCommands::Delete { id } => {
            ctx.workouts.delete(&id).await?;
            output(&MessageOutput::ok(format!("Workout deleted: {id}")), json_mode);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exercise() {
        let entry = parse_exercise("Bench Press = 60x8, 62.5x6,60X8").unwrap();
        assert_eq!(entry.exercise_name, "Bench Press");
        assert_eq!(entry.sets.len(), 3);
        assert!((entry.sets[1].weight - 62.5).abs() < f64::EPSILON);
        assert_eq!(entry.sets[1].reps, 6);
        assert!(entry.sets.iter().all(|s| s.completed));
    }

    #[test]
    fn test_parse_exercise_rejects_malformed_input() {
        assert!(parse_exercise("Squat 100x5").is_err());
        assert!(parse_exercise("=100x5").is_err());
        assert!(parse_exercise("Squat=").is_err());
        assert!(parse_exercise("Squat=100-5").is_err());
        assert!(parse_exercise("Squat=-10x5").is_err());
        assert!(parse_exercise("Squat=heavyx5").is_err());
    }
}
