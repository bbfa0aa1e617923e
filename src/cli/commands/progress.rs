//! Progression CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::output::{format_percent, format_weight, output, CommandOutput};
use crate::cli::table::{list_table, render_list};
use crate::domain::models::{Config, ProgressionAnalysis, SuggestionResult};

#[derive(Args, Debug)]
pub struct ProgressArgs {
    #[command(subcommand)]
    pub command: ProgressCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProgressCommands {
    /// Analyze progression trends
    Analyze {
        /// Only this exercise (defaults to every exercise in recent history)
        exercise: Option<String>,
    },
    /// Suggest the next session for an exercise
    Next {
        /// Exercise name
        exercise: String,
    },
    /// Suggest the next session for several exercises at once
    Batch {
        /// Exercise names
        #[arg(required = true)]
        exercises: Vec<String>,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct AnalysisListOutput {
    pub analyses: Vec<ProgressionAnalysis>,
    pub total: usize,
}

impl CommandOutput for AnalysisListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["exercise", "weight", "reps", "sets", "trend", "rate", "confidence", "sessions"]);
        for a in &self.analyses {
            table.add_row(vec![
                a.exercise_id.clone(),
                format_weight(a.current_weight),
                a.current_reps.to_string(),
                a.current_sets.to_string(),
                a.progression_trend.as_str().to_string(),
                format!("{:+.1} kg/wk", a.progression_rate),
                format_percent(a.confidence_level),
                a.total_sessions.to_string(),
            ]);
        }
        render_list("exercise", &table, self.total)
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SuggestionOutput {
    pub result: SuggestionResult,
}

impl CommandOutput for SuggestionOutput {
    fn to_human(&self) -> String {
        describe(&self.result)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.result).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct BatchOutput {
    pub results: Vec<SuggestionResult>,
}

impl CommandOutput for BatchOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["exercise", "current", "next", "type", "confidence", "source"]);
        for result in &self.results {
            let s = result.suggestion();
            table.add_row(vec![
                s.exercise_id.clone(),
                format_weight(s.current_weight),
                format!("{} x {} x {}", format_weight(s.suggested_weight), s.suggested_sets, s.suggested_reps),
                s.progression_type.as_str().to_string(),
                format_percent(result.confidence()),
                source(result),
            ]);
        }
        render_list("suggestion", &table, self.results.len())
    }
}

fn source(result: &SuggestionResult) -> String {
    match (result.is_combined(), result.fallback_reason()) {
        (true, _) => "combined".to_string(),
        (false, Some(reason)) => format!("rules ({})", reason.as_str()),
        (false, None) => "rules".to_string(),
    }
}

/// Multi-line human description of one suggestion.
pub fn describe(result: &SuggestionResult) -> String {
    let s = result.suggestion();
    let mut lines = vec![
        format!("Exercise: {}", s.exercise_id),
        format!(
            "Next session: {} x {} sets x {} reps ({})",
            format_weight(s.suggested_weight),
            s.suggested_sets,
            s.suggested_reps,
            s.progression_type.as_str()
        ),
        format!("Current weight: {}", format_weight(s.current_weight)),
        format!("Confidence: {}", format_percent(result.confidence())),
        format!("Source: {}", source(result)),
        format!("Reasoning: {}", s.reasoning),
    ];

    if let SuggestionResult::RuleBased(rule) = result {
        if let Some(notice) = &rule.notice {
            lines.push(format!("Note: {notice}"));
        }
    }
    if !s.alternative_options.is_empty() {
        lines.push("\nAlternatives:".to_string());
        for alt in &s.alternative_options {
            lines.push(format!(
                "  - {} x {} [{}] {}",
                format_weight(alt.weight),
                alt.reps,
                alt.priority.as_str(),
                alt.reasoning
            ));
        }
    }
    if !result.tips().is_empty() {
        lines.push("\nTips:".to_string());
        lines.extend(result.tips().iter().map(|t| format!("  - {t}")));
    }
    if !result.risk_notes().is_empty() {
        lines.push("\nWatch out:".to_string());
        lines.extend(result.risk_notes().iter().map(|r| format!("  - {r}")));
    }
    lines.join("\n")
}

pub async fn execute(args: ProgressArgs, user_id: &str, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    match args.command {
        ProgressCommands::Analyze { exercise } => {
            let analyses = match exercise {
                Some(exercise) => vec![ctx.service.analyze_exercise_history(user_id, &exercise).await?],
                None => ctx.service.analyze_workout_history(user_id).await?,
            };
            let out = AnalysisListOutput {
                total: analyses.len(),
                analyses,
            };
            output(&out, json_mode);
        }

        ProgressCommands::Next { exercise } => {
            let result = ctx.service.calculate_next_progression(user_id, &exercise).await?;
            output(&SuggestionOutput { result }, json_mode);
        }

        ProgressCommands::Batch { exercises } => {
            let results = ctx.service.calculate_batch_progressions(user_id, &exercises).await?;
            output(&BatchOutput { results }, json_mode);
        }
    }

    Ok(())
}
