//! Suggestion feedback CLI commands.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

use crate::cli::context::AppContext;
use crate::cli::output::{format_percent, output, CommandOutput, MessageOutput};
use crate::domain::models::{Config, InteractionAction, SuggestionEffectiveness};

#[derive(Args, Debug)]
pub struct SuggestionArgs {
    #[command(subcommand)]
    pub command: SuggestionCommands,
}

#[derive(Subcommand, Debug)]
pub enum SuggestionCommands {
    /// Record what you did with a suggestion
    Track {
        /// Exercise name
        exercise: String,
        /// accepted, dismissed, modified, or viewed
        action: String,
        /// Extra details as a JSON object
        #[arg(short, long)]
        metadata: Option<String>,
    },
    /// Show suggestion acceptance statistics
    Stats,
}

#[derive(Debug, serde::Serialize)]
pub struct EffectivenessOutput {
    #[serde(flatten)]
    pub stats: SuggestionEffectiveness,
}

impl CommandOutput for EffectivenessOutput {
    fn to_human(&self) -> String {
        let s = &self.stats;
        let mut lines = vec![
            format!("Responses: {}", s.total_suggestions),
            format!("  accepted:  {}", s.accepted),
            format!("  dismissed: {}", s.dismissed),
            format!("  modified:  {}", s.modified),
            format!("Acceptance rate: {}", format_percent(s.acceptance_rate)),
            format!("Dismissal rate: {}", format_percent(s.dismissal_rate)),
            format!("Effectiveness: {}", format_percent(s.effectiveness_score)),
        ];
        if !s.recommendations.is_empty() {
            lines.push("\nRecommendations:".to_string());
            lines.extend(s.recommendations.iter().map(|r| format!("  - {r}")));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: SuggestionArgs, user_id: &str, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    match args.command {
        SuggestionCommands::Track {
            exercise,
            action,
            metadata,
        } => {
            let action = InteractionAction::from_str(&action)
                .ok_or_else(|| anyhow!("Invalid action: {action}"))?;
            let metadata = match metadata {
                Some(raw) => serde_json::from_str(&raw).context("Metadata must be valid JSON")?,
                None => Value::Null,
            };
            ctx.service
                .track_suggestion_interaction(user_id, &exercise, action, metadata)
                .await;
            let out = MessageOutput::ok(format!("Recorded {} for {exercise}", action.as_str()));
            output(&out, json_mode);
        }

        SuggestionCommands::Stats => {
            let stats = ctx.service.suggestion_effectiveness(user_id).await?;
            output(&EffectivenessOutput { stats }, json_mode);
        }
    }

    Ok(())
}
