//! Plateau CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::output::{format_percent, output, truncate, CommandOutput, MessageOutput};
use crate::cli::table::{list_table, render_list};
use crate::domain::models::{Config, InterventionSuggestion, PlateauAlert, PlateauDetection};

#[derive(Args, Debug)]
pub struct PlateauArgs {
    #[command(subcommand)]
    pub command: PlateauCommands,
}

#[derive(Subcommand, Debug)]
pub enum PlateauCommands {
    /// Detect plateaued exercises
    Detect {
        /// Also create plateau alerts for what was found
        #[arg(long)]
        notify: bool,
    },
    /// Suggest interventions for a plateaued exercise
    Interventions {
        /// Exercise name
        exercise: String,
    },
    /// List active plateau alerts
    Alerts,
    /// Acknowledge an alert
    Ack {
        /// Alert ID
        id: String,
    },
    /// Dismiss an alert
    Dismiss {
        /// Alert ID
        id: String,
        /// Why the alert is being dismissed
        #[arg(short, long)]
        reason: Option<String>,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct PlateauListOutput {
    pub plateaus: Vec<PlateauDetection>,
    pub alerts_created: Vec<PlateauAlert>,
}

impl CommandOutput for PlateauListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["exercise", "sessions", "type", "severity", "confidence"]);
        for p in &self.plateaus {
            table.add_row(vec![
                p.exercise_id.clone(),
                p.plateau_duration.to_string(),
                p.plateau_type.as_str().to_string(),
                p.severity.as_str().to_string(),
                format_percent(p.confidence_level),
            ]);
        }
        let mut rendered = render_list("plateau", &table, self.plateaus.len());
        if !self.alerts_created.is_empty() {
            rendered.push_str(&format!("\n\nCreated {} alert(s).", self.alerts_created.len()));
        }
        rendered
    }
}

#[derive(Debug, serde::Serialize)]
pub struct InterventionListOutput {
    pub exercise: String,
    pub plateau: Option<PlateauDetection>,
    pub interventions: Vec<InterventionSuggestion>,
}

impl CommandOutput for InterventionListOutput {
    fn to_human(&self) -> String {
        let Some(plateau) = &self.plateau else {
            return format!("{} is not plateaued.", self.exercise);
        };
        let mut lines = vec![format!(
            "{}: {} plateau ({}) for {} sessions\n",
            self.exercise,
            plateau.plateau_type.as_str(),
            plateau.severity.as_str(),
            plateau.plateau_duration
        )];
        for (i, item) in self.interventions.iter().enumerate() {
            lines.push(format!(
                "{}. {} [{}, {} effective]",
                i + 1,
                item.title,
                item.priority.as_str(),
                format_percent(item.estimated_effectiveness)
            ));
            lines.push(format!("   {}", item.description));
            lines.push(format!("   Expected: {}", item.expected_outcome));
        }
        lines.join("\n")
    }
}

#[derive(Debug, serde::Serialize)]
pub struct AlertListOutput {
    pub alerts: Vec<PlateauAlert>,
}

impl CommandOutput for AlertListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "exercise", "severity", "status", "message"]);
        for alert in &self.alerts {
            table.add_row(vec![
                alert.id.chars().take(8).collect::<String>(),
                alert.exercise_id.clone(),
                alert.severity.as_str().to_string(),
                alert.status.as_str().to_string(),
                truncate(&alert.message, 60),
            ]);
        }
        render_list("alert", &table, self.alerts.len())
    }
}

/// Full alert ids are UUIDs; the list view shows the first eight characters.
async fn resolve_alert_id(ctx: &AppContext, user_id: &str, id: &str) -> Result<Option<String>> {
    let alerts = ctx.service.plateau_alerts(user_id).await?;
    let matches: Vec<&PlateauAlert> = alerts.iter().filter(|a| a.id.starts_with(id)).collect();
    match matches.as_slice() {
        [alert] => Ok(Some(alert.id.clone())),
        [] => Ok(None),
        _ => anyhow::bail!("Alert id '{id}' is ambiguous; use more characters"),
    }
}

pub async fn execute(args: PlateauArgs, user_id: &str, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    match args.command {
        PlateauCommands::Detect { notify } => {
            let plateaus = ctx.service.detect_plateaus(user_id).await?;
            let alerts_created = if notify {
                ctx.service
                    .create_plateau_warning_notifications(user_id, &plateaus)
                    .await
            } else {
                Vec::new()
            };
            output(&PlateauListOutput { plateaus, alerts_created }, json_mode);
        }

        PlateauCommands::Interventions { exercise } => {
            let plateau = ctx
                .service
                .detect_plateaus(user_id)
                .await?
                .into_iter()
                .find(|p| p.exercise_id == exercise);
            let interventions = match &plateau {
                Some(p) => ctx.service.suggest_plateau_interventions(p, Some(user_id)).await,
                None => Vec::new(),
            };
            let out = InterventionListOutput {
                exercise,
                plateau,
                interventions,
            };
            output(&out, json_mode);
        }

        PlateauCommands::Alerts => {
            let alerts = ctx.service.active_plateau_alerts(user_id).await?;
            output(&AlertListOutput { alerts }, json_mode);
        }

        PlateauCommands::Ack { id } => {
            let full_id = resolve_alert_id(&ctx, user_id, &id).await?.unwrap_or(id);
            let out = if ctx.service.acknowledge_plateau_alert(user_id, &full_id).await? {
                MessageOutput::ok(format!("Alert acknowledged: {full_id}"))
            } else {
                MessageOutput::failed(format!("Alert not found: {full_id}"))
            };
            output(&out, json_mode);
        }

        PlateauCommands::Dismiss { id, reason } => {
            let full_id = resolve_alert_id(&ctx, user_id, &id).await?.unwrap_or(id);
            let out = if ctx.service.dismiss_plateau_alert(user_id, &full_id, reason).await? {
                MessageOutput::ok(format!("Alert dismissed: {full_id}"))
            } else {
                MessageOutput::failed(format!("Alert not found: {full_id}"))
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}
