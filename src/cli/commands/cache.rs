//! Suggestion cache CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::adapters::cache::CacheStats;
use crate::cli::context::AppContext;
use crate::cli::output::{format_percent, output, CommandOutput, MessageOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cached suggestion counts
    Stats,
    /// Remove every cached suggestion for the user
    Clear,
    /// Remove expired entries for all users
    Prune,
}

#[derive(Debug, serde::Serialize)]
pub struct CacheStatsOutput {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub ttl_secs: u64,
}

impl CommandOutput for CacheStatsOutput {
    fn to_human(&self) -> String {
        [
            format!("Cached suggestions: {}", self.stats.total),
            format!("  valid:   {}", self.stats.valid),
            format!("  expired: {}", self.stats.expired),
            format!("Hit rate: {}", format_percent(self.stats.hit_rate)),
            format!("Lifetime: {}s", self.ttl_secs),
        ]
        .join("\n")
    }
}

pub async fn execute(args: CacheArgs, user_id: &str, config: Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    match args.command {
        CacheCommands::Stats => {
            let stats = ctx.cache.stats(user_id).await?;
            let out = CacheStatsOutput {
                stats,
                ttl_secs: ctx.config.cache.suggestion_ttl_secs,
            };
            output(&out, json_mode);
        }
        CacheCommands::Clear => {
            let removed = ctx.cache.clear_user(user_id).await?;
            output(&MessageOutput::ok(format!("Removed {removed} cached suggestion(s)")), json_mode);
        }
        CacheCommands::Prune => {
            let removed = ctx.cache.clear_expired().await?;
            output(&MessageOutput::ok(format!("Removed {removed} expired cache entries")), json_mode);
        }
    }

    Ok(())
}
