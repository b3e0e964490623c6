//! Campaign CLI commands (spec §4.7, §4.8 Campaign Manager).

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use crate::domain::models::{CampaignConfig, CampaignMode};
use crate::domain::ports::CampaignFilter;

use super::{parse_uuid, AppContext};
use crate::cli::display::{
    action_success, create_spinner, list_table, output, render_list, short_id, CommandOutput,
    DetailView, ProgressBarExt,
};

#[derive(Args, Debug)]
pub struct CampaignArgs {
    #[command(subcommand)]
    pub command: CampaignCommands,
}

#[derive(Subcommand, Debug)]
pub enum CampaignCommands {
    /// Create a campaign and materialize its bot swarm
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        target_token: String,
        #[arg(long)]
        target_volume_24h: u64,
        #[arg(long)]
        target_tx_count_24h: u64,
        #[arg(long)]
        duration_hours: u32,
        #[arg(long)]
        bot_count: u32,
        #[arg(long, default_value = "moderate")]
        mode: String,
        #[arg(long)]
        wallet_funding_amount: u64,
        /// Wallet ids, exactly `bot_count` of them
        #[arg(long, required = true)]
        wallet_id: Vec<String>,
    },
    /// Activate a draft or paused campaign
    Start { id: String },
    /// Pause an active campaign
    Pause { id: String },
    /// Stop a campaign
    Stop { id: String },
    /// Remove a campaign and its bots
    Remove { id: String },
    /// Adjust campaign interval/size by percentage deltas
    Adjust {
        id: String,
        #[arg(long, default_value = "0.0")]
        interval_delta_pct: f64,
        #[arg(long, default_value = "0.0")]
        size_delta_pct: f64,
    },
    /// Shrink a campaign's bot count
    Shrink { id: String, count: u32 },
    /// List campaigns
    List {
        #[arg(long)]
        state: Option<String>,
    },
    /// Show campaign metrics
    Show { id: String },
    /// Aggregate stats across all active campaigns
    Stats,
}

fn parse_mode(s: &str) -> Result<CampaignMode> {
    Ok(match s.to_lowercase().as_str() {
        "aggressive" => CampaignMode::Aggressive,
        "moderate" => CampaignMode::Moderate,
        "stealth" => CampaignMode::Stealth,
        other => bail!("unknown campaign mode: {other}"),
    })
}

fn parse_state(s: &str) -> Result<crate::domain::models::CampaignState> {
    use crate::domain::models::CampaignState;
    Ok(match s.to_lowercase().as_str() {
        "draft" => CampaignState::Draft,
        "active" => CampaignState::Active,
        "paused" => CampaignState::Paused,
        "completed" => CampaignState::Completed,
        "failed" => CampaignState::Failed,
        other => bail!("unknown campaign state: {other}"),
    })
}

#[derive(Debug, serde::Serialize)]
struct CampaignRow {
    id: String,
    name: String,
    state: String,
    bot_count: usize,
    total_volume: u64,
    tx_count: u64,
    progress_pct: f64,
}

#[derive(Debug, serde::Serialize)]
struct CampaignListOutput {
    campaigns: Vec<CampaignRow>,
    total: usize,
}

impl CommandOutput for CampaignListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["ID", "Name", "State", "Bots", "Volume", "Txs", "Progress"]);
        for c in &self.campaigns {
            table.add_row([
                short_id(&c.id).to_string(),
                c.name.clone(),
                c.state.clone(),
                c.bot_count.to_string(),
                c.total_volume.to_string(),
                c.tx_count.to_string(),
                format!("{:.1}%", c.progress_pct),
            ]);
        }
        render_list("campaign", table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
struct CampaignActionOutput {
    message: String,
}

impl CommandOutput for CampaignActionOutput {
    fn to_human(&self) -> String {
        action_success(&self.message)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
struct StatsOutput {
    active_campaigns: u64,
    total_volume: u64,
    total_tx_count: u64,
    total_bots: u64,
}

impl CommandOutput for StatsOutput {
    fn to_human(&self) -> String {
        format!(
            "Active campaigns: {}\nTotal volume: {}\nTotal transactions: {}\nTotal bots: {}",
            self.active_campaigns, self.total_volume, self.total_tx_count, self.total_bots
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[allow(clippy::too_many_lines)]
pub async fn execute(args: CampaignArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    match args.command {
        CampaignCommands::Create {
            name,
            target_token,
            target_volume_24h,
            target_tx_count_24h,
            duration_hours,
            bot_count,
            mode,
            wallet_funding_amount,
            wallet_id,
        } => {
            let config = CampaignConfig {
                name,
                target_token,
                target_volume_24h,
                target_tx_count_24h,
                duration_hours,
                bot_count,
                mode: parse_mode(&mode)?,
                wallet_tag: None,
                wallet_funding_amount,
            };
            let spinner = create_spinner("materializing campaign bot swarm...");
            let id = match ctx.campaigns.create_campaign(config, wallet_id).await {
                Ok(id) => {
                    spinner.finish_success(format!("campaign {id} created"));
                    id
                }
                Err(e) => {
                    spinner.finish_error("campaign creation failed");
                    return Err(e.into());
                }
            };
            output(&CampaignActionOutput { message: format!("Campaign created: {id}") }, json_mode);
        }
        CampaignCommands::Start { id } => {
            ctx.campaigns.start(parse_uuid(&id)?).await?;
            output(&CampaignActionOutput { message: format!("Campaign {id} started") }, json_mode);
        }
        CampaignCommands::Pause { id } => {
            ctx.campaigns.pause(parse_uuid(&id)?).await?;
            output(&CampaignActionOutput { message: format!("Campaign {id} paused") }, json_mode);
        }
        CampaignCommands::Stop { id } => {
            ctx.campaigns.stop(parse_uuid(&id)?).await?;
            output(&CampaignActionOutput { message: format!("Campaign {id} stopped") }, json_mode);
        }
        CampaignCommands::Remove { id } => {
            ctx.campaigns.remove(parse_uuid(&id)?).await?;
            output(&CampaignActionOutput { message: format!("Campaign {id} removed") }, json_mode);
        }
        CampaignCommands::Adjust { id, interval_delta_pct, size_delta_pct } => {
            ctx.campaigns
                .adjust_params(parse_uuid(&id)?, interval_delta_pct, size_delta_pct)
                .await?;
            output(&CampaignActionOutput { message: format!("Campaign {id} adjusted") }, json_mode);
        }
        CampaignCommands::Shrink { id, count } => {
            ctx.campaigns.shrink(parse_uuid(&id)?, count).await?;
            output(
                &CampaignActionOutput { message: format!("Campaign {id} shrunk by {count} bot(s)") },
                json_mode,
            );
        }
        CampaignCommands::List { state } => {
            let filter = CampaignFilter { state: state.as_deref().map(parse_state).transpose()? };
            let campaigns = ctx.campaigns.list(filter).await?;
            let out = CampaignListOutput {
                total: campaigns.len(),
                campaigns: campaigns
                    .iter()
                    .map(|c| CampaignRow {
                        id: c.id.to_string(),
                        name: c.config.name.clone(),
                        state: format!("{:?}", c.state).to_lowercase(),
                        bot_count: c.bot_ids.len(),
                        total_volume: c.metrics.total_volume,
                        tx_count: c.metrics.tx_count,
                        progress_pct: c.metrics.progress_percent(c.config.target_volume_24h),
                    })
                    .collect(),
            };
            output(&out, json_mode);
        }
        CampaignCommands::Show { id } => {
            let campaign = ctx.campaigns.get_metrics(parse_uuid(&id)?).await?;
            let out = CampaignRow {
                id: campaign.id.to_string(),
                name: campaign.config.name.clone(),
                state: format!("{:?}", campaign.state).to_lowercase(),
                bot_count: campaign.bot_ids.len(),
                total_volume: campaign.metrics.total_volume,
                tx_count: campaign.metrics.tx_count,
                progress_pct: campaign.metrics.progress_percent(campaign.config.target_volume_24h),
            };
            output(&SingleCampaign(out), json_mode);
        }
        CampaignCommands::Stats => {
            let stats = ctx.campaigns.get_aggregate_stats().await?;
            output(
                &StatsOutput {
                    active_campaigns: stats.active_campaigns,
                    total_volume: stats.total_volume,
                    total_tx_count: stats.total_tx_count,
                    total_bots: stats.total_bots,
                },
                json_mode,
            );
        }
    }
    Ok(())
}

struct SingleCampaign(CampaignRow);

impl serde::Serialize for SingleCampaign {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl CommandOutput for SingleCampaign {
    fn to_human(&self) -> String {
        DetailView::new(&format!("Campaign: {}", self.0.name))
            .field("ID", &self.0.id)
            .field("State", &self.0.state)
            .field("Bots", &self.0.bot_count.to_string())
            .field("Volume", &self.0.total_volume.to_string())
            .field("Transactions", &self.0.tx_count.to_string())
            .field("Progress", &format!("{:.1}%", self.0.progress_pct))
            .render()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or_default()
    }
}
