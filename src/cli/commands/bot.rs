//! Bot CLI commands (spec §4.6 Bot Coordinator).

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use crate::domain::models::{BehaviorProfile, BotConfig, BotMode, ProfileName};
use crate::domain::ports::BotFilter;

use super::{parse_uuid, AppContext};
use crate::cli::display::{
    action_success, create_spinner, list_table, output, relative_time_opt, render_list, short_id,
    CommandOutput, DetailView, ProgressBarExt,
};

#[derive(Args, Debug)]
pub struct BotArgs {
    #[command(subcommand)]
    pub command: BotCommands,
}

#[derive(Subcommand, Debug)]
pub enum BotCommands {
    /// Create a single bot
    Create {
        #[arg(long)]
        wallet_id: String,
        #[arg(long)]
        target_token: String,
        #[arg(long, default_value = "volume")]
        mode: String,
        #[arg(long, default_value = "retail")]
        profile: String,
        #[arg(long)]
        min_trade_size: u64,
        #[arg(long)]
        max_trade_size: u64,
        #[arg(long)]
        min_interval_ms: u64,
        #[arg(long)]
        max_interval_ms: u64,
        #[arg(long, default_value = "0.5")]
        buy_probability: f64,
        #[arg(long, default_value = "1000")]
        max_daily_trades: u64,
        #[arg(long, default_value = "1000000000")]
        max_daily_volume: u64,
    },
    /// Create a swarm of bots sharing a base config
    Swarm {
        #[arg(long)]
        target_token: String,
        #[arg(long, default_value = "volume")]
        mode: String,
        #[arg(long)]
        min_trade_size: u64,
        #[arg(long)]
        max_trade_size: u64,
        #[arg(long)]
        min_interval_ms: u64,
        #[arg(long)]
        max_interval_ms: u64,
        /// Wallet ids, one bot per wallet
        #[arg(long, required = true)]
        wallet_id: Vec<String>,
    },
    /// Start a bot
    Start { id: String },
    /// Pause a bot
    Pause { id: String },
    /// Stop a bot
    Stop { id: String },
    /// Remove a bot permanently
    Remove { id: String },
    /// List bots
    List {
        #[arg(long)]
        state: Option<String>,
    },
    /// Show bot status
    Show { id: String },
}

fn parse_mode(s: &str) -> Result<BotMode> {
    Ok(match s.to_lowercase().as_str() {
        "volume" => BotMode::Volume,
        "market_make" | "market-make" => BotMode::MarketMake,
        "accumulate" => BotMode::Accumulate,
        "distribute" => BotMode::Distribute,
        other => bail!("unknown bot mode: {other}"),
    })
}

fn parse_profile(s: &str) -> Result<ProfileName> {
    Ok(match s.to_lowercase().as_str() {
        "retail" => ProfileName::Retail,
        "whale" => ProfileName::Whale,
        "market_maker" | "market-maker" => ProfileName::MarketMaker,
        "stealth" => ProfileName::Stealth,
        "aggressive" => ProfileName::Aggressive,
        "conservative" => ProfileName::Conservative,
        other => bail!("unknown profile: {other}"),
    })
}

fn parse_state(s: &str) -> Result<crate::domain::models::BotState> {
    use crate::domain::models::BotState;
    Ok(match s.to_lowercase().as_str() {
        "idle" => BotState::Idle,
        "running" => BotState::Running,
        "paused" => BotState::Paused,
        "stopped" => BotState::Stopped,
        "error" => BotState::Error,
        other => bail!("unknown bot state: {other}"),
    })
}

#[derive(Debug, serde::Serialize)]
struct BotRow {
    id: String,
    wallet_id: String,
    state: String,
    trades_completed: u64,
    volume_generated: u64,
    last_active: String,
}

#[derive(Debug, serde::Serialize)]
struct BotListOutput {
    bots: Vec<BotRow>,
    total: usize,
}

impl CommandOutput for BotListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["ID", "Wallet", "State", "Trades", "Volume", "Last active"]);
        for bot in &self.bots {
            table.add_row([
                short_id(&bot.id).to_string(),
                bot.wallet_id.clone(),
                bot.state.clone(),
                bot.trades_completed.to_string(),
                bot.volume_generated.to_string(),
                bot.last_active.clone(),
            ]);
        }
        render_list("bot", table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
struct BotActionOutput {
    message: String,
}

impl CommandOutput for BotActionOutput {
    fn to_human(&self) -> String {
        action_success(&self.message)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[allow(clippy::too_many_lines)]
pub async fn execute(args: BotArgs, ctx: &AppContext, json_mode: bool) -> Result<()> {
    match args.command {
        BotCommands::Create {
            wallet_id,
            target_token,
            mode,
            profile,
            min_trade_size,
            max_trade_size,
            min_interval_ms,
            max_interval_ms,
            buy_probability,
            max_daily_trades,
            max_daily_volume,
        } => {
            let config = BotConfig {
                wallet_id,
                target_token,
                mode: parse_mode(&mode)?,
                min_trade_size,
                max_trade_size,
                min_interval_ms,
                max_interval_ms,
                buy_probability,
                max_daily_trades,
                max_daily_volume,
                enabled: true,
                profile: parse_profile(&profile)?,
            };
            let id = ctx.bots.create_bot(config).await?;
            output(&BotActionOutput { message: format!("Bot created: {id}") }, json_mode);
        }
        BotCommands::Swarm {
            target_token,
            mode,
            min_trade_size,
            max_trade_size,
            min_interval_ms,
            max_interval_ms,
            wallet_id,
        } => {
            let base_config = BotConfig {
                wallet_id: String::new(),
                target_token,
                mode: parse_mode(&mode)?,
                min_trade_size,
                max_trade_size,
                min_interval_ms,
                max_interval_ms,
                buy_probability: 0.5,
                max_daily_trades: u64::MAX,
                max_daily_volume: u64::MAX,
                enabled: true,
                profile: ProfileName::Retail,
            };
            let spinner = create_spinner(format!("materializing {} bot(s)...", wallet_id.len()));
            let result = ctx
                .bots
                .create_bot_swarm(&base_config, wallet_id, Some(BehaviorProfile::default_swarm_weights()))
                .await;
            let ids = match result {
                Ok(ids) => {
                    spinner.finish_success(format!("created {} bots", ids.len()));
                    ids
                }
                Err(e) => {
                    spinner.finish_error("bot swarm creation failed");
                    return Err(e.into());
                }
            };
            output(
                &BotActionOutput { message: format!("Created {} bots", ids.len()) },
                json_mode,
            );
        }
        BotCommands::Start { id } => {
            ctx.bots.start_bot(parse_uuid(&id)?).await?;
            output(&BotActionOutput { message: format!("Bot {id} started") }, json_mode);
        }
        BotCommands::Pause { id } => {
            ctx.bots.pause_bot(parse_uuid(&id)?).await?;
            output(&BotActionOutput { message: format!("Bot {id} paused") }, json_mode);
        }
        BotCommands::Stop { id } => {
            ctx.bots.stop_bot(parse_uuid(&id)?).await?;
            output(&BotActionOutput { message: format!("Bot {id} stopped") }, json_mode);
        }
        BotCommands::Remove { id } => {
            ctx.bots.remove(parse_uuid(&id)?).await?;
            output(&BotActionOutput { message: format!("Bot {id} removed") }, json_mode);
        }
        BotCommands::List { state } => {
            let filter = BotFilter {
                state: state.as_deref().map(parse_state).transpose()?,
                campaign_id: None,
            };
            let bots = ctx.bots.list_bots(filter).await?;
            let out = BotListOutput {
                total: bots.len(),
                bots: bots
                    .iter()
                    .map(|b| BotRow {
                        id: b.id.to_string(),
                        wallet_id: b.status.wallet_id.clone(),
                        state: format!("{:?}", b.status.state).to_lowercase(),
                        trades_completed: b.status.trades_completed,
                        volume_generated: b.status.volume_generated,
                        last_active: relative_time_opt(b.status.last_active.as_ref()),
                    })
                    .collect(),
            };
            output(&out, json_mode);
        }
        BotCommands::Show { id } => {
            let status = ctx.bots.get_bot_status(parse_uuid(&id)?).await?;
            let out = BotRow {
                id: id.clone(),
                wallet_id: status.wallet_id,
                state: format!("{:?}", status.state).to_lowercase(),
                trades_completed: status.trades_completed,
                volume_generated: status.volume_generated,
                last_active: relative_time_opt(status.last_active.as_ref()),
            };
            output(&SingleBot(out), json_mode);
        }
    }
    Ok(())
}

struct SingleBot(BotRow);

impl serde::Serialize for SingleBot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl CommandOutput for SingleBot {
    fn to_human(&self) -> String {
        DetailView::new(&format!("Bot {}", self.0.id))
            .field("Wallet", &self.0.wallet_id)
            .field("State", &self.0.state)
            .field("Trades completed", &self.0.trades_completed.to_string())
            .field("Volume generated", &self.0.volume_generated.to_string())
            .field("Last active", &self.0.last_active)
            .render()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or_default()
    }
}
