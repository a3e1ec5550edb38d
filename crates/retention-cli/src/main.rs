//! retention - コメント IP 保持ポリシーの CLI ホスト
//!
//! JSON の state ファイルをサイトに見立てて、
//! 設定の変更・一回分の削除・常駐スケジューラを提供します。

mod config;
mod host;
mod logging;
mod state;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use retention_core::app::{BuildError, PurgeOutcome};
use retention_core::domain::RetentionError;
use tracing::{error, info};

use crate::config::{CliConfig, ConfigError};
use crate::host::Host;
use crate::state::{Site, SiteState, StateError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Retention(#[from] RetentionError),

    #[error("cannot encode status: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "retention", version, about = "Comment IP retention for a JSON site state")]
struct Cli {
    /// TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// State file; overrides `[storage] state`.
    #[arg(short, long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the policy, next run and eligible comment count.
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Run one purge batch now.
    Purge,
    /// Activate and keep firing due jobs until Ctrl-C.
    Serve {
        #[arg(long, default_value_t = 1)]
        tick_secs: u64,
    },
    /// Validated write of one policy field.
    Set { field: Field, value: String },
    /// Remove the stored policy (defaults return).
    Clear,
    /// Activation hook: reconcile the job and show the one-time notice.
    Activate,
    /// Deactivation hook: remove the job.
    Deactivate,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Field {
    Mode,
    Period,
    Unit,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = CliConfig::load(cli.config.as_deref())?;
    logging::init(&config.logging);

    let state_path = cli.state.unwrap_or(config.storage.state.clone());
    let site = Site::open(SiteState::load(&state_path)?, config.processor.clone())?;
    let service = &site.service;

    match cli.command {
        Command::Status { json } => {
            let status = service.status()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                let unit = status
                    .policy
                    .period_unit
                    .map(|u| u.as_str())
                    .unwrap_or("<unrecognised>");
                println!("mode:       {}", status.policy.mode);
                println!("period:     {} {}", status.policy.period, unit);
                println!("retention:  {}s", status.retention_seconds);
                match status.next_run_at {
                    Some(at) => println!("next run:   {}", at.to_rfc3339()),
                    None => println!("next run:   -"),
                }
                match status.eligible {
                    Some(n) => println!("eligible:   {n}"),
                    None => println!("eligible:   -"),
                }
            }
            // 状態は変わらないので保存しない
            return Ok(());
        }
        Command::Purge => match service.run_once() {
            PurgeOutcome::Skipped(reason) => println!("skipped: {reason:?}"),
            PurgeOutcome::Completed {
                run_id,
                eligible,
                purged,
                failed,
                follow_up_scheduled,
            } => {
                println!("run {run_id}: purged {purged} of {eligible} eligible ({failed} failed)");
                if follow_up_scheduled {
                    println!("backlog remains; follow-up scheduled");
                }
            }
        },
        Command::Serve { tick_secs } => {
            let tick = Duration::from_secs(tick_secs.max(1));
            info!(path = %state_path.display(), tick_secs = tick.as_secs(), "serving");
            return Host::new(Arc::new(site), state_path, tick).serve().await;
        }
        Command::Set { field, value } => match field {
            Field::Mode => println!("{}", service.set_mode(&value)?),
            Field::Period => println!("{}", service.set_period(&value)?),
            Field::Unit => match service.set_period_unit(&value)? {
                Some(unit) => println!("{unit}"),
                None => println!("<unrecognised>"),
            },
        },
        Command::Clear => service.clear_policy()?,
        Command::Activate => {
            service.on_activate()?;
            if let Some(notice) = service.take_activation_notice()? {
                println!("{} ({})", notice.message, notice.settings_anchor);
            }
        }
        Command::Deactivate => service.on_deactivate()?,
    }

    site.save(&state_path)?;
    Ok(())
}
