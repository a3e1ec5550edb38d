//! Host loop - CMS のスケジューラ役
//!
//! - 起動時に on_activate（ジョブの整合と案内の準備）
//! - `tick` ごとに期限の来たジョブを取り出して dispatch
//! - 実行があれば state を保存
//! - shutdown（Ctrl-C）で on_deactivate してから保存

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use retention_core::app::PurgeOutcome;
use retention_core::ports::Clock;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::state::Site;
use crate::CliError;

pub struct Host {
    site: Arc<Site>,
    state_path: PathBuf,
    tick: Duration,
}

impl Host {
    pub fn new(site: Arc<Site>, state_path: PathBuf, tick: Duration) -> Self {
        Self {
            site,
            state_path,
            tick,
        }
    }

    /// Runs until Ctrl-C.
    pub async fn serve(self) -> Result<(), CliError> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                // receiver may already be gone
                let _ = shutdown_tx.send(true);
            }
        });
        self.run(shutdown_rx).await
    }

    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), CliError> {
        let service = &self.site.service;
        service.on_activate()?;
        if let Some(notice) = service.take_activation_notice()? {
            info!(settings = notice.settings_anchor, "{}", notice.message);
        }
        self.site.save(&self.state_path)?;

        let mut interval = tokio::time::interval(self.tick);
        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    // sender dropped も停止扱い
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = interval.tick() => {}
            }

            if self.fire_due() > 0 {
                self.site.save(&self.state_path)?;
            }
        }

        service.on_deactivate()?;
        self.site.save(&self.state_path)?;
        info!(path = %self.state_path.display(), "host stopped");
        Ok(())
    }

    /// Dispatches every due job once. Returns how many ran.
    fn fire_due(&self) -> usize {
        let now = self.site.clock.now();
        match self.site.timer.next_wake() {
            Some(wake_at) if wake_at <= now => {}
            _ => return 0,
        }
        let due = self.site.timer.take_due(now);
        let mut ran = 0;
        for job in due {
            match self.site.service.dispatch(&job.action) {
                Some(PurgeOutcome::Skipped(reason)) => {
                    warn!(action = %job.action, ?reason, "run skipped");
                    ran += 1;
                }
                Some(outcome) => {
                    info!(action = %job.action, purged = outcome.purged(), "run finished");
                    ran += 1;
                }
                None => {}
            }
        }
        ran
    }
}
