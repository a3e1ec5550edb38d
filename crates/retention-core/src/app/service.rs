//! RetentionService - ホストから見た窓口
//!
//! # 学習ポイント
//! - Builder パターン（ポートの注入）
//! - 起動時検証（Fail-fast: 必須ポートが欠けていれば BuildError）
//! - mode の書き込みと schedule の再計算を 1 か所に集約
//!
//! # 使用例
//! ```ignore
//! let service = RetentionServiceBuilder::new()
//!     .settings_store(store)
//!     .comment_repository(repo)
//!     .timer(timer)
//!     .build()?;
//! service.on_activate()?;
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::app::config::ProcessorConfig;
use crate::app::notice::{ActivationNotice, Notice};
use crate::app::processor::{PurgeOutcome, PurgeProcessor};
use crate::app::schedule::ScheduleManager;
use crate::app::settings::PolicySettings;
use crate::domain::{
    EligibilityFilter, PURGE_ACTION, PeriodUnit, RetentionError, RetentionMode, RetentionPolicy,
};
use crate::ports::{
    Clock, CommentRepository, IdGenerator, SettingsStore, SystemClock, Timer, UlidGenerator,
};

/// BuildError はサービス構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing port: {0}. Register it on the builder before build().")]
    MissingPort(&'static str),

    #[error("invalid processor config: {0}")]
    InvalidConfig(&'static str),
}

/// RetentionServiceBuilder は ports を受け取ってサービスを組み立てる
///
/// Clock と IdGenerator は省略可能（SystemClock / UlidGenerator）。
#[derive(Default)]
pub struct RetentionServiceBuilder {
    settings_store: Option<Arc<dyn SettingsStore>>,
    repository: Option<Arc<dyn CommentRepository>>,
    timer: Option<Arc<dyn Timer>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    config: ProcessorConfig,
}

impl RetentionServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn comment_repository(mut self, repository: Arc<dyn CommentRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = Some(timer);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    /// # 検証
    /// - SettingsStore / CommentRepository / Timer は必須
    /// - ProcessorConfig の範囲（[`ProcessorConfig::validate`]）
    pub fn build(self) -> Result<RetentionService, BuildError> {
        self.config.validate().map_err(BuildError::InvalidConfig)?;
        let store = self
            .settings_store
            .ok_or(BuildError::MissingPort("settings_store"))?;
        let repository = self
            .repository
            .ok_or(BuildError::MissingPort("comment_repository"))?;
        let timer = self.timer.ok_or(BuildError::MissingPort("timer"))?;
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let ids: Arc<dyn IdGenerator> = match self.ids {
            Some(ids) => ids,
            None => Arc::new(UlidGenerator::new(clock.clone())),
        };

        let settings = PolicySettings::new(store);
        let schedule =
            ScheduleManager::new(settings.clone(), timer, clock.clone(), self.config.clone());
        let processor = PurgeProcessor::new(
            settings.clone(),
            repository.clone(),
            schedule.clone(),
            clock.clone(),
            ids,
            self.config.clone(),
        );
        let notice = ActivationNotice::new(settings.clone(), self.config.notice_ttl_secs);

        Ok(RetentionService {
            settings,
            schedule,
            processor,
            notice,
            repository,
            clock,
        })
    }
}

/// Snapshot for status screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetentionStatus {
    pub policy: RetentionPolicy,
    pub retention_seconds: u64,
    pub next_run_at: Option<DateTime<Utc>>,
    /// `None` when retention is disabled or the duration is zero.
    pub eligible: Option<u64>,
}

pub struct RetentionService {
    settings: PolicySettings,
    schedule: ScheduleManager,
    processor: PurgeProcessor,
    notice: ActivationNotice,
    repository: Arc<dyn CommentRepository>,
    clock: Arc<dyn Clock>,
}

impl RetentionService {
    pub fn builder() -> RetentionServiceBuilder {
        RetentionServiceBuilder::new()
    }

    /// Activation hook: arms the one-time notice and reconciles the schedule.
    pub fn on_activate(&self) -> Result<(), RetentionError> {
        self.notice.arm(self.clock.now())?;
        self.schedule.reconcile()?;
        info!("retention activated");
        Ok(())
    }

    /// Deactivation hook: removes the job whatever the policy says.
    pub fn on_deactivate(&self) -> Result<(), RetentionError> {
        self.schedule.cancel()?;
        info!("retention deactivated");
        Ok(())
    }

    /// Entry point for the host timer.
    pub fn run_once(&self) -> PurgeOutcome {
        self.processor.run_once()
    }

    /// Routes a due job by action name; unknown actions are ignored.
    pub fn dispatch(&self, action: &str) -> Option<PurgeOutcome> {
        if action != PURGE_ACTION {
            warn!(action, "ignoring unknown action");
            return None;
        }
        Some(self.run_once())
    }

    pub fn policy(&self) -> Result<RetentionPolicy, RetentionError> {
        self.settings.policy()
    }

    /// Validated write of the mode; always followed by reconciliation.
    pub fn set_mode(&self, raw: &str) -> Result<RetentionMode, RetentionError> {
        let mode = self.settings.write_mode(raw)?;
        self.schedule.reconcile()?;
        Ok(mode)
    }

    pub fn set_period(&self, raw: &str) -> Result<u32, RetentionError> {
        self.settings.write_period(raw)
    }

    pub fn set_period_unit(&self, raw: &str) -> Result<Option<PeriodUnit>, RetentionError> {
        self.settings.write_period_unit(raw)
    }

    /// Removes the stored policy (defaults return) and reconciles.
    pub fn clear_policy(&self) -> Result<(), RetentionError> {
        self.settings.clear()?;
        self.schedule.reconcile()
    }

    pub fn next_run(&self) -> Result<Option<DateTime<Utc>>, RetentionError> {
        self.schedule.next_run()
    }

    pub fn take_activation_notice(&self) -> Result<Option<Notice>, RetentionError> {
        self.notice.take(self.clock.now())
    }

    pub fn status(&self) -> Result<RetentionStatus, RetentionError> {
        let policy = self.settings.policy()?;
        let eligible = match policy.cutoff(self.clock.now()) {
            Some(cutoff) if policy.is_delete() => {
                Some(self.repository.count(&EligibilityFilter::new(cutoff))?)
            }
            _ => None,
        };
        Ok(RetentionStatus {
            policy,
            retention_seconds: policy.retention_seconds(),
            next_run_at: self.schedule.next_run()?,
            eligible,
        })
    }
}
