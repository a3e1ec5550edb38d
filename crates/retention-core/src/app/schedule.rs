//! ScheduleManager - 定期ジョブをポリシーと一致させる
//!
//! # 不変条件
//! - mode = delete のときだけ PURGE_ACTION のジョブが存在する
//! - ジョブは常に最大 1 つ（Timer が action ごとに 1 つしか持たない）

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info};

use crate::app::config::ProcessorConfig;
use crate::app::settings::PolicySettings;
use crate::domain::{PURGE_ACTION, Recurrence, RetentionError, ScheduledJob};
use crate::ports::{Clock, Timer};

#[derive(Clone)]
pub struct ScheduleManager {
    settings: PolicySettings,
    timer: Arc<dyn Timer>,
    clock: Arc<dyn Clock>,
    config: ProcessorConfig,
}

impl ScheduleManager {
    pub fn new(
        settings: PolicySettings,
        timer: Arc<dyn Timer>,
        clock: Arc<dyn Clock>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            settings,
            timer,
            clock,
            config,
        }
    }

    /// Schedules or unschedules the purge job according to the stored mode.
    ///
    /// An existing job is left untouched, so repeated calls never move or
    /// duplicate it.
    pub fn reconcile(&self) -> Result<(), RetentionError> {
        if !self.settings.policy()?.is_delete() {
            self.timer.unschedule(PURGE_ACTION)?;
            debug!(action = PURGE_ACTION, "retention disabled, job unscheduled");
            return Ok(());
        }

        if self.timer.is_scheduled(PURGE_ACTION)? {
            return Ok(());
        }

        let first_run = self.after_secs(self.config.initial_delay_secs);
        self.install(first_run, self.config.standing_recurrence)
    }

    /// Unconditional removal, used on deactivation.
    pub fn cancel(&self) -> Result<(), RetentionError> {
        self.timer.unschedule(PURGE_ACTION)?;
        info!(action = PURGE_ACTION, "job unscheduled");
        Ok(())
    }

    pub fn next_run(&self) -> Result<Option<DateTime<Utc>>, RetentionError> {
        Ok(self
            .timer
            .next_scheduled(PURGE_ACTION)?
            .map(|job| job.next_run_at))
    }

    /// Replaces the standing job with the short follow-up cadence.
    pub(crate) fn install_follow_up(&self) -> Result<(), RetentionError> {
        self.timer.unschedule(PURGE_ACTION)?;
        let first_run = self.after_secs(self.config.follow_up_delay_secs);
        self.install(first_run, self.config.follow_up_recurrence)
    }

    /// Puts the standing cadence back once the backlog fits in one batch.
    ///
    /// Returns `true` when a follow-up job was replaced.
    pub(crate) fn restore_standing(&self) -> Result<bool, RetentionError> {
        let Some(job) = self.timer.next_scheduled(PURGE_ACTION)? else {
            return Ok(false);
        };
        if job.recurrence == self.config.standing_recurrence {
            return Ok(false);
        }

        self.timer.unschedule(PURGE_ACTION)?;
        let recurrence = self.config.standing_recurrence;
        let first_run = self.clock.now() + recurrence.interval();
        self.install(first_run, recurrence)?;
        Ok(true)
    }

    fn install(&self, first_run: DateTime<Utc>, recurrence: Recurrence) -> Result<(), RetentionError> {
        self.timer
            .schedule(ScheduledJob::new(PURGE_ACTION, first_run, recurrence))?;
        info!(
            action = PURGE_ACTION,
            next_run_at = %first_run,
            recurrence = ?recurrence,
            "job scheduled"
        );
        Ok(())
    }

    fn after_secs(&self, secs: u64) -> DateTime<Utc> {
        let delta = i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        self.clock
            .now()
            .checked_add_signed(delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemorySettingsStore, InMemoryTimer};
    use crate::ports::FixedClock;
    use chrono::TimeZone;

    struct Fixture {
        settings: PolicySettings,
        timer: Arc<InMemoryTimer>,
        clock: Arc<FixedClock>,
        manager: ScheduleManager,
    }

    fn fixture() -> Fixture {
        let settings = PolicySettings::new(Arc::new(InMemorySettingsStore::new()));
        let timer = Arc::new(InMemoryTimer::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        ));
        let manager = ScheduleManager::new(
            settings.clone(),
            timer.clone(),
            clock.clone(),
            ProcessorConfig::default(),
        );
        Fixture {
            settings,
            timer,
            clock,
            manager,
        }
    }

    #[test]
    fn keep_mode_schedules_nothing() {
        let f = fixture();
        f.manager.reconcile().unwrap();
        assert!(f.timer.jobs().is_empty());
    }

    #[test]
    fn delete_mode_schedules_one_daily_job_an_hour_out() {
        let f = fixture();
        f.settings.write_mode("delete").unwrap();
        f.manager.reconcile().unwrap();

        let jobs = f.timer.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].action, PURGE_ACTION);
        assert_eq!(jobs[0].recurrence, Recurrence::Daily);
        assert_eq!(jobs[0].next_run_at, f.clock.now() + TimeDelta::hours(1));
    }

    #[test]
    fn reconcile_does_not_move_existing_job() {
        let f = fixture();
        f.settings.write_mode("delete").unwrap();
        f.manager.reconcile().unwrap();
        let first = f.manager.next_run().unwrap();

        f.clock.advance(TimeDelta::minutes(30));
        f.manager.reconcile().unwrap();

        assert_eq!(f.timer.jobs().len(), 1);
        assert_eq!(f.manager.next_run().unwrap(), first);
    }

    #[test]
    fn switching_back_to_keep_removes_job() {
        let f = fixture();
        f.settings.write_mode("delete").unwrap();
        f.manager.reconcile().unwrap();

        f.settings.write_mode("keep").unwrap();
        f.manager.reconcile().unwrap();
        assert!(f.timer.jobs().is_empty());

        // 存在しないジョブの unschedule は no-op
        f.manager.reconcile().unwrap();
        f.manager.cancel().unwrap();
        assert_eq!(f.manager.next_run().unwrap(), None);
    }

    #[test]
    fn follow_up_replaces_and_restore_puts_back_daily() {
        let f = fixture();
        f.settings.write_mode("delete").unwrap();
        f.manager.reconcile().unwrap();

        f.manager.install_follow_up().unwrap();
        let jobs = f.timer.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].recurrence, Recurrence::Hourly);
        assert_eq!(jobs[0].next_run_at, f.clock.now() + TimeDelta::seconds(10));

        assert!(f.manager.restore_standing().unwrap());
        let jobs = f.timer.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].recurrence, Recurrence::Daily);
        assert_eq!(jobs[0].next_run_at, f.clock.now() + TimeDelta::days(1));

        assert!(!f.manager.restore_standing().unwrap());
    }
}
