//! PurgeProcessor - retention ジョブ 1 回分
//!
//! # フロー
//! 1. mode != delete なら何もしない
//! 2. 保持期間が 0 秒なら何もしない（未知の単位を「全件対象」にしない）
//! 3. 対象件数を数える（IP あり・comment 種別・created_at <= cutoff）
//! 4. バッチを超えるなら、purge より先に 10 秒後の毎時ジョブへ差し替える
//! 5. 古い順に最大 batch_size 件の ID を取得
//! 6. 1 件ずつ author_ip を "" に更新（失敗しても残りは続行）
//!
//! リポジトリの障害はホストに伝播させず、ログに残して次回に任せます。

use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use crate::app::config::ProcessorConfig;
use crate::app::schedule::ScheduleManager;
use crate::app::settings::PolicySettings;
use crate::domain::{EligibilityFilter, RunId};
use crate::ports::{Clock, CommentRepository, IdGenerator};

/// Why a run did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// mode is `keep`.
    RetentionDisabled,
    /// period or unit resolves to zero seconds.
    ZeroRetention,
    /// The settings store could not be read.
    SettingsUnavailable,
    /// The count or page query failed.
    RepositoryUnavailable,
}

/// Summary of one invocation, for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    Skipped(SkipReason),
    Completed {
        run_id: RunId,
        eligible: u64,
        purged: usize,
        failed: usize,
        follow_up_scheduled: bool,
    },
}

impl PurgeOutcome {
    pub fn purged(&self) -> usize {
        match self {
            PurgeOutcome::Completed { purged, .. } => *purged,
            PurgeOutcome::Skipped(_) => 0,
        }
    }

    pub fn follow_up_scheduled(&self) -> bool {
        matches!(
            self,
            PurgeOutcome::Completed {
                follow_up_scheduled: true,
                ..
            }
        )
    }
}

pub struct PurgeProcessor {
    settings: PolicySettings,
    repository: Arc<dyn CommentRepository>,
    schedule: ScheduleManager,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    config: ProcessorConfig,
}

impl PurgeProcessor {
    pub fn new(
        settings: PolicySettings,
        repository: Arc<dyn CommentRepository>,
        schedule: ScheduleManager,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            settings,
            repository,
            schedule,
            clock,
            ids,
            config,
        }
    }

    pub fn run_once(&self) -> PurgeOutcome {
        let policy = match self.settings.policy() {
            Ok(policy) => policy,
            Err(err) => {
                warn!(error = %err, "cannot read retention policy, skipping run");
                return PurgeOutcome::Skipped(SkipReason::SettingsUnavailable);
            }
        };
        if !policy.is_delete() {
            return PurgeOutcome::Skipped(SkipReason::RetentionDisabled);
        }

        let now = self.clock.now();
        let Some(cutoff) = policy.cutoff(now) else {
            debug!(?policy, "retention duration is zero, nothing is eligible");
            return PurgeOutcome::Skipped(SkipReason::ZeroRetention);
        };
        let filter = EligibilityFilter::new(cutoff);

        let run_id = self.ids.generate_run_id();
        let span = info_span!("purge_run", %run_id, %cutoff);
        let _guard = span.enter();

        let eligible = match self.repository.count(&filter) {
            Ok(count) => count,
            Err(err) => {
                warn!(error = %err, "eligible count query failed");
                return PurgeOutcome::Skipped(SkipReason::RepositoryUnavailable);
            }
        };

        let batch_size = self.config.batch_size;
        let follow_up_scheduled = if eligible > batch_size as u64 {
            match self.schedule.install_follow_up() {
                Ok(()) => true,
                Err(err) => {
                    warn!(error = %err, "could not install follow-up run");
                    false
                }
            }
        } else {
            if let Err(err) = self.schedule.restore_standing() {
                warn!(error = %err, "could not restore standing schedule");
            }
            false
        };

        let ids = match self.repository.page_ids(&filter, batch_size) {
            Ok(ids) => ids,
            Err(err) => {
                warn!(error = %err, "eligible page query failed");
                return PurgeOutcome::Skipped(SkipReason::RepositoryUnavailable);
            }
        };

        let mut purged = 0;
        let mut failed = 0;
        for id in ids {
            match self.repository.set_author_ip(id, "") {
                Ok(()) => {
                    purged += 1;
                    debug!(comment_id = %id, "author ip erased");
                }
                Err(err) => {
                    failed += 1;
                    warn!(comment_id = %id, error = %err, "failed to erase author ip");
                }
            }
        }

        info!(eligible, purged, failed, follow_up_scheduled, "purge run finished");

        PurgeOutcome::Completed {
            run_id,
            eligible,
            purged,
            failed,
            follow_up_scheduled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommentId, NewComment, PURGE_ACTION, Recurrence, RetentionError};
    use crate::impls::{InMemoryCommentRepository, InMemorySettingsStore, InMemoryTimer};
    use crate::ports::{FixedClock, SettingsStore, SystemClock, Timer, UlidGenerator};
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use std::collections::HashSet;

    struct Fixture {
        settings: PolicySettings,
        repository: Arc<InMemoryCommentRepository>,
        timer: Arc<InMemoryTimer>,
        clock: Arc<FixedClock>,
        schedule: ScheduleManager,
        processor: PurgeProcessor,
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn fixture_with(
        repository: Arc<dyn CommentRepository>,
        inner: Arc<InMemoryCommentRepository>,
    ) -> Fixture {
        let settings = PolicySettings::new(Arc::new(InMemorySettingsStore::new()));
        let timer = Arc::new(InMemoryTimer::new());
        let clock = Arc::new(FixedClock::new(now()));
        let config = ProcessorConfig::default();
        let schedule =
            ScheduleManager::new(settings.clone(), timer.clone(), clock.clone(), config.clone());
        let processor = PurgeProcessor::new(
            settings.clone(),
            repository,
            schedule.clone(),
            clock.clone(),
            Arc::new(UlidGenerator::new(SystemClock)),
            config,
        );
        Fixture {
            settings,
            repository: inner,
            timer,
            clock,
            schedule,
            processor,
        }
    }

    fn fixture() -> Fixture {
        let repository = Arc::new(InMemoryCommentRepository::new());
        fixture_with(repository.clone(), repository)
    }

    fn enable(f: &Fixture, period: &str, unit: &str) {
        f.settings.write_mode("delete").unwrap();
        f.settings.write_period(period).unwrap();
        f.settings.write_period_unit(unit).unwrap();
        f.schedule.reconcile().unwrap();
    }

    fn seed_old(f: &Fixture, n: usize) -> Vec<CommentId> {
        (0..n)
            .map(|i| {
                let created = now() - TimeDelta::days(30) + TimeDelta::minutes(i as i64);
                f.repository
                    .insert(NewComment::new(format!("192.0.2.{}", i % 250), created))
            })
            .collect()
    }

    #[test]
    fn keep_mode_performs_no_updates() {
        let f = fixture();
        seed_old(&f, 5);

        let outcome = f.processor.run_once();
        assert_eq!(outcome, PurgeOutcome::Skipped(SkipReason::RetentionDisabled));
        assert_eq!(f.repository.update_count(), 0);
    }

    #[test]
    fn zero_retention_performs_no_updates() {
        let f = fixture();
        seed_old(&f, 5);
        enable(&f, "1", "days");
        f.settings
            .store()
            .set(crate::app::settings::PERIOD_UNIT_KEY, "fortnights")
            .unwrap();

        let outcome = f.processor.run_once();
        assert_eq!(outcome, PurgeOutcome::Skipped(SkipReason::ZeroRetention));
        assert_eq!(f.repository.update_count(), 0);
    }

    #[test]
    fn large_backlog_purges_one_batch_and_installs_follow_up() {
        let f = fixture();
        seed_old(&f, 250);
        enable(&f, "7", "days");

        let outcome = f.processor.run_once();
        assert_eq!(outcome.purged(), 100);
        assert!(outcome.follow_up_scheduled());
        assert_eq!(f.repository.with_author_ip(), 150);

        let jobs = f.timer.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].recurrence, Recurrence::Hourly);
        assert_eq!(jobs[0].next_run_at, f.clock.now() + TimeDelta::seconds(10));
    }

    #[test]
    fn small_backlog_keeps_daily_schedule() {
        let f = fixture();
        seed_old(&f, 40);
        enable(&f, "7", "days");
        let before = f.timer.jobs();

        let outcome = f.processor.run_once();
        assert_eq!(outcome.purged(), 40);
        assert!(!outcome.follow_up_scheduled());
        assert_eq!(f.timer.jobs(), before);
    }

    #[test]
    fn oldest_comments_are_purged_first() {
        let f = fixture();
        let ids = seed_old(&f, 101);
        enable(&f, "1", "days");

        f.processor.run_once();

        // seed_old は古い順に作るので、最後の 1 件だけ残る
        let newest = ids[100];
        for id in &ids[..100] {
            assert!(f.repository.get(*id).unwrap().author_ip.is_empty());
        }
        assert!(!f.repository.get(newest).unwrap().author_ip.is_empty());
    }

    #[test]
    fn second_run_finds_nothing_new() {
        let f = fixture();
        seed_old(&f, 30);
        enable(&f, "1", "weeks");

        assert_eq!(f.processor.run_once().purged(), 30);
        let updates = f.repository.update_count();

        let second = f.processor.run_once();
        assert_eq!(second.purged(), 0);
        assert_eq!(f.repository.update_count(), updates);
    }

    #[test]
    fn backlog_drains_and_daily_cadence_returns() {
        let f = fixture();
        seed_old(&f, 180);
        enable(&f, "1", "days");

        assert!(f.processor.run_once().follow_up_scheduled());
        f.clock.advance(TimeDelta::seconds(10));

        let second = f.processor.run_once();
        assert_eq!(second.purged(), 80);
        assert!(!second.follow_up_scheduled());

        let job = f.timer.next_scheduled(PURGE_ACTION).unwrap().unwrap();
        assert_eq!(job.recurrence, Recurrence::Daily);
        assert_eq!(job.next_run_at, f.clock.now() + TimeDelta::days(1));
    }

    /// Fails updates for a fixed set of ids, delegates everything else.
    struct FlakyRepository {
        inner: Arc<InMemoryCommentRepository>,
        broken: HashSet<CommentId>,
    }

    impl CommentRepository for FlakyRepository {
        fn count(&self, filter: &EligibilityFilter) -> Result<u64, RetentionError> {
            self.inner.count(filter)
        }

        fn page_ids(
            &self,
            filter: &EligibilityFilter,
            limit: usize,
        ) -> Result<Vec<CommentId>, RetentionError> {
            self.inner.page_ids(filter, limit)
        }

        fn set_author_ip(&self, id: CommentId, author_ip: &str) -> Result<(), RetentionError> {
            if self.broken.contains(&id) {
                return Err(RetentionError::Repository("disk full".into()));
            }
            self.inner.set_author_ip(id, author_ip)
        }
    }

    #[test]
    fn failed_update_does_not_stop_the_batch() {
        let inner = Arc::new(InMemoryCommentRepository::new());
        let probe = fixture_with(inner.clone(), inner.clone());
        let ids = seed_old(&probe, 10);
        drop(probe);

        let broken: HashSet<CommentId> = [ids[2], ids[7]].into_iter().collect();
        let flaky = Arc::new(FlakyRepository {
            inner: inner.clone(),
            broken: broken.clone(),
        });
        let f = fixture_with(flaky, inner.clone());
        enable(&f, "1", "days");

        match f.processor.run_once() {
            PurgeOutcome::Completed { purged, failed, .. } => {
                assert_eq!(purged, 8);
                assert_eq!(failed, 2);
            }
            other => panic!("expected completed run, got {other:?}"),
        }
        for id in ids {
            let ip_left = !inner.get(id).unwrap().author_ip.is_empty();
            assert_eq!(ip_left, broken.contains(&id));
        }
    }

    struct DownRepository;

    impl CommentRepository for DownRepository {
        fn count(&self, _filter: &EligibilityFilter) -> Result<u64, RetentionError> {
            Err(RetentionError::Repository("connection refused".into()))
        }

        fn page_ids(
            &self,
            _filter: &EligibilityFilter,
            _limit: usize,
        ) -> Result<Vec<CommentId>, RetentionError> {
            Err(RetentionError::Repository("connection refused".into()))
        }

        fn set_author_ip(&self, _id: CommentId, _author_ip: &str) -> Result<(), RetentionError> {
            Err(RetentionError::Repository("connection refused".into()))
        }
    }

    #[test]
    fn repository_outage_is_absorbed() {
        let inner = Arc::new(InMemoryCommentRepository::new());
        let f = fixture_with(Arc::new(DownRepository), inner);
        enable(&f, "1", "days");

        assert_eq!(
            f.processor.run_once(),
            PurgeOutcome::Skipped(SkipReason::RepositoryUnavailable)
        );
        // スケジュールはそのまま残る
        assert_eq!(f.timer.jobs().len(), 1);
    }
}
