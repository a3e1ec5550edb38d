//! In-memory timer.
//!
//! ホスト役（CLI）は `take_due` で期限の来たジョブを取り出し、
//! action ごとに `RetentionService::dispatch` を呼びます。
//! 取り出したジョブは実行前に次のスロットへ進めておくので、
//! ジョブ側が自分を差し替えてもそちらが優先されます。

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::domain::{RetentionError, ScheduledJob};
use crate::ports::Timer;

#[derive(Debug, Default)]
pub struct InMemoryTimer {
    jobs: Mutex<BTreeMap<String, ScheduledJob>>,
}

impl InMemoryTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_jobs(jobs: impl IntoIterator<Item = ScheduledJob>) -> Self {
        let jobs = jobs
            .into_iter()
            .map(|job| (job.action.clone(), job))
            .collect();
        Self {
            jobs: Mutex::new(jobs),
        }
    }

    /// All scheduled jobs, ordered by action name.
    pub fn jobs(&self) -> Vec<ScheduledJob> {
        self.lock_jobs().values().cloned().collect()
    }

    /// Returns the jobs due at `now` (as they were when due) and moves each
    /// of them to its next slot.
    pub fn take_due(&self, now: DateTime<Utc>) -> Vec<ScheduledJob> {
        let mut jobs = self.lock_jobs();
        let mut due = Vec::new();
        for job in jobs.values_mut() {
            if job.is_due(now) {
                due.push(job.clone());
                job.advance_past(now);
            }
        }
        due
    }

    pub fn next_wake(&self) -> Option<DateTime<Utc>> {
        self.lock_jobs().values().map(|job| job.next_run_at).min()
    }

    fn lock_jobs(&self) -> MutexGuard<'_, BTreeMap<String, ScheduledJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Timer for InMemoryTimer {
    fn schedule(&self, job: ScheduledJob) -> Result<(), RetentionError> {
        self.lock_jobs().insert(job.action.clone(), job);
        Ok(())
    }

    fn next_scheduled(&self, action: &str) -> Result<Option<ScheduledJob>, RetentionError> {
        Ok(self.lock_jobs().get(action).cloned())
    }

    fn unschedule(&self, action: &str) -> Result<(), RetentionError> {
        self.lock_jobs().remove(action);
        Ok(())
    }
}
