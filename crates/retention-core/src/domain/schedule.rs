//! ScheduledJob - ホストのタイマーが保持する定期ジョブ
//!
//! retention ジョブは常に 1 つだけ（action 名で識別）。

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Action name of the recurring purge job.
pub const PURGE_ACTION: &str = "process_retention_period_for_comment_ips";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Hourly,
    Daily,
}

impl Recurrence {
    pub fn interval(&self) -> TimeDelta {
        match self {
            Recurrence::Hourly => TimeDelta::hours(1),
            Recurrence::Daily => TimeDelta::days(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub action: String,
    pub next_run_at: DateTime<Utc>,
    pub recurrence: Recurrence,
}

impl ScheduledJob {
    pub fn new(action: impl Into<String>, next_run_at: DateTime<Utc>, recurrence: Recurrence) -> Self {
        Self {
            action: action.into(),
            next_run_at,
            recurrence,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_run_at <= now
    }

    /// Moves `next_run_at` to the first slot strictly after `now`,
    /// keeping the original cadence. Missed slots are collapsed into one.
    pub fn advance_past(&mut self, now: DateTime<Utc>) {
        if self.next_run_at > now {
            return;
        }
        let interval = self.recurrence.interval().num_seconds();
        let behind = (now - self.next_run_at).num_seconds();
        let steps = behind / interval + 1;
        self.next_run_at += TimeDelta::seconds(steps * interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn advance_keeps_cadence() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
        let mut job = ScheduledJob::new(PURGE_ACTION, start, Recurrence::Daily);

        job.advance_past(start);
        assert_eq!(job.next_run_at, start + TimeDelta::days(1));

        // 3 日半遅れても次のスロットは 03:00
        let late = start + TimeDelta::days(4) + TimeDelta::hours(12);
        job.advance_past(late);
        assert_eq!(job.next_run_at, start + TimeDelta::days(5));
    }

    #[test]
    fn advance_is_noop_for_future_job() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let next = now + TimeDelta::seconds(10);
        let mut job = ScheduledJob::new(PURGE_ACTION, next, Recurrence::Hourly);

        job.advance_past(now);
        assert_eq!(job.next_run_at, next);
        assert!(!job.is_due(now));
    }
}
