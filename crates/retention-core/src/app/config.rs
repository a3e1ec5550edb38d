//! Tunables of the purge job.

use serde::{Deserialize, Serialize};

use crate::domain::Recurrence;

/// Upper bound for every delay and TTL (100 years).
pub const MAX_DELAY_SECS: u64 = 100 * 365 * 86_400;

/// ProcessorConfig はスケジュールとバッチの定数
///
/// `Default` は本番の値（バッチ 100 件、初回 1 時間後に毎日、
/// 積み残しがあれば 10 秒後から毎時）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Maximum comments purged per invocation.
    pub batch_size: usize,

    /// Delay before the first run after the job is (re)installed.
    pub initial_delay_secs: u64,

    pub standing_recurrence: Recurrence,

    /// Delay before the follow-up run when the backlog exceeds one batch.
    pub follow_up_delay_secs: u64,

    pub follow_up_recurrence: Recurrence,

    /// Lifetime of the activation notice marker.
    pub notice_ttl_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            initial_delay_secs: 60 * 60,
            standing_recurrence: Recurrence::Daily,
            follow_up_delay_secs: 10,
            follow_up_recurrence: Recurrence::Hourly,
            notice_ttl_secs: 10,
        }
    }
}

impl ProcessorConfig {
    /// Returns the first out-of-range field, if any.
    ///
    /// - `batch_size` は 1 以上
    /// - 遅延と TTL は `MAX_DELAY_SECS` 以下
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1");
        }
        let delays = [
            (self.initial_delay_secs, "initial_delay_secs is too large"),
            (self.follow_up_delay_secs, "follow_up_delay_secs is too large"),
            (self.notice_ttl_secs, "notice_ttl_secs is too large"),
        ];
        for (secs, problem) in delays {
            if secs > MAX_DELAY_SECS {
                return Err(problem);
            }
        }
        Ok(())
    }
}
