//! Timer port - ホストのスケジューラ
//!
//! ホストは期限が来たジョブの action を見て
//! `RetentionService::dispatch` を呼び出します。

use crate::domain::{RetentionError, ScheduledJob};

/// Timer は action 名ごとに最大 1 つの定期ジョブを保持
///
/// - `schedule` は同じ action の既存ジョブを置き換える
/// - `unschedule` は存在しなくてもエラーにしない
pub trait Timer: Send + Sync {
    fn schedule(&self, job: ScheduledJob) -> Result<(), RetentionError>;

    fn next_scheduled(&self, action: &str) -> Result<Option<ScheduledJob>, RetentionError>;

    fn unschedule(&self, action: &str) -> Result<(), RetentionError>;

    fn is_scheduled(&self, action: &str) -> Result<bool, RetentionError> {
        Ok(self.next_scheduled(action)?.is_some())
    }
}
