//! RetentionPolicy - コメント IP の保持ポリシー
//!
//! # 構成
//! - mode: keep（保持）/ delete（期間経過後に削除）
//! - period: 1..=999
//! - period_unit: days / weeks / months（1 month = 30 days 固定）
//!
//! 保持期間が 0 秒になるケース（未知の単位、壊れた period）は
//! 「何も対象にしない」として扱います。

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_PERIOD: u32 = 1;
pub const MAX_PERIOD: u32 = 999;

const DAY_IN_SECONDS: u64 = 86_400;
const WEEK_IN_SECONDS: u64 = 7 * DAY_IN_SECONDS;
const MONTH_IN_SECONDS: u64 = 30 * DAY_IN_SECONDS;

/// Whether stored IPs are kept forever or erased after the period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionMode {
    #[default]
    Keep,
    Delete,
}

impl RetentionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetentionMode::Keep => "keep",
            RetentionMode::Delete => "delete",
        }
    }

    /// Exact match only; callers trim first.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "keep" => Some(RetentionMode::Keep),
            "delete" => Some(RetentionMode::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for RetentionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    #[default]
    Days,
    Weeks,
    Months,
}

impl PeriodUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodUnit::Days => "days",
            PeriodUnit::Weeks => "weeks",
            PeriodUnit::Months => "months",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "days" => Some(PeriodUnit::Days),
            "weeks" => Some(PeriodUnit::Weeks),
            "months" => Some(PeriodUnit::Months),
            _ => None,
        }
    }

    /// Length of one unit in seconds. Months are a flat 30 days.
    pub fn seconds(&self) -> u64 {
        match self {
            PeriodUnit::Days => DAY_IN_SECONDS,
            PeriodUnit::Weeks => WEEK_IN_SECONDS,
            PeriodUnit::Months => MONTH_IN_SECONDS,
        }
    }
}

impl fmt::Display for PeriodUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retention duration in seconds.
///
/// `None` stands for a stored unit that is not recognised; it yields 0,
/// and 0 always means "nothing is eligible".
pub fn retention_seconds(period: u32, unit: Option<PeriodUnit>) -> u64 {
    match unit {
        Some(unit) => u64::from(period) * unit.seconds(),
        None => 0,
    }
}

/// RetentionPolicy は設定ストアから読み出した型付きスナップショット
///
/// `period_unit` が `None` のときは保存値が壊れている（未知の単位）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub mode: RetentionMode,
    pub period: u32,
    pub period_unit: Option<PeriodUnit>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            mode: RetentionMode::Keep,
            period: 7,
            period_unit: Some(PeriodUnit::Days),
        }
    }
}

impl RetentionPolicy {
    pub fn is_delete(&self) -> bool {
        self.mode == RetentionMode::Delete
    }

    pub fn retention_seconds(&self) -> u64 {
        retention_seconds(self.period, self.period_unit)
    }

    /// Inclusive creation-time cutoff for eligible comments.
    ///
    /// Returns `None` when the duration is zero or cannot be represented,
    /// so a broken policy never turns into "everything is eligible".
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let seconds = self.retention_seconds();
        if seconds == 0 {
            return None;
        }
        let delta = TimeDelta::try_seconds(i64::try_from(seconds).ok()?)?;
        now.checked_sub_signed(delta)
    }
}
