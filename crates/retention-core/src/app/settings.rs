//! PolicySettings - 設定ストア上の RetentionPolicy
//!
//! ポリシーはホストの SettingsStore に 3 つのキーで保存されます。
//! 読み出しは型付きスナップショット（[`RetentionPolicy`]）、
//! 書き込みは必ず validation を通します。
//!
//! # 読み出しのルール
//! - キーが無い → 初期値（keep / 7 / days）
//! - mode が "delete" 以外 → keep 扱い
//! - period が数値でない → 0（保持期間 0 = 何もしない）
//! - unit が未知 → `None`（保持期間 0 = 何もしない）

use std::sync::Arc;

use tracing::warn;

use crate::app::validation;
use crate::domain::{PeriodUnit, RetentionError, RetentionMode, RetentionPolicy};
use crate::ports::SettingsStore;

pub const MODE_KEY: &str = "comment_ips_retention";
pub const PERIOD_KEY: &str = "comment_ips_retention_period";
pub const PERIOD_UNIT_KEY: &str = "comment_ips_retention_period_unit";

/// PolicySettings は ScheduleManager と PurgeProcessor が共有するハンドル
///
/// 中身は `Arc<dyn SettingsStore>` なので clone は安価です。
#[derive(Clone)]
pub struct PolicySettings {
    store: Arc<dyn SettingsStore>,
}

impl PolicySettings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    pub fn policy(&self) -> Result<RetentionPolicy, RetentionError> {
        Ok(RetentionPolicy {
            mode: self.mode()?,
            period: self.period()?,
            period_unit: self.period_unit()?,
        })
    }

    pub fn mode(&self) -> Result<RetentionMode, RetentionError> {
        Ok(match self.store.get(MODE_KEY)? {
            Some(raw) if raw == RetentionMode::Delete.as_str() => RetentionMode::Delete,
            Some(_) => RetentionMode::Keep,
            None => RetentionPolicy::default().mode,
        })
    }

    pub fn period(&self) -> Result<u32, RetentionError> {
        Ok(match self.store.get(PERIOD_KEY)? {
            Some(raw) => raw.trim().parse().unwrap_or(0),
            None => RetentionPolicy::default().period,
        })
    }

    pub fn period_unit(&self) -> Result<Option<PeriodUnit>, RetentionError> {
        Ok(match self.store.get(PERIOD_UNIT_KEY)? {
            Some(raw) => PeriodUnit::parse(&raw),
            None => RetentionPolicy::default().period_unit,
        })
    }

    /// Validated write of the mode key. Returns the value stored afterwards.
    ///
    /// Schedule reconciliation is the caller's job (see `RetentionService::set_mode`).
    pub(crate) fn write_mode(&self, raw: &str) -> Result<RetentionMode, RetentionError> {
        match validation::parse_mode(raw) {
            Some(value) => {
                self.store.set(MODE_KEY, value.as_str())?;
                Ok(value)
            }
            None => {
                // 保存済みの文字列には触らない（未知の値でもそのまま）
                let stored = self.mode()?;
                warn!(key = MODE_KEY, input = raw, kept = %stored, "rejected settings input");
                Ok(stored)
            }
        }
    }

    pub(crate) fn write_period(&self, raw: &str) -> Result<u32, RetentionError> {
        match validation::parse_period(raw) {
            Some(value) => {
                self.store.set(PERIOD_KEY, &value.to_string())?;
                Ok(value)
            }
            None => {
                let stored = self.period()?;
                warn!(key = PERIOD_KEY, input = raw, kept = stored, "rejected settings input");
                Ok(stored)
            }
        }
    }

    pub(crate) fn write_period_unit(&self, raw: &str) -> Result<Option<PeriodUnit>, RetentionError> {
        let stored = self.period_unit()?;
        let value = validation::validate_period_unit(raw, stored);
        match validation::parse_period_unit(raw) {
            Some(unit) => self.store.set(PERIOD_UNIT_KEY, unit.as_str())?,
            None => warn!(
                key = PERIOD_UNIT_KEY,
                input = raw,
                kept = stored.map(|u| u.as_str()).unwrap_or("<unrecognised>"),
                "rejected settings input"
            ),
        }
        Ok(value)
    }

    /// Removes all three keys; reads fall back to defaults afterwards.
    pub(crate) fn clear(&self) -> Result<(), RetentionError> {
        for key in [MODE_KEY, PERIOD_KEY, PERIOD_UNIT_KEY] {
            self.store.remove(key)?;
        }
        Ok(())
    }
}
