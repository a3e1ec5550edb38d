//! Validation - 設定入力の検証
//!
//! 不正な入力はエラーにせず、保存済みの値をそのまま返します。
//! 初期値に戻すことはありません（却下された書き込みでポリシーが
//! 黙ってリセットされないように）。

use crate::domain::{MAX_PERIOD, MIN_PERIOD, PeriodUnit, RetentionMode};

pub fn parse_mode(raw: &str) -> Option<RetentionMode> {
    RetentionMode::parse(raw.trim())
}

/// Numeric strings (integers, decimals, exponents) are truncated toward
/// zero and accepted only inside `MIN_PERIOD..=MAX_PERIOD`.
pub fn parse_period(raw: &str) -> Option<u32> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let value = value.trunc();
    if value < f64::from(MIN_PERIOD) || value > f64::from(MAX_PERIOD) {
        return None;
    }
    Some(value as u32)
}

pub fn parse_period_unit(raw: &str) -> Option<PeriodUnit> {
    PeriodUnit::parse(raw.trim())
}

pub fn validate_mode(raw: &str, stored: RetentionMode) -> RetentionMode {
    parse_mode(raw).unwrap_or(stored)
}

pub fn validate_period(raw: &str, stored: u32) -> u32 {
    parse_period(raw).unwrap_or(stored)
}

/// `stored` is `None` when the stored unit is already unrecognised;
/// a rejected write keeps it that way.
pub fn validate_period_unit(raw: &str, stored: Option<PeriodUnit>) -> Option<PeriodUnit> {
    parse_period_unit(raw).or(stored)
}
