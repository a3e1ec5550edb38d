//! ActivationNotice - 有効化直後に一度だけ出す案内
//!
//! 有効化時に期限付きのマーカーを設定ストアへ書き、
//! 管理画面側（ホスト）が `take` で取り出します。
//!
//! - マーカーが無い / 期限切れ → 何も出さない
//! - 取り出した時点でマーカーは消える（表示は一度きり）
//! - mode がすでに delete なら案内は不要

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::debug;

use crate::app::settings::PolicySettings;
use crate::domain::{RetentionError, RetentionMode};
use crate::ports::SettingsStore;

pub const ACTIVATION_MARKER_KEY: &str = "comment-retention-policy-activated";

/// Anchor of the settings field the host should link to.
pub const SETTINGS_ANCHOR: &str = "options-discussion.php#comment-retention-policy";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub message: String,
    pub settings_anchor: &'static str,
}

impl Notice {
    fn configure_policy() -> Self {
        Self {
            message: "Please visit the discussion settings to set a retention policy for comment IPs."
                .to_string(),
            settings_anchor: SETTINGS_ANCHOR,
        }
    }
}

#[derive(Clone)]
pub struct ActivationNotice {
    settings: PolicySettings,
    ttl: TimeDelta,
}

impl ActivationNotice {
    pub fn new(settings: PolicySettings, ttl_secs: u64) -> Self {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::zero());
        Self { settings, ttl }
    }

    pub fn arm(&self, now: DateTime<Utc>) -> Result<(), RetentionError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.settings
            .store()
            .set(ACTIVATION_MARKER_KEY, &expires_at.to_rfc3339())
    }

    pub fn take(&self, now: DateTime<Utc>) -> Result<Option<Notice>, RetentionError> {
        let Some(raw) = self.settings.store().get(ACTIVATION_MARKER_KEY)? else {
            return Ok(None);
        };
        self.settings.store().remove(ACTIVATION_MARKER_KEY)?;

        let live = DateTime::parse_from_rfc3339(&raw)
            .map(|expires_at| now <= expires_at.with_timezone(&Utc))
            .unwrap_or(false);
        if !live {
            debug!(marker = %raw, "activation marker expired");
            return Ok(None);
        }

        if self.settings.mode()? != RetentionMode::Keep {
            return Ok(None);
        }
        Ok(Some(Notice::configure_policy()))
    }
}
