//! Site state file (JSON).
//!
//! CLI はホスト（CMS）の代わりに、設定・スケジュール・コメントを
//! 1 つの JSON ファイルに持ちます。
//!
//! ```json
//! {
//!   "settings": { "comment_ips_retention": "delete" },
//!   "jobs": [],
//!   "comments": [
//!     { "author_ip": "203.0.113.5", "created_at": "2024-01-01T00:00:00Z" }
//!   ]
//! }
//! ```
//!
//! `id` の無いコメントには読み込み時に id を振り、保存時に書き戻します。

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use retention_core::app::{BuildError, ProcessorConfig, RetentionService};
use retention_core::domain::{CommentId, CommentRecord, NewComment, ScheduledJob};
use retention_core::impls::{InMemoryCommentRepository, InMemorySettingsStore, InMemoryTimer};
use retention_core::ports::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("cannot access state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid state file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredComment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CommentId>,
    #[serde(flatten)]
    pub comment: NewComment,
}

impl From<CommentRecord> for StoredComment {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: Some(record.id),
            comment: NewComment {
                kind: record.kind,
                author: record.author,
                author_ip: record.author_ip,
                content: record.content,
                created_at: record.created_at,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteState {
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
    #[serde(default)]
    pub jobs: Vec<ScheduledJob>,
    #[serde(default)]
    pub comments: Vec<StoredComment>,
}

impl SiteState {
    /// A missing file is an empty site.
    pub fn load(path: &Path) -> Result<Self, StateError> {
        if !path.exists() {
            debug!(path = %path.display(), "state file not found, starting empty");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| StateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StateError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes to a sibling temp file and renames it over `path`.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        let io_err = |source: std::io::Error| StateError::Io {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_vec_pretty(self).map_err(|source| StateError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
        file.write_all(&json).map_err(io_err)?;
        file.as_file().sync_all().map_err(io_err)?;
        file.persist(path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}

/// Site は in-memory ports とそれを使う RetentionService の組
pub struct Site {
    pub settings: Arc<InMemorySettingsStore>,
    pub comments: Arc<InMemoryCommentRepository>,
    pub timer: Arc<InMemoryTimer>,
    pub clock: Arc<dyn Clock>,
    pub service: RetentionService,
}

impl Site {
    pub fn open(state: SiteState, config: ProcessorConfig) -> Result<Self, BuildError> {
        Self::open_with_clock(state, config, Arc::new(SystemClock))
    }

    pub fn open_with_clock(
        state: SiteState,
        config: ProcessorConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, BuildError> {
        let (known, fresh): (Vec<_>, Vec<_>) =
            state.comments.into_iter().partition(|c| c.id.is_some());
        let comments = Arc::new(InMemoryCommentRepository::from_records(
            known
                .into_iter()
                .filter_map(|c| c.id.map(|id| c.comment.into_record(id))),
        ));
        for stored in fresh {
            comments.insert(stored.comment);
        }

        let settings = Arc::new(InMemorySettingsStore::from_values(state.settings));
        let timer = Arc::new(InMemoryTimer::from_jobs(state.jobs));

        let service = RetentionService::builder()
            .settings_store(settings.clone())
            .comment_repository(comments.clone())
            .timer(timer.clone())
            .clock(clock.clone())
            .config(config)
            .build()?;

        Ok(Self {
            settings,
            comments,
            timer,
            clock,
            service,
        })
    }

    pub fn snapshot(&self) -> SiteState {
        SiteState {
            settings: self.settings.snapshot(),
            jobs: self.timer.jobs(),
            comments: self.comments.all().into_iter().map(StoredComment::from).collect(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        self.snapshot().save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};
    use retention_core::domain::PURGE_ACTION;
    use retention_core::ports::FixedClock;

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = SiteState::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(state, SiteState::default());
    }

    #[test]
    fn comments_without_ids_get_ids_on_open() {
        let json = r#"{
            "settings": { "comment_ips_retention": "delete" },
            "comments": [
                { "author_ip": "203.0.113.5", "created_at": "2024-01-01T00:00:00Z" },
                { "author_ip": "203.0.113.6", "kind": "pingback", "created_at": "2024-01-02T00:00:00Z" }
            ]
        }"#;
        let state: SiteState = serde_json::from_str(json).unwrap();
        let site = Site::open_with_clock(state, ProcessorConfig::default(), clock()).unwrap();

        let saved = site.snapshot();
        assert_eq!(saved.comments.len(), 2);
        assert!(saved.comments.iter().all(|c| c.id.is_some()));
        assert_eq!(saved.settings.get("comment_ips_retention").map(String::as_str), Some("delete"));
    }

    #[test]
    fn purge_then_save_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.json");
        let clock = clock();
        let now = clock.now();

        let mut state = SiteState::default();
        state.comments.push(StoredComment {
            id: None,
            comment: NewComment::new("203.0.113.5", now - TimeDelta::days(30)),
        });
        state.comments.push(StoredComment {
            id: None,
            comment: NewComment::new("203.0.113.6", now - TimeDelta::hours(2)),
        });
        state.save(&path).unwrap();

        let site =
            Site::open_with_clock(SiteState::load(&path).unwrap(), ProcessorConfig::default(), clock.clone())
                .unwrap();
        site.service.set_mode("delete").unwrap();
        assert_eq!(site.service.run_once().purged(), 1);
        site.save(&path).unwrap();

        let reloaded = SiteState::load(&path).unwrap();
        let ips: Vec<&str> = reloaded
            .comments
            .iter()
            .map(|c| c.comment.author_ip.as_str())
            .collect();
        assert_eq!(ips, vec!["", "203.0.113.6"]);
        assert_eq!(reloaded.jobs.len(), 1);
        assert_eq!(reloaded.jobs[0].action, PURGE_ACTION);

        // 再読み込みしても id は変わらない
        let ids: Vec<_> = reloaded.comments.iter().map(|c| c.id).collect();
        let again = Site::open_with_clock(reloaded, ProcessorConfig::default(), clock).unwrap();
        let ids_again: Vec<_> = again.snapshot().comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, ids_again);
    }

    #[test]
    fn save_replaces_existing_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.json");
        std::fs::write(&path, "{ stale").unwrap();

        let mut state = SiteState::default();
        state
            .settings
            .insert("comment_ips_retention".to_string(), "delete".to_string());
        state.save(&path).unwrap();

        assert_eq!(SiteState::load(&path).unwrap(), state);
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(SiteState::load(&path), Err(StateError::Json { .. })));
    }
}
