//! In-memory comment repository.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::{CommentId, CommentRecord, EligibilityFilter, NewComment, RetentionError};
use crate::ports::{CommentRepository, IdGenerator, SystemClock, UlidGenerator};

/// InMemoryCommentRepository はテストと CLI 用のコメントの正本
///
/// `update_count` は `set_author_ip` の成功回数（「更新ゼロ」の検証用）。
pub struct InMemoryCommentRepository {
    comments: Mutex<BTreeMap<CommentId, CommentRecord>>,
    ids: Arc<dyn IdGenerator>,
    updates: AtomicU64,
}

impl Default for InMemoryCommentRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCommentRepository {
    pub fn new() -> Self {
        Self::with_id_generator(Arc::new(UlidGenerator::new(SystemClock)))
    }

    pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            comments: Mutex::new(BTreeMap::new()),
            ids,
            updates: AtomicU64::new(0),
        }
    }

    /// Loads existing records, keeping their ids.
    pub fn from_records(records: impl IntoIterator<Item = CommentRecord>) -> Self {
        let repository = Self::new();
        {
            let mut comments = repository.comments();
            for record in records {
                comments.insert(record.id, record);
            }
        }
        repository
    }

    pub fn insert(&self, comment: NewComment) -> CommentId {
        let id = self.ids.generate_comment_id();
        self.comments().insert(id, comment.into_record(id));
        id
    }

    pub fn get(&self, id: CommentId) -> Option<CommentRecord> {
        self.comments().get(&id).cloned()
    }

    /// All records, oldest first.
    pub fn all(&self) -> Vec<CommentRecord> {
        let mut records: Vec<CommentRecord> = self.comments().values().cloned().collect();
        records.sort_by_key(|c| (c.created_at, c.id));
        records
    }

    /// Number of records that still carry an IP.
    pub fn with_author_ip(&self) -> usize {
        self.comments().values().filter(|c| c.has_author_ip()).count()
    }

    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    fn comments(&self) -> MutexGuard<'_, BTreeMap<CommentId, CommentRecord>> {
        self.comments.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CommentRepository for InMemoryCommentRepository {
    fn count(&self, filter: &EligibilityFilter) -> Result<u64, RetentionError> {
        let count = self.comments().values().filter(|c| filter.matches(c)).count();
        Ok(count as u64)
    }

    fn page_ids(
        &self,
        filter: &EligibilityFilter,
        limit: usize,
    ) -> Result<Vec<CommentId>, RetentionError> {
        let comments = self.comments();
        let mut matching: Vec<&CommentRecord> =
            comments.values().filter(|c| filter.matches(c)).collect();
        matching.sort_by_key(|c| (c.created_at, c.id));
        Ok(matching.into_iter().take(limit).map(|c| c.id).collect())
    }

    fn set_author_ip(&self, id: CommentId, author_ip: &str) -> Result<(), RetentionError> {
        let mut comments = self.comments();
        let comment = comments
            .get_mut(&id)
            .ok_or(RetentionError::CommentNotFound(id))?;
        comment.author_ip = author_ip.to_string();
        self.updates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
