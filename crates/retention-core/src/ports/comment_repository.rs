//! CommentRepository port - コメントの検索と IP フィールドの更新
//!
//! 件数クエリとページクエリは同じ [`EligibilityFilter`] を受け取るので、
//! 2 回のクエリで述語がずれることはありません。

use crate::domain::{CommentId, EligibilityFilter, RetentionError};

pub trait CommentRepository: Send + Sync {
    /// Number of comments matching `filter`.
    fn count(&self, filter: &EligibilityFilter) -> Result<u64, RetentionError>;

    /// Up to `limit` matching ids, oldest `created_at` first.
    fn page_ids(
        &self,
        filter: &EligibilityFilter,
        limit: usize,
    ) -> Result<Vec<CommentId>, RetentionError>;

    /// Overwrites the stored author IP of a single comment.
    fn set_author_ip(&self, id: CommentId, author_ip: &str) -> Result<(), RetentionError>;
}
