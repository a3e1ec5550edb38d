//! Comment records as seen by the retention job.
//!
//! The repository owns these; the job only ever reads them through an
//! [`EligibilityFilter`] and writes back an empty `author_ip`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::CommentId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    #[default]
    Comment,
    Pingback,
    Trackback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: CommentId,
    #[serde(default)]
    pub kind: CommentKind,
    #[serde(default)]
    pub author: String,
    /// Empty once purged.
    #[serde(default)]
    pub author_ip: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CommentRecord {
    pub fn has_author_ip(&self) -> bool {
        !self.author_ip.is_empty()
    }
}

/// Input for creating a comment; the repository assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    #[serde(default)]
    pub kind: CommentKind,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_ip: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    pub fn new(author_ip: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            kind: CommentKind::Comment,
            author: String::new(),
            author_ip: author_ip.into(),
            content: String::new(),
            created_at,
        }
    }

    pub fn with_kind(mut self, kind: CommentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_author(mut self, author: impl Into<String>, content: impl Into<String>) -> Self {
        self.author = author.into();
        self.content = content.into();
        self
    }

    pub fn into_record(self, id: CommentId) -> CommentRecord {
        CommentRecord {
            id,
            kind: self.kind,
            author: self.author,
            author_ip: self.author_ip,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

/// Predicate shared by the count query and the page query.
///
/// A comment is eligible when it is of kind `comment`, still has an IP,
/// and was created at or before `created_before`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityFilter {
    pub kind: CommentKind,
    pub created_before: DateTime<Utc>,
}

impl EligibilityFilter {
    pub fn new(created_before: DateTime<Utc>) -> Self {
        Self {
            kind: CommentKind::Comment,
            created_before,
        }
    }

    pub fn matches(&self, comment: &CommentRecord) -> bool {
        comment.kind == self.kind
            && comment.has_author_ip()
            && comment.created_at <= self.created_before
    }
}
