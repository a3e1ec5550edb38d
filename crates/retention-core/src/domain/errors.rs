//! Errors - ポートから返るエラー
//!
//! 不正な設定入力はエラーにしない（保存済みの値にフォールバック）。
//! ここに来るのは外部コラボレータ（リポジトリ・設定ストア・タイマー）の障害のみ。

use thiserror::Error;

use super::ids::CommentId;

#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("comment repository: {0}")]
    Repository(String),

    #[error("comment not found: {0}")]
    CommentNotFound(CommentId),

    #[error("settings store: {0}")]
    Settings(String),

    #[error("timer: {0}")]
    Timer(String),
}
