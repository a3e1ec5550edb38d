//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（Clock の時刻 + ランダム部）

use crate::domain::{CommentId, RunId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator はコメントと purge 実行の ID を生成
pub trait IdGenerator: Send + Sync {
    fn generate_comment_id(&self) -> CommentId;

    fn generate_run_id(&self) -> RunId;
}

/// UlidGenerator は Clock を使って現在時刻ベースの ULID を生成
///
/// テストで FixedClock を渡すと timestamp 部分が固定されます。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_comment_id(&self) -> CommentId {
        CommentId::from(self.next_ulid())
    }

    fn generate_run_id(&self) -> RunId {
        RunId::from(self.next_ulid())
    }
}
