//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemorySettingsStore**: BTreeMap ベースの設定ストア
//! - **InMemoryCommentRepository**: コメントの正本（テスト・CLI 用）
//! - **InMemoryTimer**: action ごとに 1 ジョブを持つタイマー
//!
//! 本番ではホスト（CMS）側の DB・スケジューラがこれらの ports を実装します。

pub mod inmem_settings;
pub mod inmem_comments;
pub mod inmem_timer;

// 主要な型を再エクスポート
pub use self::inmem_settings::InMemorySettingsStore;
pub use self::inmem_comments::InMemoryCommentRepository;
pub use self::inmem_timer::InMemoryTimer;
