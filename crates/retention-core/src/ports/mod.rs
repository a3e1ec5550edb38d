//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 設定ストア・コメントリポジトリ・タイマーはホスト（CMS）側が提供し、
//! retention-core はこれらの trait を通してのみアクセスします。
//!
//! # 設計原則
//! - すべて同期呼び出し（ホストのタイマーから呼ばれる単発ジョブ）
//! - `Send + Sync` を要求し、`Arc<dyn _>` で注入する
//! - グローバル状態は持たない（テストでは差し替え可能）

pub mod settings_store;
pub mod comment_repository;
pub mod timer;
pub mod clock;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::settings_store::SettingsStore;
pub use self::comment_repository::CommentRepository;
pub use self::timer::Timer;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
