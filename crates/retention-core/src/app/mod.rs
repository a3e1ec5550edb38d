//! App - アプリケーション層
//!
//! ports を組み合わせて retention ジョブを実装します。
//!
//! # 主要コンポーネント
//! - **PolicySettings**: 設定ストア上のポリシー（検証付きの読み書き）
//! - **ScheduleManager**: 定期ジョブをポリシーと一致させる
//! - **PurgeProcessor**: 1 回分の purge（件数確認 → 再スケジュール → 100 件更新）
//! - **ActivationNotice**: 有効化直後の一度きりの案内
//! - **RetentionService**: 上記をまとめたホスト向けの窓口（builder で構築）

pub mod config;
pub mod validation;
pub mod settings;
pub mod schedule;
pub mod processor;
pub mod notice;
pub mod service;

// 主要な型を再エクスポート
pub use self::config::ProcessorConfig;
pub use self::settings::PolicySettings;
pub use self::schedule::ScheduleManager;
pub use self::processor::{PurgeOutcome, PurgeProcessor, SkipReason};
pub use self::notice::{ActivationNotice, Notice};
pub use self::service::{BuildError, RetentionService, RetentionServiceBuilder, RetentionStatus};
