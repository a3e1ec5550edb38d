//! retention-core
//!
//! Core building blocks for the comment IP retention job.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, policy, comment, schedule, errors）
//! - **ports**: 抽象化レイヤー（SettingsStore, CommentRepository, Timer, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（settings, validation, schedule, processor, notice, service）
//! - **impls**: 実装（InMemory* の開発用・テスト用アダプタ）

pub mod domain;
pub mod ports;
pub mod app;
pub mod impls;
