//! SettingsStore port - ホストの key/value 設定ストア
//!
//! 値はすべて文字列で保存されます（型付けは app::settings が担当）。

use crate::domain::RetentionError;

/// SettingsStore は文字列キー・文字列値の永続ストア
///
/// # 前提
/// - キー単位の読み書きはアトミック
/// - 存在しないキーの `remove` はエラーにしない
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, RetentionError>;

    fn set(&self, key: &str, value: &str) -> Result<(), RetentionError>;

    /// Returns whether the key existed.
    fn remove(&self, key: &str) -> Result<bool, RetentionError>;
}
