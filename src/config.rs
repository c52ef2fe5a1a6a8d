//! 設定モジュール。フィルターラベル表のJSON読み込みを担当

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// 設定読み込みエラー
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "設定エラー: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// `filter:` キーから説明文への対応表
///
/// 包含側と除外側で文言が異なる（除外側に follows は無い）。
/// 表に無いキーは呼び出し側で定型文にフォールバックする
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterLabels {
    pub include: HashMap<String, String>,
    pub exclude: HashMap<String, String>,
}

impl FilterLabels {
    /// JSONファイルからラベル表を読み込む
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(ConfigError::new(format!(
                "設定ファイルが存在しません: {}",
                path_ref.display()
            )));
        }

        let content = fs::read_to_string(path_ref).map_err(|e| {
            ConfigError::new(format!(
                "設定ファイルを読み込めません {}: {}",
                path_ref.display(),
                e
            ))
        })?;

        let labels: FilterLabels = serde_json::from_str(&content).map_err(|e| {
            ConfigError::new(format!(
                "JSON設定ファイルを解析できません {}: {}",
                path_ref.display(),
                e
            ))
        })?;

        Ok(labels)
    }

    /// 包含側ラベル。キーは小文字で引く
    pub fn include_label(&self, key: &str) -> Option<&str> {
        self.include.get(key).map(String::as_str)
    }

    /// 除外側ラベル。キーは小文字で引く
    pub fn exclude_label(&self, key: &str) -> Option<&str> {
        self.exclude.get(key).map(String::as_str)
    }
}

impl Default for FilterLabels {
    fn default() -> Self {
        let mut include = HashMap::new();
        include.insert("media".to_string(), "画像・動画のみ".to_string());
        include.insert("images".to_string(), "画像のみ".to_string());
        include.insert("videos".to_string(), "動画のみ".to_string());
        include.insert("links".to_string(), "リンクを含む".to_string());
        include.insert("replies".to_string(), "リプライのみ".to_string());
        include.insert("quote".to_string(), "引用のみ".to_string());
        include.insert("verified".to_string(), "認証済みのみ".to_string());
        include.insert("follows".to_string(), "フォロー中のみ".to_string());

        let mut exclude = HashMap::new();
        exclude.insert("media".to_string(), "画像・動画を除く".to_string());
        exclude.insert("images".to_string(), "画像を除く".to_string());
        exclude.insert("videos".to_string(), "動画を除く".to_string());
        exclude.insert("links".to_string(), "リンクを除く".to_string());
        exclude.insert("replies".to_string(), "リプライを除く".to_string());
        exclude.insert("quote".to_string(), "引用を除く".to_string());
        exclude.insert("verified".to_string(), "認証済みを除く".to_string());

        Self { include, exclude }
    }
}
