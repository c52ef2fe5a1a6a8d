//! 永続化層
//!
//! キーバリューストアの抽象と、その上に載るプリセット・検索履歴。
//! 保存の失敗は警告ログに残して握りつぶす。設定値が消えても
//! 致命的ではないため、呼び出し側へはエラーを伝播しない

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::schema::FormState;

/// プリセット保存キー
pub const PRESET_KEY: &str = "x_presets";
/// 検索履歴保存キー
pub const HISTORY_KEY: &str = "x_history";
/// 履歴の最大保持件数
pub const HISTORY_LIMIT: usize = 30;
/// プリセットのスロット数（1始まり）
pub const PRESET_SLOTS: u8 = 5;

/// ストア操作エラー
#[derive(Debug)]
pub struct StoreError {
    pub message: String,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ストアエラー: {}", self.message)
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// 永続ストアの抽象。グローバル参照ではなく注入して使う
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: KvStore + ?Sized> KvStore for &mut S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// テスト用のインメモリストア
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSONファイル1枚にキー→値の表を保存するストア
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    /// ファイルを読み込んでストアを開く。壊れた内容は警告して空から始める
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("ストアファイルを解析できません {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, entries }
    }

    fn persist(&self) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| StoreError::new(format!("直列化に失敗: {}", e)))?;
        fs::write(&self.path, content).map_err(|e| {
            StoreError::new(format!("書き込みに失敗 {}: {}", self.path.display(), e))
        })
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        self.persist()
    }
}

/// 名前付きスロットひとつ分の保存内容
///
/// フォーム値のスナップショットか、手入力の生クエリのどちらか
/// （両方持つこともある。生クエリが優先して表示される）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<FormState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_query: Option<String>,
}

/// プリセット一式。スロット番号は 1..=PRESET_SLOTS
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetStore {
    slots: BTreeMap<u8, Preset>,
}

impl PresetStore {
    pub fn load(store: &dyn KvStore) -> Self {
        let Some(raw) = store.get(PRESET_KEY) else {
            return Self::default();
        };
        match serde_json::from_str(&raw) {
            Ok(slots) => slots,
            Err(e) => {
                warn!("プリセットを読み込めません: {}", e);
                Self::default()
            }
        }
    }

    pub fn get(&self, slot: u8) -> Option<&Preset> {
        self.slots.get(&slot)
    }

    /// スロットへ保存して永続化する。範囲外のスロット番号は無視
    pub fn save_slot(&mut self, store: &mut dyn KvStore, slot: u8, preset: Preset) {
        if slot == 0 || slot > PRESET_SLOTS {
            return;
        }
        self.slots.insert(slot, preset);
        self.persist(store);
    }

    fn persist(&self, store: &mut dyn KvStore) {
        match serde_json::to_string(&self.slots) {
            Ok(json) => {
                if let Err(e) = store.set(PRESET_KEY, &json) {
                    warn!("プリセットを保存できません: {}", e);
                }
            }
            Err(e) => warn!("プリセットを直列化できません: {}", e),
        }
    }
}

/// 検索履歴1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// `YYYY/MM/DD` 形式の実行日
    pub date: String,
    pub query: String,
    #[serde(default)]
    pub data: FormState,
}

/// 検索履歴。新しい順に最大 HISTORY_LIMIT 件保持する
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn load(store: &dyn KvStore) -> Self {
        let Some(raw) = store.get(HISTORY_KEY) else {
            return Self::default();
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("検索履歴を読み込めません: {}", e);
                Self::default()
            }
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn push(&mut self, store: &mut dyn KvStore, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_LIMIT);
        self.persist(store);
    }

    pub fn clear(&mut self, store: &mut dyn KvStore) {
        self.entries.clear();
        self.persist(store);
    }

    fn persist(&self, store: &mut dyn KvStore) {
        match serde_json::to_string(&self.entries) {
            Ok(json) => {
                if let Err(e) = store.set(HISTORY_KEY, &json) {
                    warn!("検索履歴を保存できません: {}", e);
                }
            }
            Err(e) => warn!("検索履歴を直列化できません: {}", e),
        }
    }
}
