//! 編集セッション
//!
//! フォーム値・折りたたみ状態・手入力クエリの上書きをひとつに束ね、
//! 変更をデバウンスしてストアへ書き戻す。時刻は引数で受け取るので
//! テストでは任意の Instant を注入できる

use chrono::NaiveDateTime;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::builder::build_query;
use crate::schema::FormState;
use crate::storage::{HistoryEntry, HistoryLog, KvStore, Preset, PresetStore};

/// フォーム状態の保存キー
pub const STORAGE_KEY: &str = "xsearch_state_v3";
/// 保存デバウンスの待ち時間（ミリ秒）
pub const SAVE_DEBOUNCE_MS: u64 = 200;

/// 書き戻しのデバウンス管理。変更のたびに締め切りを先送りする
#[derive(Debug)]
struct DebouncedSave {
    window: Duration,
    deadline: Option<Instant>,
}

impl DebouncedSave {
    fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// 締め切りを過ぎていたら消費して true を返す
    fn due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// ストアへ保存する形。フォーム値とセクションの折りたたみ状態
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub values: FormState,
    #[serde(default)]
    pub collapsed: BTreeMap<String, bool>,
}

/// 検索フォームの編集セッション
pub struct Session<S: KvStore> {
    store: S,
    state: PersistedState,
    /// 手入力でクエリを上書きしている間 Some。フォーム編集で解除される
    manual_override: Option<String>,
    presets: PresetStore,
    history: HistoryLog,
    save: DebouncedSave,
}

impl<S: KvStore> Session<S> {
    /// ストアから前回の状態を復元してセッションを開く。
    /// 復元に失敗しても警告を出して初期状態から始める
    pub fn open(store: S) -> Self {
        let state = match store.get(STORAGE_KEY) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(state) => state,
                Err(e) => {
                    warn!("保存済み状態を復元できません: {}", e);
                    PersistedState::default()
                }
            },
            None => PersistedState::default(),
        };
        let presets = PresetStore::load(&store);
        let history = HistoryLog::load(&store);
        Self {
            store,
            state,
            manual_override: None,
            presets,
            history,
            save: DebouncedSave::new(Duration::from_millis(SAVE_DEBOUNCE_MS)),
        }
    }

    pub fn values(&self) -> &FormState {
        &self.state.values
    }

    pub fn is_collapsed(&self, section: &str) -> bool {
        self.state.collapsed.get(section).copied().unwrap_or(false)
    }

    /// テキスト欄を更新する。手入力の上書きは解除される
    pub fn set_text(&mut self, id: &str, value: &str, now: Instant) {
        self.state.values.set_text(id, value);
        self.manual_override = None;
        self.save.schedule(now);
    }

    /// チェック欄を更新する。手入力の上書きは解除される
    pub fn set_flag(&mut self, id: &str, value: bool, now: Instant) {
        self.state.values.set_flag(id, value);
        self.manual_override = None;
        self.save.schedule(now);
    }

    pub fn set_collapsed(&mut self, section: &str, collapsed: bool, now: Instant) {
        self.state.collapsed.insert(section.to_string(), collapsed);
        self.save.schedule(now);
    }

    /// 現在のプレビュー文字列。手入力の上書きがあればそちらを優先する
    pub fn preview(&self) -> String {
        match &self.manual_override {
            Some(query) => query.clone(),
            None => build_query(&self.state.values),
        }
    }

    /// クエリ文字列を直接上書きする
    pub fn set_manual_query(&mut self, query: &str) {
        self.manual_override = Some(query.to_string());
    }

    /// 手入力の上書きを破棄してフォーム由来のクエリに戻す
    pub fn restore_from_form(&mut self) {
        self.manual_override = None;
    }

    /// フォームを全消去する
    pub fn reset(&mut self, now: Instant) {
        self.state.values.clear();
        self.manual_override = None;
        self.save.schedule(now);
    }

    /// デバウンス締め切りを確認し、過ぎていれば書き戻す
    pub fn tick(&mut self, now: Instant) {
        if self.save.due(now) {
            self.persist();
        }
    }

    /// 保留中かどうかにかかわらず今すぐ書き戻す
    pub fn flush(&mut self) {
        self.save.deadline = None;
        self.persist();
    }

    fn persist(&mut self) {
        match serde_json::to_string(&self.state) {
            Ok(json) => {
                if let Err(e) = self.store.set(STORAGE_KEY, &json) {
                    warn!("状態を保存できません: {}", e);
                }
            }
            Err(e) => warn!("状態を直列化できません: {}", e),
        }
    }

    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }

    /// 現在の内容をプリセットへ保存する。手入力の上書き中は
    /// 生クエリごと保存する
    pub fn save_preset(&mut self, slot: u8, title: &str) {
        let preset = Preset {
            title: title.to_string(),
            data: Some(self.state.values.clone()),
            raw_query: self.manual_override.clone(),
        };
        self.presets.save_slot(&mut self.store, slot, preset);
    }

    /// プリセットを読み込む。生クエリ付きならそれを上書きとして復元する
    pub fn apply_preset(&mut self, slot: u8, now: Instant) -> bool {
        let Some(preset) = self.presets.get(slot).cloned() else {
            return false;
        };
        if let Some(data) = &preset.data {
            self.state.values.apply(data);
        }
        self.manual_override = preset.raw_query;
        self.save.schedule(now);
        true
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    pub fn clear_history(&mut self) {
        self.history.clear(&mut self.store);
    }

    /// 履歴の1件をフォームへ復元する
    pub fn apply_history(&mut self, index: usize, now: Instant) -> bool {
        let Some(entry) = self.history.entries().get(index).cloned() else {
            return false;
        };
        self.state.values.apply(&entry.data);
        self.manual_override = None;
        self.save.schedule(now);
        true
    }

    /// 検索実行を記録する。空クエリは記録せず None を返す
    pub fn record_search(&mut self, executed_at: NaiveDateTime) -> Option<String> {
        let query = self.preview();
        if query.is_empty() {
            return None;
        }
        let entry = HistoryEntry {
            date: executed_at.format("%Y/%m/%d").to_string(),
            query: query.clone(),
            data: self.state.values.clone(),
        };
        self.history.push(&mut self.store, entry);
        Some(query)
    }
}
