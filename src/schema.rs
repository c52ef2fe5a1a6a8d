//! 入力フォームの明示的スキーマ
//!
//! フィールドは固定の (ID, 種別) 一覧で宣言する。ビルダーと永続化層の
//! 両方がこの一覧を参照し、実行時の動的探索は行わない

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// フィールドの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 自由入力テキスト
    Text,
    /// オン/オフのトグル
    Flag,
}

/// 全フォームフィールドの宣言。順序はビルダーの出力順とは独立
pub const FIELD_SCHEMA: &[(&str, FieldKind)] = &[
    ("q_phrase_input", FieldKind::Text),
    ("q_from", FieldKind::Text),
    ("q_to", FieldKind::Text),
    ("q_at_search", FieldKind::Text),
    ("only_verified", FieldKind::Flag),
    ("exclude_verified", FieldKind::Flag),
    ("only_following", FieldKind::Flag),
    ("exclude_following", FieldKind::Flag),
    ("only_replies", FieldKind::Flag),
    ("exclude_replies", FieldKind::Flag),
    ("only_quote", FieldKind::Flag),
    ("exclude_quote", FieldKind::Flag),
    ("only_links", FieldKind::Flag),
    ("exclude_links", FieldKind::Flag),
    ("only_media", FieldKind::Flag),
    ("exclude_media", FieldKind::Flag),
    ("only_images", FieldKind::Flag),
    ("exclude_images", FieldKind::Flag),
    ("only_videos", FieldKind::Flag),
    ("exclude_videos", FieldKind::Flag),
    ("q_min_likes", FieldKind::Text),
    ("q_min_retweets", FieldKind::Text),
    ("q_min_replies", FieldKind::Text),
    ("q_lang_select", FieldKind::Text),
    ("q_since_date", FieldKind::Text),
    ("q_until_date", FieldKind::Text),
    ("q_misc", FieldKind::Text),
    ("q_url", FieldKind::Text),
];

/// 折りたたみ状態を保存するセクション名。既定は全て展開
pub const COLLAPSE_SECTIONS: &[&str] = &[
    "collapse_basic",
    "collapse_account",
    "collapse_period",
    "collapse_engagement",
    "collapse_other",
    "collapse_type",
];

/// スキーマからフィールド種別を引く
pub fn kind_of(id: &str) -> Option<FieldKind> {
    FIELD_SCHEMA
        .iter()
        .find(|(field_id, _)| *field_id == id)
        .map(|(_, kind)| *kind)
}

/// フィールドひとつ分の値
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

/// フォーム全体の現在値
///
/// スキーマに無いIDへの書き込みは黙って無視する。未設定のフィールドは
/// 空文字列 / false として読める
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormState {
    values: BTreeMap<String, FieldValue>,
}

/// 復元もスキーマを通す。保存データに紛れ込んだ未知のIDや
/// 種別違いの値はここで捨てる
impl<'de> Deserialize<'de> for FormState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = BTreeMap::<String, FieldValue>::deserialize(deserializer)?;
        let mut state = FormState::new();
        for (id, value) in raw {
            match value {
                FieldValue::Text(s) => state.set_text(&id, s),
                FieldValue::Flag(b) => state.set_flag(&id, b),
            }
        }
        Ok(state)
    }
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, id: &str) -> &str {
        match self.values.get(id) {
            Some(FieldValue::Text(s)) => s,
            _ => "",
        }
    }

    pub fn flag(&self, id: &str) -> bool {
        matches!(self.values.get(id), Some(FieldValue::Flag(true)))
    }

    pub fn set_text(&mut self, id: &str, value: impl Into<String>) {
        if let Some(FieldKind::Text) = kind_of(id) {
            self.values.insert(id.to_string(), FieldValue::Text(value.into()));
        }
    }

    pub fn set_flag(&mut self, id: &str, value: bool) {
        if let Some(FieldKind::Flag) = kind_of(id) {
            self.values.insert(id.to_string(), FieldValue::Flag(value));
        }
    }

    /// 全フィールドを既定値（空 / false）へ戻す
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// 保存済みスナップショットの値を適用する。スキーマ外のキーは捨てる
    pub fn apply(&mut self, snapshot: &FormState) {
        for (id, value) in &snapshot.values {
            match (kind_of(id), value) {
                (Some(FieldKind::Text), FieldValue::Text(s)) => {
                    self.values.insert(id.clone(), FieldValue::Text(s.clone()));
                }
                (Some(FieldKind::Flag), FieldValue::Flag(b)) => {
                    self.values.insert(id.clone(), FieldValue::Flag(*b));
                }
                _ => {}
            }
        }
    }

    /// どのフィールドにも実質的な値が無いか
    pub fn is_blank(&self) -> bool {
        self.values.values().all(|v| match v {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Flag(b) => !b,
        })
    }
}
