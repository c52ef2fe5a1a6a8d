/// 一つのクエリ区間（ORグループ）の分類結果
///
/// 各バケットは出現順を保持したリスト。重複除去は行わない
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedQuery {
    /// 引用符で囲まれた完全一致フレーズ（引用符なし）
    pub phrases: Vec<String>,
    /// 通常キーワード
    pub keywords: Vec<String>,
    /// `-word` 形式の除外ワード（`-` なし）
    pub exclude_words: Vec<String>,
    /// `from:` 指定アカウント
    pub from: Vec<String>,
    /// `to:` 指定アカウント
    pub to: Vec<String>,
    /// `@name` メンション（`@` なし）
    pub mentions: Vec<String>,
    /// `#tag` ハッシュタグ（`#` なし）
    pub hashtags: Vec<String>,
    /// `lang:` 言語コード
    pub langs: Vec<String>,
    /// `since:` 開始日。複数指定時は後勝ち
    pub since: Option<String>,
    /// `until:` 終了日。複数指定時は後勝ち
    pub until: Option<String>,
    /// エンゲージメント下限条件
    pub mins: Vec<EngagementMin>,
    /// `filter:` 包含コンテンツフィルター
    pub filters_include: Vec<String>,
    /// `-filter:` 除外コンテンツフィルター
    pub filters_exclude: Vec<String>,
    /// `url:` 包含URLフィルター
    pub urls_include: Vec<String>,
    /// `-url:` 除外URLフィルター
    pub urls_exclude: Vec<String>,
}

impl ParsedQuery {
    /// どのバケットも空なら真。フォールバック行の判定に使う
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
            && self.keywords.is_empty()
            && self.exclude_words.is_empty()
            && self.from.is_empty()
            && self.to.is_empty()
            && self.mentions.is_empty()
            && self.hashtags.is_empty()
            && self.langs.is_empty()
            && self.since.is_none()
            && self.until.is_none()
            && self.mins.is_empty()
            && self.filters_include.is_empty()
            && self.filters_exclude.is_empty()
            && self.urls_include.is_empty()
            && self.urls_exclude.is_empty()
    }
}

/// `min_faves:` / `min_retweets:` / `min_replies:` 条件ひとつ分
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementMin {
    /// `-` を除いた `key:value` 原文
    pub raw: String,
    /// `-` 付きで指定されたか
    pub negated: bool,
}
