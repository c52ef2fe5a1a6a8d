//! クエリビルダー。フォーム値から検索クエリ文字列を組み立てる逆方向

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::analyzer::has_prefix_ci;
use crate::lexer::Lexer;
use crate::schema::FormState;
use crate::token::TokenKind;

/// トグル欄と `filter:` キーの対応。出力順はこの並びで固定
const TOGGLE_FILTERS: &[(&str, &str, &str)] = &[
    ("only_verified", "exclude_verified", "verified"),
    ("only_following", "exclude_following", "follows"),
    ("only_replies", "exclude_replies", "replies"),
    ("only_quote", "exclude_quote", "quote"),
    ("only_links", "exclude_links", "links"),
    ("only_media", "exclude_media", "media"),
    ("only_images", "exclude_images", "images"),
    ("only_videos", "exclude_videos", "videos"),
];

/// 数値欄と演算子の対応
const MIN_FIELDS: &[(&str, &str)] = &[
    ("q_min_likes", "min_faves"),
    ("q_min_retweets", "min_retweets"),
    ("q_min_replies", "min_replies"),
];

/// 値が空でないASCII数字のみの並びか。前後の空白も不可
fn is_strict_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// フレーズ欄をトークン化し、通常の単語だけ引用符で囲む。
/// OR・括弧・既に引用済みのトークンはそのまま通す
fn quote_phrase_field(raw: &str) -> Option<String> {
    let processed: Vec<String> = Lexer::new(raw)
        .map(|token| {
            let text = token.kind.text();
            if matches!(
                token.kind,
                TokenKind::Or | TokenKind::LParen | TokenKind::RParen
            ) || text.eq_ignore_ascii_case("OR")
                || (text.starts_with('"') && text.ends_with('"'))
            {
                text.to_string()
            } else {
                format!("\"{}\"", text.replace('"', "\\\""))
            }
        })
        .collect();
    if processed.is_empty() {
        None
    } else {
        Some(processed.join(" "))
    }
}

/// フォーム値を検索クエリ文字列ひとつに直列化する
///
/// 出力順は固定：フレーズ → from/to/@ → タイプ指定トグル →
/// コンテンツトグル → エンゲージ下限 → lang → since/until →
/// 自由入力 → URL。空欄は出力しない
pub fn build_query(state: &FormState) -> String {
    let mut parts: Vec<String> = Vec::new();

    let phrase_raw = state.text("q_phrase_input").trim();
    if !phrase_raw.is_empty() {
        if let Some(phrase_part) = quote_phrase_field(phrase_raw) {
            parts.push(phrase_part);
        }
    }

    let from = state.text("q_from").trim();
    if !from.is_empty() {
        parts.push(format!("from:{}", from));
    }
    let to = state.text("q_to").trim();
    if !to.is_empty() {
        parts.push(format!("to:{}", to));
    }
    let at = state.text("q_at_search").trim();
    if !at.is_empty() {
        if at.starts_with('@') {
            parts.push(at.to_string());
        } else {
            parts.push(format!("@{}", at));
        }
    }

    // 包含と除外は独立したフラグ。排他はUI側の責務
    for (only_id, exclude_id, key) in TOGGLE_FILTERS {
        if state.flag(only_id) {
            parts.push(format!("filter:{}", key));
        }
        if state.flag(exclude_id) {
            parts.push(format!("-filter:{}", key));
        }
    }

    for (id, op) in MIN_FIELDS {
        let value = state.text(id);
        if is_strict_digits(value) {
            parts.push(format!("{}:{}", op, value));
        }
    }

    let lang = state.text("q_lang_select");
    if !lang.is_empty() {
        parts.push(format!("lang:{}", lang));
    }

    let since = convert_yymmdd(state.text("q_since_date"));
    if !since.is_empty() {
        parts.push(format!("since:{}", since));
    }
    let until = convert_yymmdd(state.text("q_until_date"));
    if !until.is_empty() {
        parts.push(format!("until:{}", until));
    }

    let misc = state.text("q_misc").trim();
    if !misc.is_empty() {
        parts.push(misc.to_string());
    }

    let url = state.text("q_url").trim();
    if !url.is_empty() {
        if has_prefix_ci(url, "url:") {
            parts.push(url.to_string());
        } else {
            parts.push(format!("url:{}", url));
        }
    }

    parts.join(" ").trim().to_string()
}

/// yymmdd を ISO 日付（YYYY-MM-DD）へ変換する
///
/// 2桁年は 50 未満を 20xx、それ以外を 19xx とみなす。
/// 桁数違いや数字以外を含む入力は空文字列を返す
pub fn convert_yymmdd(value: &str) -> String {
    let s = value.trim();
    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return String::new();
    }
    let yy: u32 = s[..2].parse().unwrap_or(0);
    let century = if yy < 50 { "20" } else { "19" };
    format!("{}{}-{}-{}", century, &s[..2], &s[2..4], &s[4..6])
}

fn format_yymmdd(date: NaiveDate) -> String {
    format!(
        "{:02}{:02}{:02}",
        date.year() % 100,
        date.month(),
        date.day()
    )
}

/// 期間プリセット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickPeriod {
    OneHour,
    OneDay,
    Days7,
    Days31,
    Days180,
    Days365,
}

impl QuickPeriod {
    fn window(&self) -> Duration {
        match self {
            QuickPeriod::OneHour => Duration::hours(1),
            QuickPeriod::OneDay => Duration::days(1),
            QuickPeriod::Days7 => Duration::days(7),
            QuickPeriod::Days31 => Duration::days(31),
            QuickPeriod::Days180 => Duration::days(180),
            QuickPeriod::Days365 => Duration::days(365),
        }
    }

    fn window_days(&self) -> i64 {
        match self {
            QuickPeriod::OneHour | QuickPeriod::OneDay => 1,
            QuickPeriod::Days7 => 7,
            QuickPeriod::Days31 => 31,
            QuickPeriod::Days180 => 180,
            QuickPeriod::Days365 => 365,
        }
    }
}

/// 日付入力の検証エラー。利用者向けメッセージをそのまま持つ
#[derive(Debug, Clone, PartialEq)]
pub struct DateError {
    pub message: String,
}

impl std::fmt::Display for DateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DateError {}

impl DateError {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// 「直近N」ボタン：現在時刻から遡った (since, until) の yymmdd 対を返す
///
/// `until:` は排他的な上限なので、今日を含めるため1日進める
pub fn quick_period(now: NaiveDateTime, period: QuickPeriod) -> (String, String) {
    let since = now - period.window();
    let until = now + Duration::days(1);
    (format_yymmdd(since.date()), format_yymmdd(until.date()))
}

/// 「開始日からN」ボタン：yymmdd の開始日に期間を足した until を返す
///
/// 終端も排他境界の外に出すため、期間に加えてさらに1日進める。
/// 不正な開始日は利用者に提示する検証メッセージになる
pub fn period_from(since_field: &str, period: QuickPeriod) -> Result<String, DateError> {
    let s = since_field.trim();
    if s.len() != 6 {
        return Err(DateError::new("開始日を先に入力してください（yymmdd形式）"));
    }
    let invalid = || DateError::new("開始日が無効です");
    // 数字以外（多バイト文字を含む）はスライス前に弾く
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let yy: i32 = s[..2].parse().map_err(|_| invalid())?;
    let mm: u32 = s[2..4].parse().map_err(|_| invalid())?;
    let dd: u32 = s[4..6].parse().map_err(|_| invalid())?;
    let since = NaiveDate::from_ymd_opt(2000 + yy, mm, dd).ok_or_else(invalid)?;
    let until = since + Duration::days(period.window_days()) + Duration::days(1);
    Ok(format_yymmdd(until))
}

/// 検索結果タブ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTab {
    Top,
    Latest,
    Media,
}

/// RFC 3986 の unreserved 以外を %XX に符号化する
fn url_encode_component(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len() + 8);
    for &b in s.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(b));
            }
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0F) as usize]));
            }
        }
    }
    out
}

/// 検索URLを組み立てる
///
/// `f` パラメータはタブ選択から決まり、クエリ中の
/// `filter:images` / `filter:videos` / `filter:media` が順に上書きする
pub fn build_search_url(query: &str, tab: ResultTab) -> String {
    let mut f = match tab {
        ResultTab::Media => Some("media"),
        ResultTab::Latest => Some("live"),
        ResultTab::Top => None,
    };
    if query.contains("filter:images") {
        f = Some("images");
    }
    if query.contains("filter:videos") {
        f = Some("videos");
    }
    if query.contains("filter:media") {
        f = Some("media");
    }

    let mut url = format!("https://x.com/search?q={}", url_encode_component(query));
    if let Some(f) = f {
        url.push_str("&f=");
        url.push_str(&url_encode_component(f));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterLabels;
    use crate::explain::explain_query;

    #[test]
    fn test_fixed_emission_order() {
        let mut state = FormState::new();
        state.set_text("q_from", "alice");
        state.set_text("q_min_likes", "50");
        state.set_text("q_lang_select", "en");
        assert_eq!(build_query(&state), "from:alice min_faves:50 lang:en");
    }

    #[test]
    fn test_empty_form_builds_empty_query() {
        assert_eq!(build_query(&FormState::new()), "");
    }

    #[test]
    fn test_phrase_field_quoting() {
        let mut state = FormState::new();
        state.set_text("q_phrase_input", r#"hello world (foo OR bar)"#);
        assert_eq!(build_query(&state), r#""hello" "world" ( "foo" OR "bar" )"#);
    }

    #[test]
    fn test_phrase_field_passthrough_and_escape() {
        let mut state = FormState::new();
        state.set_text("q_phrase_input", r#""a b" or c ab"cd"#);
        // 既に引用済みと大小無視の OR はそのまま、内部の引用符はエスケープ
        assert_eq!(build_query(&state), r#""a b" or "c" "ab\"cd""#);
    }

    #[test]
    fn test_mention_auto_prefix() {
        let mut state = FormState::new();
        state.set_text("q_at_search", "name");
        assert_eq!(build_query(&state), "@name");
        state.set_text("q_at_search", "@name");
        assert_eq!(build_query(&state), "@name");
    }

    #[test]
    fn test_toggle_emission_order() {
        let mut state = FormState::new();
        for (only_id, exclude_id, _) in TOGGLE_FILTERS {
            state.set_flag(only_id, true);
            state.set_flag(exclude_id, true);
        }
        assert_eq!(
            build_query(&state),
            "filter:verified -filter:verified filter:follows -filter:follows \
             filter:replies -filter:replies filter:quote -filter:quote \
             filter:links -filter:links filter:media -filter:media \
             filter:images -filter:images filter:videos -filter:videos"
        );
    }

    #[test]
    fn test_min_fields_require_strict_digits() {
        let mut state = FormState::new();
        state.set_text("q_min_likes", " 50");
        state.set_text("q_min_retweets", "50x");
        state.set_text("q_min_replies", "");
        assert_eq!(build_query(&state), "");
        state.set_text("q_min_likes", "50");
        assert_eq!(build_query(&state), "min_faves:50");
    }

    #[test]
    fn test_date_fields() {
        let mut state = FormState::new();
        state.set_text("q_since_date", "230615");
        state.set_text("q_until_date", "990101");
        assert_eq!(build_query(&state), "since:2023-06-15 until:1999-01-01");
    }

    #[test]
    fn test_malformed_dates_are_omitted() {
        let mut state = FormState::new();
        state.set_text("q_since_date", "12345");
        state.set_text("q_until_date", "abcdef");
        assert_eq!(build_query(&state), "");
    }

    #[test]
    fn test_misc_and_url_fields() {
        let mut state = FormState::new();
        state.set_text("q_misc", "  near:tokyo  ");
        state.set_text("q_url", "example.com");
        assert_eq!(build_query(&state), "near:tokyo url:example.com");
        state.set_text("q_url", "URL:example.com");
        assert_eq!(build_query(&state), "near:tokyo URL:example.com");
    }

    #[test]
    fn test_round_trip_gives_non_empty_explanation() {
        let mut state = FormState::new();
        state.set_text("q_phrase_input", "rust");
        state.set_flag("only_media", true);
        let built = build_query(&state);
        let explanation = explain_query(&built, &FilterLabels::default());
        assert!(!explanation.lines.is_empty());
        assert_ne!(explanation.lines[0], crate::explain::FALLBACK_LINE);
    }

    #[test]
    fn test_convert_yymmdd() {
        assert_eq!(convert_yymmdd("230615"), "2023-06-15");
        assert_eq!(convert_yymmdd("990101"), "1999-01-01");
        assert_eq!(convert_yymmdd("490101"), "2049-01-01");
        assert_eq!(convert_yymmdd("500101"), "1950-01-01");
        assert_eq!(convert_yymmdd("12345"), "");
        assert_eq!(convert_yymmdd("abcdef"), "");
        assert_eq!(convert_yymmdd(""), "");
    }

    #[test]
    fn test_quick_period_advances_until_one_day() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let (since, until) = quick_period(now, QuickPeriod::OneDay);
        assert_eq!(since, "240309");
        assert_eq!(until, "240311");

        let (since, _) = quick_period(now, QuickPeriod::OneHour);
        assert_eq!(since, "240310");
        let (since, _) = quick_period(now, QuickPeriod::Days365);
        assert_eq!(since, "230311");
    }

    #[test]
    fn test_period_from_adds_exclusive_day() {
        assert_eq!(period_from("230601", QuickPeriod::Days7).unwrap(), "230609");
        assert_eq!(period_from("230601", QuickPeriod::OneDay).unwrap(), "230603");
    }

    #[test]
    fn test_period_from_validation_messages() {
        let err = period_from("", QuickPeriod::Days7).unwrap_err();
        assert_eq!(err.message, "開始日を先に入力してください（yymmdd形式）");
        let err = period_from("231345", QuickPeriod::Days7).unwrap_err();
        assert_eq!(err.message, "開始日が無効です");
        let err = period_from("ab0101", QuickPeriod::Days7).unwrap_err();
        assert_eq!(err.message, "開始日が無効です");
        // 6バイトちょうどの多バイト入力もエラーになる
        let err = period_from("あい", QuickPeriod::Days7).unwrap_err();
        assert_eq!(err.message, "開始日が無効です");
    }

    #[test]
    fn test_search_url_tab_and_overrides() {
        assert_eq!(
            build_search_url("rust lang:ja", ResultTab::Top),
            "https://x.com/search?q=rust%20lang%3Aja"
        );
        assert_eq!(
            build_search_url("rust", ResultTab::Latest),
            "https://x.com/search?q=rust&f=live"
        );
        // クエリ中の filter: がタブ選択を上書きする
        assert_eq!(
            build_search_url("rust filter:images", ResultTab::Top),
            "https://x.com/search?q=rust%20filter%3Aimages&f=images"
        );
        assert_eq!(
            build_search_url("filter:images filter:media", ResultTab::Latest),
            "https://x.com/search?q=filter%3Aimages%20filter%3Amedia&f=media"
        );
    }
}
