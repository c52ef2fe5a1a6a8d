//! クエリ区間の分類器
//!
//! ## 処理の流れ
//!
//! ```text
//! split_by_top_level_or()
//!   └─ 括弧の深さ0にある OR でトークン列をグループに分割
//!
//! extract_info()
//!   ├─ 原文走査でフレーズ（"..."）を回収
//!   └─ トークンごとに分類
//!        ├─ `-` 接頭辞を除去して否定フラグを記録
//!        ├─ 演算子プレフィックス照合（優先順）:
//!        │    from: → to: → lang: → since: → until:
//!        │    → min_faves:/min_retweets:/min_replies:
//!        │    → filter:（否定で除外側） → url:（同）
//!        ├─ @name → メンション, #tag → ハッシュタグ
//!        ├─ 否定かつコロン無し → 除外ワード
//!        └─ それ以外 → キーワード
//! ```
//!
//! `-from:` / `-to:` / `-lang:` はプレフィックス照合が先に走るため
//! 否定が無視され肯定側リストに入る。既知の仕様で、意図確認が
//! 取れるまで挙動を変えない

use crate::ast::{EngagementMin, ParsedQuery};
use crate::lexer::Lexer;
use crate::token::TokenKind;

/// ASCII限定・大文字小文字無視のプレフィックス照合
pub(crate) fn has_prefix_ci(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// トップレベル（括弧の外）の OR でクエリをグループに分割する
///
/// グループの文字列は先頭トークンから末尾トークンまでの原文スライス。
/// 閉じ括弧の過剰は深さ0で打ち止めにして許容する。
/// 先頭・末尾・連続 OR による空グループは捨てる
pub fn split_by_top_level_or(input: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut current: Option<(usize, usize)> = None;

    for token in Lexer::new(input) {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Or if depth == 0 => {
                if let Some((start, end)) = current.take() {
                    groups.push(input[start..end].to_string());
                }
                continue;
            }
            _ => {}
        }
        match &mut current {
            Some((_, end)) => *end = token.span.end,
            None => current = Some((token.span.start, token.span.end)),
        }
    }
    if let Some((start, end)) = current {
        groups.push(input[start..end].to_string());
    }
    groups
}

/// 原文から `"..."` の中身を出現順に集める
///
/// 引用符が連続した場合（`""`）は二つ目を新たな開始引用符として
/// 読み直す。閉じられない引用符は無視する
fn collect_phrases(input: &str, out: &mut Vec<String>) {
    let mut rest = input;
    while let Some(open) = rest.find('"') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('"') else {
            break;
        };
        if close == 0 {
            rest = after_open;
            continue;
        }
        out.push(after_open[..close].to_string());
        rest = &after_open[close + 1..];
    }
}

/// クエリ区間ひとつを意味バケットに分類する
pub fn extract_info(input: &str) -> ParsedQuery {
    let mut info = ParsedQuery::default();
    collect_phrases(input, &mut info.phrases);

    for token in Lexer::new(input) {
        if matches!(
            token.kind,
            TokenKind::Or | TokenKind::LParen | TokenKind::RParen
        ) {
            continue;
        }
        let t = token.kind.text();
        // 両端が引用符のトークンはフレーズとして回収済み
        if t.starts_with('"') && t.ends_with('"') {
            continue;
        }

        let negated = t.starts_with('-');
        let raw = if negated { &t[1..] } else { t };

        if has_prefix_ci(raw, "from:") {
            info.from.push(raw[5..].to_string());
        } else if has_prefix_ci(raw, "to:") {
            info.to.push(raw[3..].to_string());
        } else if has_prefix_ci(raw, "lang:") {
            info.langs.push(raw[5..].to_string());
        } else if has_prefix_ci(raw, "since:") {
            info.since = Some(raw[6..].to_string());
        } else if has_prefix_ci(raw, "until:") {
            info.until = Some(raw[6..].to_string());
        } else if has_prefix_ci(raw, "min_faves:")
            || has_prefix_ci(raw, "min_retweets:")
            || has_prefix_ci(raw, "min_replies:")
        {
            info.mins.push(EngagementMin {
                raw: raw.to_string(),
                negated,
            });
        } else if has_prefix_ci(raw, "filter:") {
            let f = raw[7..].to_string();
            if negated {
                info.filters_exclude.push(f);
            } else {
                info.filters_include.push(f);
            }
        } else if has_prefix_ci(raw, "url:") {
            let u = raw[4..].to_string();
            if negated {
                info.urls_exclude.push(u);
            } else {
                info.urls_include.push(u);
            }
        } else if raw.starts_with('@') && raw.len() > 1 {
            info.mentions.push(raw[1..].to_string());
        } else if raw.starts_with('#') && raw.len() > 1 {
            info.hashtags.push(raw[1..].to_string());
        } else if negated && !raw.is_empty() && !raw.contains(':') {
            info.exclude_words.push(raw.to_string());
        } else {
            info.keywords.push(raw.to_string());
        }
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_split_three_groups() {
        assert_eq!(split_by_top_level_or("a OR b OR c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_or_inside_parens_is_not_a_split_point() {
        assert_eq!(
            split_by_top_level_or("(a OR b) OR c"),
            vec!["(a OR b)", "c"]
        );
    }

    #[test]
    fn test_or_split_drops_empty_groups() {
        assert_eq!(split_by_top_level_or("OR a OR OR b OR"), vec!["a", "b"]);
        assert_eq!(split_by_top_level_or("OR"), Vec::<String>::new());
    }

    #[test]
    fn test_or_split_single_group_without_or() {
        assert_eq!(split_by_top_level_or(r#"foo "a b""#), vec![r#"foo "a b""#]);
    }

    #[test]
    fn test_unbalanced_close_parens_are_tolerated() {
        // 深さは0で打ち止め。その後の OR は分割点のまま
        assert_eq!(split_by_top_level_or(") a OR b"), vec![") a", "b"]);
    }

    #[test]
    fn test_group_text_preserves_phrase_whitespace() {
        let groups = split_by_top_level_or(r#""hello   world" OR x"#);
        assert_eq!(groups, vec![r#""hello   world""#, "x"]);
    }

    #[test]
    fn test_extract_info_full_classification() {
        let info = extract_info(
            r#"from:alice -from:bob "hello world" #tag @mention lang:en since:230101 until:231231 min_faves:10 -min_retweets:5 filter:media -filter:verified url:example.com -url:spam.com foo -bar"#,
        );
        assert_eq!(info.phrases, vec!["hello world"]);
        // -from: は from: プレフィックス照合が先に走るため否定にならない
        assert_eq!(info.from, vec!["alice", "bob"]);
        assert_eq!(info.hashtags, vec!["tag"]);
        assert_eq!(info.mentions, vec!["mention"]);
        assert_eq!(info.langs, vec!["en"]);
        assert_eq!(info.since.as_deref(), Some("230101"));
        assert_eq!(info.until.as_deref(), Some("231231"));
        assert_eq!(info.mins.len(), 2);
        assert_eq!(info.mins[0].raw, "min_faves:10");
        assert!(!info.mins[0].negated);
        assert_eq!(info.mins[1].raw, "min_retweets:5");
        assert!(info.mins[1].negated);
        assert_eq!(info.filters_include, vec!["media"]);
        assert_eq!(info.filters_exclude, vec!["verified"]);
        assert_eq!(info.urls_include, vec!["example.com"]);
        assert_eq!(info.urls_exclude, vec!["spam.com"]);
        assert_eq!(info.keywords, vec!["foo"]);
        assert_eq!(info.exclude_words, vec!["bar"]);
    }

    #[test]
    fn test_extract_info_prefixes_are_case_insensitive() {
        let info = extract_info("FROM:Alice Filter:Media LANG:ja");
        assert_eq!(info.from, vec!["Alice"]);
        assert_eq!(info.filters_include, vec!["Media"]);
        assert_eq!(info.langs, vec!["ja"]);
    }

    #[test]
    fn test_extract_info_since_until_last_write_wins() {
        let info = extract_info("since:230101 since:230201 until:230301 until:230401");
        assert_eq!(info.since.as_deref(), Some("230201"));
        assert_eq!(info.until.as_deref(), Some("230401"));
    }

    #[test]
    fn test_extract_info_keeps_duplicates_in_order() {
        let info = extract_info("foo foo #a #a");
        assert_eq!(info.keywords, vec!["foo", "foo"]);
        assert_eq!(info.hashtags, vec!["a", "a"]);
    }

    #[test]
    fn test_extract_info_bare_sigils_are_keywords() {
        let info = extract_info("@ #");
        assert_eq!(info.keywords, vec!["@", "#"]);
        assert!(info.mentions.is_empty());
        assert!(info.hashtags.is_empty());
    }

    #[test]
    fn test_extract_info_negated_operator_word_is_keyword() {
        // コロンを含む否定語は除外ワードにならない
        let info = extract_info("-foo:bar");
        assert_eq!(info.keywords, vec!["foo:bar"]);
        assert!(info.exclude_words.is_empty());
    }

    #[test]
    fn test_extract_info_phrase_token_skipped_but_phrase_kept() {
        let info = extract_info(r#""hello world""#);
        assert_eq!(info.phrases, vec!["hello world"]);
        assert!(info.keywords.is_empty());
    }

    #[test]
    fn test_extract_info_interior_quotes_collected_from_raw_scan() {
        // トークンとしては ab"cd" だが原文走査で cd がフレーズになる
        let info = extract_info(r#"ab"cd""#);
        assert_eq!(info.phrases, vec!["cd"]);
        assert_eq!(info.keywords, vec![r#"ab"cd""#]);
    }

    #[test]
    fn test_extract_info_empty_input() {
        assert!(extract_info("").is_empty());
        assert!(extract_info("  ").is_empty());
    }

    #[test]
    fn test_adjacent_quote_rescan() {
        // `""` の二つ目の引用符が次のフレーズの開始になる
        let info = extract_info(r#""" "a""#);
        assert_eq!(info.phrases, vec![" "]);
    }
}
