//! Renders a parsed query as a human-readable Japanese explanation.

use crate::analyzer::{extract_info, split_by_top_level_or};
use crate::ast::{EngagementMin, ParsedQuery};
use crate::config::FilterLabels;

/// Shown when no bucket could be read out of the query.
pub const FALLBACK_LINE: &str =
    "条件が読み取れませんでした。クエリの形式を確認してください。";
/// Shown for an empty or whitespace-only query.
pub const EMPTY_QUERY_LINE: &str = "クエリが空です。";

const OR_HEADER_LINE: &str = "OR 条件: 以下のいずれかに一致";
const EMPTY_GROUP_DETAIL: &str = "条件なし";

/// The explanation of one query: one line per non-empty bucket, plus a
/// detail entry per OR group when top-level alternation is present.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub lines: Vec<String>,
    /// `ORグループN: …` entries. Empty unless there are 2+ OR groups.
    pub group_details: Vec<String>,
}

fn join_list(items: &[String]) -> String {
    items.join(" / ")
}

fn describe_min(item: &EngagementMin) -> String {
    let key = item
        .raw
        .split(':')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    let val = item.raw.split(':').nth(1).unwrap_or("");
    let label = match key.as_str() {
        "min_faves" => "いいね",
        "min_retweets" => "リツイート",
        _ => "リプライ",
    };
    if val.is_empty() {
        format!("{}条件", label)
    } else if item.negated {
        format!("{} {} 以下", label, val)
    } else {
        format!("{} {} 以上", label, val)
    }
}

fn describe_filters(list: &[String], labels: &FilterLabels) -> String {
    let described: Vec<String> = list
        .iter()
        .map(|f| match labels.include_label(&f.to_lowercase()) {
            Some(label) => label.to_string(),
            None => format!("{} を条件に追加", f),
        })
        .collect();
    described.join(" / ")
}

fn describe_exclude_filters(list: &[String], labels: &FilterLabels) -> String {
    let described: Vec<String> = list
        .iter()
        .map(|f| match labels.exclude_label(&f.to_lowercase()) {
            Some(label) => label.to_string(),
            None => format!("{} を除く", f),
        })
        .collect();
    described.join(" / ")
}

/// One line per non-empty bucket, in the fixed bucket order. Used both for
/// the top-level explanation and for each OR group's detail.
fn bucket_lines(info: &ParsedQuery, labels: &FilterLabels) -> Vec<String> {
    let mut lines = Vec::new();
    if !info.phrases.is_empty() {
        lines.push(format!(
            "フレーズ完全一致: {} を含む",
            join_list(&info.phrases)
        ));
    }
    if !info.keywords.is_empty() {
        lines.push(format!("キーワード: {} を含む", join_list(&info.keywords)));
    }
    if !info.exclude_words.is_empty() {
        lines.push(format!(
            "除外ワード: {} を除く",
            join_list(&info.exclude_words)
        ));
    }
    if !info.from.is_empty() {
        lines.push(format!("投稿者指定: {} の投稿のみ", join_list(&info.from)));
    }
    if !info.to.is_empty() {
        lines.push(format!(
            "返信先指定: {} 宛ての返信のみ",
            join_list(&info.to)
        ));
    }
    if !info.mentions.is_empty() {
        lines.push(format!("メンション: @{} を含む", join_list(&info.mentions)));
    }
    if !info.hashtags.is_empty() {
        lines.push(format!(
            "ハッシュタグ: #{} を含む",
            join_list(&info.hashtags)
        ));
    }
    if !info.langs.is_empty() {
        lines.push(format!("言語指定: {} の投稿", join_list(&info.langs)));
    }
    if info.since.is_some() || info.until.is_some() {
        let mut line = String::from("期間: ");
        if let Some(since) = &info.since {
            line.push_str("since:");
            line.push_str(since);
        }
        if info.since.is_some() && info.until.is_some() {
            line.push_str(" 〜 ");
        }
        if let Some(until) = &info.until {
            line.push_str("until:");
            line.push_str(until);
        }
        lines.push(line);
    }
    if !info.mins.is_empty() {
        let described: Vec<String> = info.mins.iter().map(describe_min).collect();
        lines.push(format!("エンゲージ条件: {}", join_list(&described)));
    }
    if !info.filters_include.is_empty() {
        lines.push(format!(
            "フィルター: {}",
            describe_filters(&info.filters_include, labels)
        ));
    }
    if !info.filters_exclude.is_empty() {
        lines.push(format!(
            "除外フィルター: {}",
            describe_exclude_filters(&info.filters_exclude, labels)
        ));
    }
    if !info.urls_include.is_empty() {
        lines.push(format!(
            "URL含む: {} を含む",
            join_list(&info.urls_include)
        ));
    }
    if !info.urls_exclude.is_empty() {
        lines.push(format!(
            "URL除外: {} を除く",
            join_list(&info.urls_exclude)
        ));
    }
    lines
}

/// Explain an arbitrary query string. Never fails: an unparseable query
/// degrades to the single fallback line.
pub fn explain_query(query: &str, labels: &FilterLabels) -> Explanation {
    let q = query.trim();
    if q.is_empty() {
        return Explanation {
            lines: vec![EMPTY_QUERY_LINE.to_string()],
            group_details: Vec::new(),
        };
    }

    let info = extract_info(q);
    let mut lines = bucket_lines(&info, labels);

    let groups = split_by_top_level_or(q);
    let alternated = groups.len() > 1;
    if alternated {
        lines.push(OR_HEADER_LINE.to_string());
    }
    if lines.is_empty() {
        lines.push(FALLBACK_LINE.to_string());
    }

    let group_details = if alternated {
        groups
            .iter()
            .enumerate()
            .map(|(idx, group)| {
                let parts = bucket_lines(&extract_info(group), labels);
                let detail = if parts.is_empty() {
                    EMPTY_GROUP_DETAIL.to_string()
                } else {
                    parts.join(" / ")
                };
                format!("ORグループ{}: {}", idx + 1, detail)
            })
            .collect()
    } else {
        Vec::new()
    };

    Explanation {
        lines,
        group_details,
    }
}

/// Escape text for interpolation into HTML. Same five entities as the
/// query preview panel expects.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Assemble the explanation panel markup. All interpolated text is escaped.
pub fn render_html(query: &str, labels: &FilterLabels) -> String {
    if query.trim().is_empty() {
        return format!("<div>{}</div>", EMPTY_QUERY_LINE);
    }
    let explanation = explain_query(query, labels);

    let mut html = String::from("<div><b>検索結果の傾向</b></div><ul>");
    for line in &explanation.lines {
        html.push_str("<li>");
        html.push_str(&escape_html(line));
        html.push_str("</li>");
    }
    html.push_str("</ul>");

    if !explanation.group_details.is_empty() {
        html.push_str("<div style=\"margin-top:6px\"><b>OR 条件の詳細</b></div><ul>");
        for detail in &explanation.group_details {
            html.push_str("<li>");
            html.push_str(&escape_html(detail));
            html.push_str("</li>");
        }
        html.push_str("</ul>");
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> FilterLabels {
        FilterLabels::default()
    }

    #[test]
    fn test_bucket_order_and_phrasing() {
        let e = explain_query(
            r#""hello world" foo -bar from:alice to:bob @who #tag lang:ja since:2023-01-01 until:2023-12-31 min_faves:10 filter:media -filter:verified url:example.com -url:spam.com"#,
            &labels(),
        );
        assert_eq!(
            e.lines,
            vec![
                "フレーズ完全一致: hello world を含む",
                "キーワード: foo を含む",
                "除外ワード: bar を除く",
                "投稿者指定: alice の投稿のみ",
                "返信先指定: bob 宛ての返信のみ",
                "メンション: @who を含む",
                "ハッシュタグ: #tag を含む",
                "言語指定: ja の投稿",
                "期間: since:2023-01-01 〜 until:2023-12-31",
                "エンゲージ条件: いいね 10 以上",
                "フィルター: 画像・動画のみ",
                "除外フィルター: 認証済みを除く",
                "URL含む: example.com を含む",
                "URL除外: spam.com を除く",
            ]
        );
        assert!(e.group_details.is_empty());
    }

    #[test]
    fn test_period_line_with_single_bound() {
        let e = explain_query("since:2023-01-01", &labels());
        assert_eq!(e.lines, vec!["期間: since:2023-01-01"]);
        let e = explain_query("until:2023-12-31", &labels());
        assert_eq!(e.lines, vec!["期間: until:2023-12-31"]);
    }

    #[test]
    fn test_engagement_threshold_variants() {
        let e = explain_query("min_retweets:5 -min_replies:3 min_faves:", &labels());
        assert_eq!(
            e.lines,
            vec!["エンゲージ条件: リツイート 5 以上 / リプライ 3 以下 / いいね条件"]
        );
    }

    #[test]
    fn test_unknown_filter_fallback() {
        let e = explain_query("filter:something -filter:other", &labels());
        assert_eq!(
            e.lines,
            vec![
                "フィルター: something を条件に追加",
                "除外フィルター: other を除く",
            ]
        );
    }

    #[test]
    fn test_or_groups_get_header_and_details() {
        let e = explain_query("from:alice OR #tag", &labels());
        assert_eq!(
            e.lines,
            vec![
                "投稿者指定: alice の投稿のみ",
                "ハッシュタグ: #tag を含む",
                "OR 条件: 以下のいずれかに一致",
            ]
        );
        assert_eq!(
            e.group_details,
            vec![
                "ORグループ1: 投稿者指定: alice の投稿のみ",
                "ORグループ2: ハッシュタグ: #tag を含む",
            ]
        );
    }

    #[test]
    fn test_empty_or_group_detail() {
        let e = explain_query("( ) OR foo", &labels());
        assert_eq!(e.group_details[0], "ORグループ1: 条件なし");
        assert_eq!(e.group_details[1], "ORグループ2: キーワード: foo を含む");
    }

    #[test]
    fn test_fallback_line() {
        let e = explain_query("( )", &labels());
        assert_eq!(e.lines, vec![FALLBACK_LINE]);
    }

    #[test]
    fn test_empty_query() {
        let e = explain_query("   ", &labels());
        assert_eq!(e.lines, vec![EMPTY_QUERY_LINE]);
        assert_eq!(render_html("", &labels()), "<div>クエリが空です。</div>");
    }

    #[test]
    fn test_html_escapes_user_input() {
        let html = render_html("<script>alert('x')</script>", &labels());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&#39;x&#39;"));
    }

    #[test]
    fn test_html_shape() {
        let html = render_html("foo OR bar", &labels());
        assert!(html.starts_with("<div><b>検索結果の傾向</b></div><ul><li>"));
        assert!(html.contains("<div style=\"margin-top:6px\"><b>OR 条件の詳細</b></div>"));
        assert!(html.ends_with("</ul>"));
    }
}
