use anyhow::Result;
use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::time::Instant;

use query_composer::builder::{build_search_url, ResultTab};
use query_composer::config::FilterLabels;
use query_composer::explain::explain_query;
use query_composer::session::Session;
use query_composer::storage::FileStore;

/// 設定ファイルからフィルタの表示名を読み込む。失敗時は組み込みの既定値
fn load_filter_labels() -> FilterLabels {
    match FilterLabels::from_json_file("filter_labels.json") {
        Ok(labels) => {
            println!("✅ filter_labels.json からフィルタ表示名を読み込みました");
            labels
        }
        Err(e) => {
            println!("⚠️ フィルタ表示名を読み込めません ({})、既定値を使用します", e);
            FilterLabels::default()
        }
    }
}

fn print_analysis(query: &str, labels: &FilterLabels) {
    let explanation = explain_query(query, labels);
    println!("\n[検索結果の傾向]:");
    for line in &explanation.lines {
        println!("  {}", line);
    }
    if !explanation.group_details.is_empty() {
        println!("\n[OR 条件の詳細]:");
        for detail in &explanation.group_details {
            println!("  {}", detail);
        }
    }
    println!("\n[検索URL]:");
    println!("  {}", build_search_url(query, ResultTab::Latest));
}

fn print_help() {
    println!("コマンド:");
    println!("  <クエリ>              入力をそのまま解析してプレビューを上書き");
    println!("  set <欄ID> <値>       テキスト欄を設定 (例: set q_from alice)");
    println!("  on <欄ID> / off <欄ID> チェック欄の切り替え (例: on only_images)");
    println!("  preview               現在のクエリを解析して表示");
    println!("  run                   検索を実行扱いにして履歴へ記録");
    println!("  save <番号> <名前>    プリセットへ保存 (1-5)");
    println!("  load <番号>           プリセットを読み込み");
    println!("  history               検索履歴を表示");
    println!("  clear                 フォームを全消去");
    println!("  exit / quit           終了");
}

fn main() -> Result<()> {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("query_composer"), LevelFilter::Debug)
        .init();

    println!("--- Query Composer: X 高度検索クエリ作成ツール ---");
    println!("\n[設定情報]:");
    let labels = load_filter_labels();

    let store = FileStore::open("query_composer_store.json");
    let mut session = Session::open(store);

    let restored = session.preview();
    if !restored.is_empty() {
        println!("\n前回のフォーム状態を復元しました: {}", restored);
    }
    println!();
    print_help();

    let mut rl = DefaultEditor::new()?;
    loop {
        session.tick(Instant::now());
        let line = match rl.readline("query> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                println!("✗ 入力エラー: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rl.add_history_entry(line)?;

        let mut parts = line.splitn(3, char::is_whitespace);
        let command = parts.next().unwrap_or("");
        match command {
            "exit" | "quit" => break,
            "help" => print_help(),
            "preview" => {
                let query = session.preview();
                if query.is_empty() {
                    println!("クエリが空です。");
                } else {
                    println!("クエリ: {}", query);
                    print_analysis(&query, &labels);
                }
            }
            "run" => match session.record_search(Local::now().naive_local()) {
                Some(query) => {
                    println!("✅ 履歴へ記録しました");
                    print_analysis(&query, &labels);
                }
                None => println!("クエリが空のため記録しません。"),
            },
            "set" => match (parts.next(), parts.next()) {
                (Some(id), Some(value)) => {
                    session.set_text(id, value, Instant::now());
                    println!("プレビュー: {}", session.preview());
                }
                _ => println!("使い方: set <欄ID> <値>"),
            },
            "on" | "off" => match parts.next() {
                Some(id) => {
                    session.set_flag(id, command == "on", Instant::now());
                    println!("プレビュー: {}", session.preview());
                }
                None => println!("使い方: {} <欄ID>", command),
            },
            "save" => match (parts.next().and_then(|s| s.parse().ok()), parts.next()) {
                (Some(slot), Some(title)) => {
                    session.save_preset(slot, title);
                    println!("✅ プリセット {} に保存しました", slot);
                }
                _ => println!("使い方: save <番号 1-5> <名前>"),
            },
            "load" => match parts.next().and_then(|s| s.parse().ok()) {
                Some(slot) if session.apply_preset(slot, Instant::now()) => {
                    println!("✅ プリセット {} を読み込みました", slot);
                    println!("プレビュー: {}", session.preview());
                }
                _ => println!("✗ そのプリセットは空です"),
            },
            "history" => {
                if session.history().is_empty() {
                    println!("履歴はありません。");
                }
                for (i, entry) in session.history().iter().enumerate() {
                    println!("  {}. {} {}", i + 1, entry.date, entry.query);
                }
            }
            "clear" => {
                session.reset(Instant::now());
                println!("フォームを消去しました。");
            }
            _ => {
                session.set_manual_query(line);
                print_analysis(line, &labels);
            }
        }
    }

    session.flush();
    println!("状態を保存して終了します。");
    Ok(())
}
