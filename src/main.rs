use anyhow::{Context, Result};
use brainmax_client::api::HttpBackend;
use brainmax_client::browser::{BrowserOptions, Layout, ResultBrowser};
use brainmax_client::chat::ChatSession;
use brainmax_client::cli::{Cli, Commands};
use brainmax_client::config::Config;
use brainmax_client::export::{self, FILES_TITLE, RESULTS_TITLE};
use brainmax_client::pipeline::{Pipeline, PipelineOptions};
use brainmax_client::session::{self, SessionStore};
use brainmax_common::{ModelCatalog, Record, SortDirection, SortKey, UploadedFile};
use clap::Parser;
use dialoguer::{Editor, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load().context("設定の読み込みに失敗しました")?;
    // 上書きURLを設定ファイルに保存しない
    let persists_config = matches!(cli.command, Commands::Config { .. });
    if let Some(url) = cli.base_url.filter(|u| !u.trim().is_empty()) {
        if !persists_config {
            config.set_base_url(url).context("--base-url が不正です")?;
        }
    }
    let store = SessionStore::in_dir(&Config::config_dir()?);

    match cli.command {
        Commands::Login { username } => {
            let password = Password::new().with_prompt("パスワード").interact()?;
            let backend = backend(&config)?;

            let pb = spinner("ログイン中...");
            let result = session::login(&*backend, &username, &password, &config.admin_marker).await;
            pb.finish_and_clear();

            let session = result.context("ログインに失敗しました")?;
            store.save(&session)?;
            println!("✔ ログインしました: {} ({})", session.display_name(), session.role.as_str());
        }

        Commands::Logout => {
            if store.clear()? {
                println!("✔ ログアウトしました");
            } else {
                println!("ログインしていません");
            }
        }

        Commands::Whoami => match store.load() {
            Some(session) => {
                println!("ユーザー名: {}", session.username);
                println!("氏名:       {}", session.display_name());
                println!("権限:       {}", session.role.as_str());
                println!("ログイン:   {}", session.logged_in_at);
            }
            None => println!("ログインしていません"),
        },

        Commands::Search { query, sort, desc, page, page_size, interactive, export } => {
            let session = store.require()?;
            let options = BrowserOptions {
                page_size: page_size.unwrap_or(config.page_size),
                layout: interactive.then_some(Layout::SingleRecord),
            };
            let mut browser = ResultBrowser::new(backend(&config)?, session, options);
            if let Some(key) = sort {
                browser.set_sort(key, direction(desc));
            }

            let pb = spinner("検索中...");
            let result = browser.search(&query).await.map(|records| records.len());
            pb.finish_and_clear();
            let total = result.context("検索に失敗しました")?;
            println!("🔍 {}件（条件を満たさないレコードは除外）\n", total);

            browser.go_to_page(page.saturating_sub(1));
            match browser.layout() {
                Layout::Table => print_records_table(&browser.visible(), &browser.page_label()),
                Layout::SingleRecord => browse_single(&mut browser)?,
            }

            if let Some(output) = export {
                write_results(&browser, &output)?;
            }
        }

        Commands::Export { query, sort, desc, output } => {
            let session = store.require()?;
            let mut browser =
                ResultBrowser::new(backend(&config)?, session, BrowserOptions::default());
            if let Some(key) = sort {
                browser.set_sort(key, direction(desc));
            }

            let pb = spinner("検索中...");
            let result = browser.search(&query).await.map(|records| records.len());
            pb.finish_and_clear();
            result.context("検索に失敗しました")?;

            write_results(&browser, &output)?;
        }

        Commands::Files { uploader, export } => {
            let mut options = PipelineOptions::from_config(&config);
            options.list_uploader = uploader;
            let mut pipeline = Pipeline::new(backend(&config)?, options)?;

            let pb = spinner("ファイル一覧を取得中...");
            let result = pipeline.refresh_files().await.map(|files| files.len());
            pb.finish_and_clear();
            result.context("ファイル一覧の取得に失敗しました")?;

            print_files_table(pipeline.files());
            if let Some(output) = export {
                println!("- Excelを生成中...");
                let path = export::export_rows(pipeline.files(), &output, FILES_TITLE)?;
                println!("✔ Excel出力: {}", path.display());
            }
        }

        Commands::Upload { paths, uploader } => {
            let mut options = PipelineOptions::from_config(&config);
            if let Some(uploader) = uploader {
                options.uploader = uploader;
            }
            let mut pipeline = Pipeline::new(backend(&config)?, options)?;

            let files = collect_upload_files(&paths);
            if files.is_empty() {
                anyhow::bail!("アップロードするファイルがありません");
            }
            println!("📤 {}件をアップロードします\n", files.len());

            let mut failed = 0;
            for (i, path) in files.iter().enumerate() {
                let pb = spinner(&format!("[{}/{}] {}", i + 1, files.len(), path.display()));
                let result = pipeline.upload_path(path).await;
                pb.finish_and_clear();
                match result {
                    Ok(_) => println!("✔ {}", path.display()),
                    Err(e) => {
                        failed += 1;
                        println!("✗ {}: {}", path.display(), e);
                    }
                }
            }

            println!("\n完了: 成功 {} / 失敗 {}", files.len() - failed, failed);
        }

        Commands::Scan { file_id, output } => {
            let mut pipeline = open_file(&config, file_id).await?;

            let pb = spinner("スキャン中...");
            let result = pipeline.scan().await.map(str::to_string);
            pb.finish_and_clear();
            let text = result?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &text)
                        .with_context(|| format!("書き込みに失敗しました: {}", path.display()))?;
                    println!("✔ スキャン結果を保存: {}", path.display());
                }
                None => println!("{}", text),
            }
        }

        Commands::Annotate { file_id, text_file, edit, models, output } => {
            let mut pipeline = open_file(&config, file_id).await?;
            if !models.is_empty() {
                pipeline.set_models(&models)?;
            }

            if let Some(path) = text_file {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("読み込みに失敗しました: {}", path.display()))?;
                pipeline.set_text(text);
            } else if edit {
                let current = pipeline.state().editable_text.clone();
                match Editor::new().extension(".txt").edit(&current)? {
                    Some(text) => pipeline.set_text(text),
                    None => {
                        println!("編集が中断されました");
                        return Ok(());
                    }
                }
            }

            let labels: Vec<&str> = pipeline.models().iter().map(|m| m.label).collect();
            let pb = spinner(&format!("保存してAI解析中... ({})", labels.join(", ")));
            let result = pipeline.save_and_analyze().await;
            pb.finish_and_clear();
            let analysis = result?;

            println!("✔ {}\n", pipeline.state().status_message);
            println!("{}", analysis);

            if let Some(path) = output {
                std::fs::write(&path, &analysis)
                    .with_context(|| format!("書き込みに失敗しました: {}", path.display()))?;
                println!("\n✔ 解析結果を保存: {}", path.display());
            }
        }

        Commands::Chat { model } => {
            let session = store.require()?;
            let model = model.unwrap_or_else(|| config.chat_model.clone());
            let chat = ChatSession::new(backend(&config)?, session, &model)?;
            run_chat(chat).await?;
        }

        Commands::Models { catalog } => {
            let catalogs = match catalog {
                Some(catalog) => vec![catalog],
                None => vec![ModelCatalog::Chat, ModelCatalog::Document],
            };
            for catalog in catalogs {
                println!("[{}]", catalog.name());
                for model in catalog.models() {
                    println!("  {}  {}", model.id, model.label);
                }
            }
        }

        Commands::Config { show, set_base_url, set_page_size } => {
            let mut changed = false;

            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                println!("✔ URLを設定しました");
                changed = true;
            }

            if let Some(size) = set_page_size {
                config.set_page_size(size)?;
                println!("✔ 1ページの件数を設定しました");
                changed = true;
            }

            if changed {
                config.save()?;
            }

            if show || !changed {
                println!("設定: {}", Config::config_path()?.display());
                println!("  URL:           {}", config.base_url);
                println!("  uploader:      {}", config.uploader);
                println!("  1ページの件数: {}", config.page_size);
                println!("  チャットモデル: {}", config.chat_model);
                println!("  解析モデル:    {}", config.document_models.join(", "));
                println!("  管理者:        {}", config.admin_marker);
                println!("  タイムアウト:  {}秒", config.timeout_seconds);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "brainmax_client=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn backend(config: &Config) -> Result<Arc<HttpBackend>> {
    Ok(Arc::new(HttpBackend::from_config(config)?))
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn direction(desc: bool) -> SortDirection {
    if desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    }
}

/// 一覧を取得して対象ファイルを選択済みのパイプラインを返す
async fn open_file(config: &Config, file_id: i64) -> Result<Pipeline<HttpBackend>> {
    let mut pipeline = Pipeline::new(backend(config)?, PipelineOptions::from_config(config))?;

    let pb = spinner("ファイル一覧を取得中...");
    let result = pipeline.refresh_files().await.map(|files| files.len());
    pb.finish_and_clear();
    result.context("ファイル一覧の取得に失敗しました")?;

    pipeline.select_file(Some(file_id))?;
    if let Some(file) = pipeline.selected_file() {
        println!("📄 {} (ID: {})\n", file.file_name, file.id);
    }
    Ok(pipeline)
}

fn collect_upload_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(
                WalkDir::new(path)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .map(|e| e.into_path()),
            );
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn write_results(browser: &ResultBrowser<HttpBackend>, output: &Path) -> Result<()> {
    println!("- Excelを生成中...");
    let buffer = browser.export_all()?;
    let path = export::write_buffer(&buffer, output, RESULTS_TITLE)?;
    println!("✔ Excel出力: {} ({}件)", path.display(), browser.total());
    Ok(())
}

/// 表示用に1行へ縮める
fn truncate(text: &str, max: usize) -> String {
    let line = text.replace('\n', " ");
    if line.chars().count() > max {
        let head: String = line.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    } else {
        line
    }
}

fn print_records_table(records: &[Record], page_label: &str) {
    println!("{:>6}  {:<16}  {:<30}  {}", "ID", "氏名", "質問", "回答");
    for r in records {
        println!(
            "{:>6}  {:<16}  {:<30}  {}",
            r.id,
            truncate(&r.full_name, 16),
            truncate(&r.question, 30),
            truncate(&r.answer, 40)
        );
    }
    println!("\nページ {}", page_label);
}

fn print_record(record: &Record) {
    println!("ID:   {}", record.id);
    println!("氏名: {}", record.full_name);
    println!("質問:\n{}\n", record.question);
    println!("回答:\n{}", record.answer);
}

fn browse_single(browser: &mut ResultBrowser<HttpBackend>) -> Result<()> {
    let keys = [SortKey::Id, SortKey::FullName, SortKey::Question, SortKey::Answer];
    loop {
        match browser.current_record() {
            Some(record) => print_record(&record),
            None => {
                println!("表示できるレコードがありません");
                return Ok(());
            }
        }
        println!("\n[{}]", browser.page_label());

        let items = ["次へ", "前へ", "並べ替え", "終了"];
        let choice = Select::new()
            .with_prompt("操作")
            .items(&items)
            .default(0)
            .interact()?;
        println!();

        match choice {
            0 if browser.is_last() => println!("最後のレコードです\n"),
            0 => browser.next(),
            1 if browser.is_first() => println!("最初のレコードです\n"),
            1 => browser.prev(),
            2 => {
                let labels: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
                let index = Select::new()
                    .with_prompt("ソートキー")
                    .items(&labels)
                    .default(0)
                    .interact()?;
                let direction = browser.sort_by(keys[index]);
                println!("{} {}\n", keys[index].as_str(), direction.arrow());
            }
            _ => return Ok(()),
        }
    }
}

fn print_files_table(files: &[UploadedFile]) {
    if files.is_empty() {
        println!("ファイルがありません");
        return;
    }
    println!("{:>6}  {:<40}  {:<6}  {}", "ID", "ファイル名", "OCR", "AI解析");
    for f in files {
        println!(
            "{:>6}  {:<40}  {:<6}  {}",
            f.id,
            truncate(&f.file_name, 40),
            if f.is_scanned() { "済" } else { "-" },
            if f.is_analyzed() { "済" } else { "-" }
        );
    }
    println!("\n{}件", files.len());
}

async fn run_chat(mut chat: ChatSession<HttpBackend>) -> Result<()> {
    println!("💬 {} と会話します（/save で保存、/model <ID> でモデル変更、/quit で終了）\n", chat.model().label);
    if let Some(greeting) = chat.messages().first() {
        println!("🤖 {}\n", greeting.text);
    }

    loop {
        let input: String = Input::new()
            .with_prompt("あなた")
            .allow_empty(true)
            .interact_text()?;
        let trimmed = input.trim();

        match trimmed {
            "" => continue,
            "/quit" | "/q" => return Ok(()),
            "/save" => match chat.save_last_exchange().await {
                Ok(()) => println!("✔ 会話を保存しました\n"),
                Err(e) => println!("✗ 保存に失敗しました: {}\n", e),
            },
            _ if trimmed.starts_with("/model") => {
                let key = trimmed.trim_start_matches("/model").trim();
                match chat.select_model(key) {
                    Ok(()) => println!("✔ モデル: {}\n", chat.model().label),
                    Err(e) => println!("✗ {}\n", e),
                }
            }
            _ => {
                let pb = spinner(&format!("{} が考え中...", chat.model().label));
                let result = chat.send(&input).await.map(str::to_string);
                pb.finish_and_clear();
                match result {
                    Ok(reply) => println!("🤖 {}\n", reply),
                    Err(e) => println!("✗ {}\n", e),
                }
            }
        }
    }
}
