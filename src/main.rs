use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use deck_builder::cli::{Cli, Commands};
use deck_builder::render::{NO_SUCH_CARD_HTML, RENDER_ERROR_HTML};
use deck_builder::{logging, watcher, DirectoryWatcher, ProjectStore, RenderEngine};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = logging::init(logging::level_for(cli.verbose), cli.log_format) {
        eprintln!("ログ初期化エラー: {}", e);
    }

    match cli.command {
        Commands::Info { project, json } => run_info(&project, json),
        Commands::Render { project, index, lang, output } => {
            run_render(&project, index, lang.as_deref(), output.as_deref())
        }
        Commands::RenderAll { project, lang, output } => run_render_all(&project, lang.as_deref(), &output),
        Commands::Watch { project, index, lang, output, debounce_ms } => {
            run_watch(&project, index, lang.as_deref(), &output, debounce_ms)
        }
    }
}

/// プロジェクトを開き、描画エンジンを接続する
fn open(project: &Path) -> Result<(Arc<ProjectStore>, Arc<RenderEngine>)> {
    let store = Arc::new(ProjectStore::new());
    let engine = RenderEngine::attach(Arc::clone(&store));
    store
        .open_project(project)
        .with_context(|| format!("プロジェクトを開けません: {}", project.display()))?;
    Ok((store, engine))
}

fn run_info(project: &Path, json: bool) -> Result<()> {
    let (store, _engine) = open(project)?;
    let summary = store.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("プロジェクト: {}", summary.name);
    if let Some(dir) = &summary.dir {
        println!("  フォルダ: {}", dir.display());
    }
    println!("  カード数: {}", summary.cards);
    println!("  既定言語: {}", summary.default_language);
    println!("  既定テンプレート: {}", summary.default_template);
    println!("  カードサイズ: {} x {}", summary.card_width, summary.card_height);
    Ok(())
}

fn run_render(project: &Path, index: usize, lang: Option<&str>, output: Option<&Path>) -> Result<()> {
    let (_store, engine) = open(project)?;
    let html = engine.render_card(index, lang.unwrap_or_default());

    match output {
        Some(path) => {
            write_html(path, &html)?;
            println!("✔ 出力: {}", path.display());
        }
        None => println!("{}", html),
    }
    Ok(())
}

fn run_render_all(project: &Path, lang: Option<&str>, output_dir: &Path) -> Result<()> {
    let (store, engine) = open(project)?;
    let records = engine.records();
    let lang = lang.unwrap_or_default();

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("出力フォルダを作成できません: {}", output_dir.display()))?;

    println!("🃏 {} - {}枚を描画中...", store.project_name(), records.len());
    let progress = ProgressBar::new(records.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")?.progress_chars("=> "),
    );

    let failed = AtomicUsize::new(0);
    records
        .par_iter()
        .enumerate()
        .try_for_each(|(index, record)| -> Result<()> {
            let html = engine.render_card(index, lang);
            if html == RENDER_ERROR_HTML || html == NO_SUCH_CARD_HTML {
                failed.fetch_add(1, Ordering::Relaxed);
            }
            let path = output_dir.join(format!("{}.html", file_stem_for(record.id())));
            write_html(&path, &html)?;
            progress.set_message(record.id().to_string());
            progress.inc(1);
            Ok(())
        })?;
    progress.finish_and_clear();

    let failed = failed.into_inner();
    if failed > 0 {
        println!("⚠ {}枚の描画に失敗しました（ログを確認してください）", failed);
    }
    println!("✅ 描画完了: {}", output_dir.display());
    Ok(())
}

fn run_watch(project: &Path, index: usize, lang: Option<&str>, output: &Path, debounce_ms: u64) -> Result<()> {
    let (store, engine) = open(project)?;
    let lang = lang.unwrap_or_default();
    let project_dir = store.project_dir().context("プロジェクトが開かれていません")?;

    write_html(output, &engine.render_card(index, lang))?;
    // 出力先がプロジェクト内にあっても自分の書き込みで再読み込みしない
    let own_output = output.canonicalize().unwrap_or_else(|_| output.to_path_buf());

    let (scheduler, queue) = watcher::reload::channel();
    let _watcher = DirectoryWatcher::new(&project_dir, move |path| {
        if path == own_output {
            return;
        }
        if scheduler.request() {
            tracing::debug!(path = %path.display(), "Reload scheduled");
        }
    })
    .with_context(|| format!("フォルダを監視できません: {}", project_dir.display()))?;

    println!("👀 監視中: {} (Ctrl+C で終了)", project_dir.display());
    println!("   出力: {}", output.display());

    while let Some(ticket) = queue.recv() {
        // 待っている間の変更はまとめて1回の再読み込みにする
        std::thread::sleep(Duration::from_millis(debounce_ms));

        match store.reload_project() {
            Ok(()) => {
                write_html(output, &engine.render_card(index, lang))?;
                println!("[{}] 再描画しました ({}枚)", Local::now().format("%H:%M:%S"), engine.card_count());
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload project - keeping previous state");
                println!("[{}] 再読み込み失敗: {}", Local::now().format("%H:%M:%S"), e);
            }
        }
        drop(ticket);
    }
    Ok(())
}

fn write_html(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html).with_context(|| format!("書き込みに失敗: {}", path.display()))
}

/// カードIDをファイル名に使える形へ
fn file_stem_for(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
