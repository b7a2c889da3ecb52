//! プロジェクトフォルダの監視
//!
//! フォルダを1つずつ（非再帰で）登録し、新しいサブフォルダが作られたり
//! 移動してきたりしたら、その配下をたどって追加登録する。変更があるたびにコールバックを呼ぶ。
//! 再読み込みの間引きは呼び出し側（`reload` モジュール）で行う。

pub mod reload;

pub use reload::{ReloadQueue, ReloadScheduler, ReloadTicket};

use crate::error::{DeckError, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use walkdir::WalkDir;

const WATCHER_THREAD_NAME: &str = "project-watcher";

/// 停止フラグを確認する間隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub type ChangeCallback = Arc<dyn Fn(&Path) + Send + Sync>;

/// 監視スレッドと共有する状態
struct WatchShared {
    watcher: Mutex<Option<RecommendedWatcher>>,
    registered: Mutex<HashSet<PathBuf>>,
    running: AtomicBool,
}

impl WatchShared {
    fn watcher(&self) -> MutexGuard<'_, Option<RecommendedWatcher>> {
        self.watcher.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn registered(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.registered.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `start` 以下の全フォルダを登録
    ///
    /// 戻り値は `start` 自身を除く配下の全エントリ。
    fn register_tree(&self, start: &Path) -> Vec<PathBuf> {
        let mut discovered = Vec::new();

        for entry in WalkDir::new(start).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(dir = %start.display(), error = %e, "Failed to walk directory");
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if let Err(e) = self.register_dir(entry.path()) {
                    tracing::warn!(dir = %entry.path().display(), error = %e, "Failed to register directory");
                }
            }
            if entry.depth() > 0 {
                discovered.push(entry.into_path());
            }
        }

        discovered
    }

    fn register_dir(&self, dir: &Path) -> Result<()> {
        if self.registered().contains(dir) {
            return Ok(());
        }

        let mut watcher = self.watcher();
        let Some(watcher) = watcher.as_mut() else {
            // close() 済み
            return Ok(());
        };
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        self.registered().insert(dir.to_path_buf());
        tracing::debug!(dir = %dir.display(), "Watching directory");
        Ok(())
    }

    /// 削除・移動されたフォルダ（と配下）を登録済み一覧から外す
    fn forget(&self, path: &Path) {
        let removed: Vec<PathBuf> = {
            let mut registered = self.registered();
            let removed: Vec<PathBuf> = registered
                .iter()
                .filter(|dir| dir.starts_with(path))
                .cloned()
                .collect();
            for dir in &removed {
                registered.remove(dir);
            }
            removed
        };

        if removed.is_empty() {
            return;
        }
        if let Some(watcher) = self.watcher().as_mut() {
            for dir in &removed {
                if let Err(e) = watcher.unwatch(dir) {
                    tracing::debug!(dir = %dir.display(), error = %e, "Watch already released");
                }
            }
        }
        tracing::debug!(dir = %path.display(), count = removed.len(), "Dropped watched directories");
    }
}

/// プロジェクトフォルダを再帰的に監視する
pub struct DirectoryWatcher {
    root: PathBuf,
    shared: Arc<WatchShared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DirectoryWatcher {
    /// 監視を開始
    ///
    /// `root` 以下の全フォルダを登録してから監視スレッドを起動する。
    pub fn new<F>(root: &Path, callback: F) -> Result<Self>
    where
        F: Fn(&Path) + Send + Sync + 'static,
    {
        if !root.is_dir() {
            return Err(DeckError::FolderNotFound(root.to_path_buf()));
        }
        let root = root.canonicalize()?;

        let (tx, rx) = mpsc::channel();
        let watcher = RecommendedWatcher::new(tx, Config::default())?;

        let shared = Arc::new(WatchShared {
            watcher: Mutex::new(Some(watcher)),
            registered: Mutex::new(HashSet::new()),
            running: AtomicBool::new(true),
        });

        // ルート自身の登録失敗は致命的
        shared.register_dir(&root)?;
        shared.register_tree(&root);

        let callback: ChangeCallback = Arc::new(callback);
        let loop_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(WATCHER_THREAD_NAME.to_string())
            .spawn(move || watch_loop(loop_shared, rx, callback))?;

        tracing::info!(dir = %root.display(), "Started watching project directory");

        Ok(Self {
            root,
            shared,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// 現在登録されているフォルダ一覧（ソート済み）
    pub fn registered_directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.shared.registered().iter().cloned().collect();
        dirs.sort();
        dirs
    }

    /// 監視を停止（何度呼んでも停止処理は1回だけ）
    pub fn close(&self) {
        if self
            .shared
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        // Watcherを破棄するとOS側の監視も解除される
        self.shared.watcher().take();
        self.shared.registered().clear();

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            // コールバック内から close() された場合は自分自身を待たない
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                tracing::warn!("Project watcher thread panicked");
            }
        }

        tracing::info!(dir = %self.root.display(), "Stopped watching project directory");
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for DirectoryWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryWatcher")
            .field("root", &self.root)
            .field("running", &self.is_running())
            .finish()
    }
}

fn watch_loop(shared: Arc<WatchShared>, rx: Receiver<notify::Result<Event>>, callback: ChangeCallback) {
    while shared.running.load(Ordering::SeqCst) {
        let event = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(event)) => event,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Watch error");
                continue;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        // イベント取りこぼし通知は無視
        if event.need_rescan() {
            continue;
        }

        match event.kind {
            EventKind::Create(_) => {
                for path in &event.paths {
                    if !shared.running.load(Ordering::SeqCst) {
                        return;
                    }
                    on_appeared(&shared, &callback, path);
                }
            }
            EventKind::Remove(_) => {
                for path in &event.paths {
                    if !shared.running.load(Ordering::SeqCst) {
                        return;
                    }
                    on_disappeared(&shared, &callback, path);
                }
            }
            EventKind::Modify(ModifyKind::Name(mode)) => {
                if !shared.running.load(Ordering::SeqCst) {
                    return;
                }
                on_renamed(&shared, &callback, mode, &event.paths);
            }
            EventKind::Modify(_) => {
                for path in &event.paths {
                    if !shared.running.load(Ordering::SeqCst) {
                        return;
                    }
                    dispatch(&callback, path);
                }
            }
            _ => {}
        }
    }
}

/// 作成・移動で現れたエントリ
///
/// フォルダなら配下ごと登録し、登録までに作られたエントリも通知する。
fn on_appeared(shared: &WatchShared, callback: &ChangeCallback, path: &Path) {
    if !path.is_dir() {
        dispatch(callback, path);
        return;
    }

    let discovered = shared.register_tree(path);
    dispatch(callback, path);
    for child in discovered {
        dispatch(callback, &child);
    }
}

/// 削除・移動で消えたエントリ（フォルダなら登録を外す）
fn on_disappeared(shared: &WatchShared, callback: &ChangeCallback, path: &Path) {
    shared.forget(path);
    dispatch(callback, path);
}

/// 名前変更
///
/// `Both` は [移動元, 移動先] の順。移動元・先の区別が無い通知は
/// 現在の存在有無で判断する。
fn on_renamed(shared: &WatchShared, callback: &ChangeCallback, mode: RenameMode, paths: &[PathBuf]) {
    match mode {
        RenameMode::From => {
            for path in paths {
                on_disappeared(shared, callback, path);
            }
        }
        RenameMode::To => {
            for path in paths {
                on_appeared(shared, callback, path);
            }
        }
        RenameMode::Both => {
            if let Some((to, from)) = paths.split_last() {
                for path in from {
                    on_disappeared(shared, callback, path);
                }
                on_appeared(shared, callback, to);
            }
        }
        _ => {
            for path in paths {
                if path.exists() {
                    on_appeared(shared, callback, path);
                } else {
                    on_disappeared(shared, callback, path);
                }
            }
        }
    }
}

/// コールバックを呼ぶ（パニックしても監視ループは止めない）
fn dispatch(callback: &ChangeCallback, path: &Path) {
    if catch_unwind(AssertUnwindSafe(|| callback(path))).is_err() {
        tracing::error!(path = %path.display(), "Error processing change notification");
    }
}
