//! プロジェクト管理
//!
//! プロジェクトフォルダの設定・カード・翻訳をまとめて読み込み、
//! 再読み込みのたびにスナップショットを丸ごと差し替える。
//!
//! フォルダ構成:
//! - `project.yml` (または `project.yaml`)
//! - `cards.csv`
//! - `templates/`
//! - `i18n/<lang>.yml`, `i18n/cards/<lang>.yml`

mod listeners;

pub use listeners::{ListenerId, ReloadListener};

use crate::config::ProjectConfig;
use crate::error::{DeckError, Result};
use crate::i18n::TranslationStore;
use crate::records::load_records;
use deck_builder_common::Record;
use listeners::ListenerRegistry;
use serde::Serialize;
use serde_yaml::Mapping;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

pub const CARDS_FILE_NAME: &str = "cards.csv";
pub const TEMPLATES_DIR_NAME: &str = "templates";
pub const TRANSLATIONS_DIR_NAME: &str = "i18n";
pub const CARD_TRANSLATIONS_DIR_NAME: &str = "cards";

/// 1回の読み込みで得られるプロジェクトの状態
///
/// 読み込み後は変更しない。
#[derive(Debug)]
pub struct ProjectSnapshot {
    pub dir: PathBuf,
    pub config: ProjectConfig,
    pub records: Arc<Vec<Record>>,
    pub translations: Arc<TranslationStore>,
    pub card_translations: Arc<TranslationStore>,
}

impl ProjectSnapshot {
    /// プロジェクトフォルダから全データを読み込み
    ///
    /// 設定ファイルが無い・解析できない場合のみエラー。
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(DeckError::FolderNotFound(dir.to_path_buf()));
        }

        let config = ProjectConfig::load(dir)?;

        let records = load_records(&dir.join(CARDS_FILE_NAME));
        tracing::info!(count = records.len(), "Loaded cards");

        let i18n_dir = dir.join(TRANSLATIONS_DIR_NAME);
        let card_i18n_dir = i18n_dir.join(CARD_TRANSLATIONS_DIR_NAME);

        Ok(Self {
            dir: dir.to_path_buf(),
            config,
            records: Arc::new(records),
            translations: Arc::new(TranslationStore::new(i18n_dir)),
            card_translations: Arc::new(TranslationStore::new(card_i18n_dir)),
        })
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.dir.join(TEMPLATES_DIR_NAME)
    }
}

/// プロジェクトの概要（`info` 表示用）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub dir: Option<PathBuf>,
    pub cards: usize,
    pub default_language: String,
    pub default_template: String,
    pub card_width: String,
    pub card_height: String,
}

/// 現在開いているプロジェクトを保持する
///
/// 状態は `Arc<ProjectSnapshot>` 単位で差し替えるため、
/// 描画側は常に一貫したスナップショットを参照できる。
#[derive(Default)]
pub struct ProjectStore {
    current: RwLock<Option<Arc<ProjectSnapshot>>>,
    listeners: ListenerRegistry,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// プロジェクトを開いてリスナーへ通知
    pub fn open_project(&self, dir: &Path) -> Result<()> {
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let snapshot = ProjectSnapshot::load(&dir)?;
        let name = snapshot.config.name();
        self.swap(snapshot);
        tracing::info!(project = %name, dir = %dir.display(), "Opened project");
        self.listeners.notify(self);
        Ok(())
    }

    /// 現在のプロジェクトを読み込み直してリスナーへ通知
    ///
    /// 失敗した場合は直前の状態を維持する。
    pub fn reload_project(&self) -> Result<()> {
        let dir = self.project_dir().ok_or(DeckError::ProjectNotOpen)?;
        let snapshot = ProjectSnapshot::load(&dir)?;
        self.swap(snapshot);
        tracing::info!(dir = %dir.display(), "Reloaded project");
        self.listeners.notify(self);
        Ok(())
    }

    fn swap(&self, snapshot: ProjectSnapshot) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Arc::new(snapshot));
    }

    /// 現在のスナップショット
    pub fn snapshot(&self) -> Option<Arc<ProjectSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_open(&self) -> bool {
        self.snapshot().is_some()
    }

    pub fn project_dir(&self) -> Option<PathBuf> {
        self.snapshot().map(|s| s.dir.clone())
    }

    /// プロジェクトフォルダ基準の相対パスを解決
    pub fn resolve(&self, relative: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = self.project_dir().ok_or(DeckError::ProjectNotOpen)?;
        Ok(dir.join(relative))
    }

    pub fn templates_dir(&self) -> Result<PathBuf> {
        self.resolve(TEMPLATES_DIR_NAME)
    }

    pub fn config(&self) -> ProjectConfig {
        self.snapshot()
            .map(|s| s.config.clone())
            .unwrap_or_default()
    }

    pub fn project_name(&self) -> String {
        self.config().name()
    }

    pub fn default_language(&self) -> String {
        self.config().default_language()
    }

    pub fn default_template(&self) -> String {
        self.config().default_template()
    }

    /// テンプレートへ渡すプロジェクト情報（card.width / card.height 正規化済み）
    pub fn project_properties(&self) -> Mapping {
        self.config().properties()
    }

    pub fn summary(&self) -> ProjectSummary {
        let snapshot = self.snapshot();
        let config = snapshot
            .as_ref()
            .map(|s| s.config.clone())
            .unwrap_or_default();

        ProjectSummary {
            name: config.name(),
            dir: snapshot.as_ref().map(|s| s.dir.clone()),
            cards: snapshot.as_ref().map_or(0, |s| s.records.len()),
            default_language: config.default_language(),
            default_template: config.default_template(),
            card_width: config.card_width(),
            card_height: config.card_height(),
        }
    }

    pub fn records(&self) -> Arc<Vec<Record>> {
        self.snapshot()
            .map(|s| Arc::clone(&s.records))
            .unwrap_or_default()
    }

    pub fn card_count(&self) -> usize {
        self.snapshot().map(|s| s.records.len()).unwrap_or(0)
    }

    pub fn translations(&self) -> Option<Arc<TranslationStore>> {
        self.snapshot().map(|s| Arc::clone(&s.translations))
    }

    pub fn card_translations(&self) -> Option<Arc<TranslationStore>> {
        self.snapshot().map(|s| Arc::clone(&s.card_translations))
    }

    /// 再読み込みリスナーを登録
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ProjectStore) -> Result<()> + Send + Sync + 'static,
    {
        self.listeners.add(Arc::new(listener))
    }

    /// 再読み込みリスナーを解除（登録されていれば true）
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for ProjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectStore")
            .field("dir", &self.project_dir())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
