//! deck-builder: カードデッキのテンプレート描画ライブラリ
//!
//! プロジェクトフォルダ（project.yml / cards.csv / templates / i18n）を読み込み、
//! カードを1枚ずつHTMLへ描画する。フォルダ監視による自動再読み込みにも対応。

pub mod cli;
pub mod config;
pub mod error;
pub mod i18n;
pub mod logging;
pub mod project;
pub mod records;
pub mod render;
pub mod watcher;

pub use config::ProjectConfig;
pub use error::{DeckError, Result};
pub use i18n::TranslationStore;
pub use project::{ListenerId, ProjectSnapshot, ProjectStore, ProjectSummary};
pub use records::load_records;
pub use render::RenderEngine;
pub use watcher::DirectoryWatcher;
