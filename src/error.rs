use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("プロジェクトが開かれていません")]
    ProjectNotOpen,

    #[error("project.yml が見つかりません: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("project.yml の解析に失敗: {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("フォルダが見つかりません: {}", .0.display())]
    FolderNotFound(PathBuf),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML解析エラー: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV解析エラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("テンプレートエラー: {0}")]
    Template(#[from] minijinja::Error),

    #[error("ファイル監視エラー: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Common(#[from] deck_builder_common::Error),
}

pub type Result<T> = std::result::Result<T, DeckError>;
