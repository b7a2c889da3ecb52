//! プロジェクト設定（project.yml）
//!
//! 既知のキーは既定値付きで取り出し、未知のキーはそのままテンプレートへ渡す。

use crate::error::{DeckError, Result};
use deck_builder_common::{
    number_to_px, parse_dimension, DimensionValue, DEFAULT_CARD_HEIGHT, DEFAULT_CARD_WIDTH,
};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAMES: &[&str] = &["project.yml", "project.yaml"];

pub const DEFAULT_PROJECT_NAME: &str = "Unnamed Project";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_TEMPLATE: &str = "templates/default.html";

#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    /// 文字列キーのみ（読み込み順を保持）
    values: Mapping,
}

impl ProjectConfig {
    /// プロジェクトフォルダから project.yml / project.yaml を読み込み
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = Self::config_path(project_dir)
            .ok_or_else(|| DeckError::ConfigNotFound(project_dir.join(CONFIG_FILE_NAMES[0])))?;

        let content = std::fs::read_to_string(&config_path)?;
        Self::from_yaml_str(&content).map_err(|source| DeckError::ConfigParse {
            path: config_path,
            source,
        })
    }

    /// 存在する設定ファイルのパス
    pub fn config_path(project_dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| project_dir.join(name))
            .find(|path| path.is_file())
    }

    pub fn from_yaml_str(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        let loaded: Value = serde_yaml::from_str(content)?;
        Ok(Self::from_value(loaded))
    }

    /// ルートがマッピングでなければ空の設定として扱う
    pub fn from_value(value: Value) -> Self {
        let values = match value {
            Value::Mapping(map) => string_keys_only(map),
            _ => Mapping::new(),
        };
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn name(&self) -> String {
        self.string_or(DEFAULT_PROJECT_NAME, "name")
    }

    pub fn default_language(&self) -> String {
        self.string_or(DEFAULT_LANGUAGE, "default_language")
    }

    pub fn default_template(&self) -> String {
        self.string_or(DEFAULT_TEMPLATE, "default_template")
    }

    pub fn html_wrapper_template(&self) -> Option<String> {
        self.non_blank_string("html_wrapper_template")
    }

    pub fn card_width(&self) -> String {
        normalize_dimension(self.card_value("width"), DEFAULT_CARD_WIDTH)
    }

    pub fn card_height(&self) -> String {
        normalize_dimension(self.card_value("height"), DEFAULT_CARD_HEIGHT)
    }

    /// テンプレートに公開する読み取り専用のプロジェクト情報
    ///
    /// 全キーをそのまま含み、`card.width` / `card.height` は正規化済み。
    pub fn properties(&self) -> Mapping {
        let mut view = self.values.clone();

        let mut card = match self.values.get("card") {
            Some(Value::Mapping(map)) => string_keys_only(map.clone()),
            _ => Mapping::new(),
        };
        card.insert("width".into(), Value::String(self.card_width()));
        card.insert("height".into(), Value::String(self.card_height()));

        view.insert("card".into(), Value::Mapping(card));
        view
    }

    fn card_value(&self, key: &str) -> Option<&Value> {
        match self.values.get("card") {
            Some(Value::Mapping(card)) => card.get(key),
            _ => None,
        }
    }

    fn non_blank_string(&self, key: &str) -> Option<String> {
        match self.values.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    fn string_or(&self, default: &str, key: &str) -> String {
        self.non_blank_string(key)
            .unwrap_or_else(|| default.to_string())
    }
}

fn string_keys_only(map: Mapping) -> Mapping {
    map.into_iter()
        .filter(|(key, _)| key.is_string())
        .collect()
}

/// YAMLの値を寸法文字列へ正規化（解釈できなければ fallback）
pub fn normalize_dimension(value: Option<&Value>, fallback: &str) -> String {
    let parsed = match value {
        None | Some(Value::Null) => return fallback.to_string(),
        Some(Value::Number(number)) => {
            if let Some(i) = number.as_i64() {
                DimensionValue::Normalized(format!("{}px", i))
            } else if let Some(u) = number.as_u64() {
                DimensionValue::Normalized(format!("{}px", u))
            } else {
                number.as_f64().map(number_to_px).unwrap_or(DimensionValue::Unrecognized)
            }
        }
        Some(Value::String(text)) => parse_dimension(text),
        Some(other) => {
            tracing::warn!(value = ?other, fallback, "Unsupported dimension value type - using fallback");
            return fallback.to_string();
        }
    };

    if parsed == DimensionValue::Unrecognized {
        tracing::warn!(value = ?value, fallback, "Unrecognized dimension value - using fallback");
    }
    parsed.or_fallback(fallback)
}
