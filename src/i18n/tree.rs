//! 1言語分の翻訳ツリー

use serde_yaml::{Mapping, Value};
use std::path::Path;

/// `<lang>.yml` を読み込んだ入れ子のキー/値ツリー
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationTree {
    root: Mapping,
}

impl TranslationTree {
    pub fn new(root: Mapping) -> Self {
        Self { root }
    }

    /// 翻訳ファイルを読み込み
    ///
    /// ファイルが無い・読めない・解析できない場合は空ツリー。
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read translation file");
                return Self::default();
            }
        };

        match serde_yaml::from_str::<Value>(&content) {
            Ok(Value::Mapping(map)) => Self::new(map),
            Ok(_) => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse translation file");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// ドット区切りキーの各要素で階層をたどる
    ///
    /// 末端がスカラー（文字列・数値・真偽値）の場合のみ文字列で返す。
    pub fn lookup(&self, parts: &[&str]) -> Option<String> {
        let (last, parents) = parts.split_last()?;

        let mut node = &self.root;
        for part in parents {
            node = node.get(*part)?.as_mapping()?;
        }

        match node.get(*last)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(yaml: &str) -> TranslationTree {
        match serde_yaml::from_str::<Value>(yaml).unwrap() {
            Value::Mapping(map) => TranslationTree::new(map),
            _ => panic!("mapping expected"),
        }
    }

    #[test]
    fn test_lookup_nested() {
        let t = tree("menu:\n  file:\n    open: Open\n");
        assert_eq!(t.lookup(&["menu", "file", "open"]).as_deref(), Some("Open"));
    }

    #[test]
    fn test_lookup_scalar_types() {
        let t = tree("count: 3\nenabled: true\n");
        assert_eq!(t.lookup(&["count"]).as_deref(), Some("3"));
        assert_eq!(t.lookup(&["enabled"]).as_deref(), Some("true"));
    }

    #[test]
    fn test_lookup_non_leaf_is_none() {
        let t = tree("menu:\n  file: File\nlist: [a, b]\nempty: ~\n");
        assert_eq!(t.lookup(&["menu"]), None);
        assert_eq!(t.lookup(&["list"]), None);
        assert_eq!(t.lookup(&["empty"]), None);
    }

    #[test]
    fn test_lookup_through_scalar_is_none() {
        let t = tree("menu: File\n");
        assert_eq!(t.lookup(&["menu", "open"]), None);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let t = TranslationTree::load(Path::new("/nonexistent/en.yml"));
        assert!(t.is_empty());
    }
}
