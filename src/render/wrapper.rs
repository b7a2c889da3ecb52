//! カードHTMLを物理寸法付きで包むラッパーテンプレート

use deck_builder_common::{parse_dimension, DimensionValue, Record};
use std::path::{Component, Path};

/// `templates/` に置かれていれば使うラッパーの既定名
pub const DEFAULT_WRAPPER_TEMPLATE: &str = "card_wrapper.html";

/// 既定名のファイルも無い場合に使う組み込みラッパー
pub const BUILTIN_WRAPPER: &str = r#"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
<meta charset="utf-8">
<title>{{ card.id }}</title>
<style>
  html, body { margin: 0; padding: 0; }
  .card-frame {
    width: {{ card_width }};
    height: {{ card_height }};
    overflow: hidden;
    box-sizing: border-box;
  }
</style>
</head>
<body>
<div class="card-frame">{{ content }}</div>
</body>
</html>
"#;

/// テンプレート名がテンプレートフォルダの外を指していないか
pub fn is_safe_template_name(name: &str) -> bool {
    let path = Path::new(name);
    !name.trim().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// 読み込み可能な通常ファイルか
pub fn is_readable_file(path: &Path) -> bool {
    path.is_file() && std::fs::File::open(path).is_ok()
}

/// 使用するラッパーテンプレート名を決める
///
/// 設定されたテンプレートが `templates/` 内に読み込み可能な状態で存在すればそれを、
/// そうでなければ既定名を返す。
pub fn resolve_wrapper_name(templates_dir: &Path, configured: Option<&str>) -> String {
    if let Some(name) = configured {
        if is_safe_template_name(name) && is_readable_file(&templates_dir.join(name)) {
            return name.to_string();
        }
        tracing::warn!(
            template = name,
            dir = %templates_dir.display(),
            "Configured HTML wrapper template is not readable - using default"
        );
    }
    DEFAULT_WRAPPER_TEMPLATE.to_string()
}

/// 既定名のラッパーがフォルダに無ければ組み込み版を使う
pub fn needs_builtin_wrapper(templates_dir: &Path, wrapper_name: &str) -> bool {
    wrapper_name == DEFAULT_WRAPPER_TEMPLATE
        && !is_readable_file(&templates_dir.join(DEFAULT_WRAPPER_TEMPLATE))
}

/// カード単位の寸法（レコードの `width` / `height` がプロジェクト設定より優先）
pub fn effective_dimensions(record: &Record, project_width: &str, project_height: &str) -> (String, String) {
    (
        record_dimension(record, "width", project_width),
        record_dimension(record, "height", project_height),
    )
}

fn record_dimension(record: &Record, field: &str, fallback: &str) -> String {
    let Some(raw) = record.non_blank(field) else {
        return fallback.to_string();
    };

    let parsed = parse_dimension(raw);
    if parsed == DimensionValue::Unrecognized {
        tracing::warn!(card = record.id(), field, value = raw, fallback, "Unrecognized card dimension - using project value");
    }
    parsed.or_fallback(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_template_names() {
        assert!(is_safe_template_name("default.html"));
        assert!(is_safe_template_name("cards/spell.html"));
        assert!(is_safe_template_name("./default.html"));
        assert!(!is_safe_template_name("../secret.html"));
        assert!(!is_safe_template_name("cards/../../secret.html"));
        assert!(!is_safe_template_name("/etc/passwd"));
        assert!(!is_safe_template_name(" "));
    }

    #[test]
    fn test_resolve_wrapper_configured() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("frame.html"), "{{ content }}").unwrap();

        assert_eq!(resolve_wrapper_name(dir.path(), Some("frame.html")), "frame.html");
        assert_eq!(resolve_wrapper_name(dir.path(), Some("missing.html")), DEFAULT_WRAPPER_TEMPLATE);
        assert_eq!(resolve_wrapper_name(dir.path(), None), DEFAULT_WRAPPER_TEMPLATE);
    }

    #[test]
    fn test_needs_builtin_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        assert!(needs_builtin_wrapper(dir.path(), DEFAULT_WRAPPER_TEMPLATE));
        assert!(!needs_builtin_wrapper(dir.path(), "frame.html"));

        std::fs::write(dir.path().join(DEFAULT_WRAPPER_TEMPLATE), "{{ content }}").unwrap();
        assert!(!needs_builtin_wrapper(dir.path(), DEFAULT_WRAPPER_TEMPLATE));
    }

    #[test]
    fn test_effective_dimensions() {
        let plain = Record::new([("id", "a")]).unwrap();
        assert_eq!(
            effective_dimensions(&plain, "2.5in", "3.5in"),
            ("2.5in".to_string(), "3.5in".to_string())
        );

        let sized = Record::new([("id", "b"), ("width", "63 MM"), ("height", "bogus")]).unwrap();
        assert_eq!(
            effective_dimensions(&sized, "2.5in", "3.5in"),
            ("63mm".to_string(), "3.5in".to_string())
        );
    }
}
