//! 翻訳解決テスト
//!
//! 言語候補の展開・フォールバック・キャッシュの動作を検証

use deck_builder::TranslationStore;
use std::fs;
use tempfile::tempdir;

fn store_with(files: &[(&str, &str)]) -> (tempfile::TempDir, TranslationStore) {
    let dir = tempdir().expect("Failed to create temp dir");
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    let store = TranslationStore::new(dir.path());
    (dir, store)
}

/// 地域付き言語は基本言語へフォールバック
#[test]
fn test_region_falls_back_to_base_language() {
    let (_dir, store) = store_with(&[("en.yml", "greeting: Hello\n")]);
    assert_eq!(store.resolve("en-US", "greeting", "en"), "Hello");
    assert_eq!(store.resolve("en_GB", "greeting", "de"), "Hello");
}

/// どこにも無いキーはキー文字列そのもの
#[test]
fn test_missing_key_returns_key() {
    let (_dir, store) = store_with(&[("en.yml", "greeting: Hello\n")]);
    assert_eq!(store.resolve("fr", "missing.key", "de"), "missing.key");
}

/// 主言語にあればフォールバック言語の値より優先
#[test]
fn test_primary_language_wins_over_fallback() {
    let (_dir, store) = store_with(&[
        ("de.yml", "greeting: Hallo\n"),
        ("en.yml", "greeting: Hello\n"),
    ]);
    assert_eq!(store.resolve("de", "greeting", "en"), "Hallo");
    assert_eq!(store.resolve("de-AT", "greeting", "en"), "Hallo");
}

/// 主言語に無いキーはフォールバック言語から
#[test]
fn test_fallback_language_used_for_missing_key() {
    let (_dir, store) = store_with(&[
        ("de.yml", "greeting: Hallo\n"),
        ("en.yml", "greeting: Hello\nfarewell: Bye\n"),
    ]);
    assert_eq!(store.resolve("de", "farewell", "en"), "Bye");
}

/// 同じ引数なら何度呼んでも同じ結果
#[test]
fn test_resolve_is_idempotent() {
    let (_dir, store) = store_with(&[("en.yml", "menu:\n  title: Deck\n")]);
    let first = store.resolve("en", "menu.title", "en");
    let second = store.resolve("en", "menu.title", "en");
    assert_eq!(first, "Deck");
    assert_eq!(first, second);
}

/// ドット区切りで入れ子をたどる
#[test]
fn test_nested_keys() {
    let (_dir, store) = store_with(&[(
        "en.yml",
        "goblin:\n  name: Goblin\n  stats:\n    attack: 2\n    flying: false\n",
    )]);
    assert_eq!(store.resolve("en", "goblin.name", "en"), "Goblin");
    assert_eq!(store.resolve("en", "goblin.stats.attack", "en"), "2");
    assert_eq!(store.resolve("en", "goblin.stats.flying", "en"), "false");
    // 途中のマッピングは値として扱わない
    assert_eq!(store.resolve("en", "goblin.stats", "en"), "goblin.stats");
}

/// 一度読んだ言語はファイルが変わってもキャッシュを使う
#[test]
fn test_language_is_cached_for_store_lifetime() {
    let (dir, store) = store_with(&[("en.yml", "greeting: Hello\n")]);
    assert_eq!(store.resolve("en", "greeting", "en"), "Hello");

    fs::write(dir.path().join("en.yml"), "greeting: Howdy\n").unwrap();
    assert_eq!(store.resolve("en", "greeting", "en"), "Hello");

    // 新しいストアでは読み直される
    let fresh = TranslationStore::new(dir.path());
    assert_eq!(fresh.resolve("en", "greeting", "en"), "Howdy");
}

/// 壊れたYAMLは空として扱う
#[test]
fn test_broken_file_is_empty() {
    let (_dir, store) = store_with(&[
        ("de.yml", "greeting: [unterminated\n"),
        ("en.yml", "greeting: Hello\n"),
    ]);
    assert_eq!(store.resolve("de", "greeting", "en"), "Hello");
}

/// フォールバック無しの検索
#[test]
fn test_lookup_without_fallback() {
    let (_dir, store) = store_with(&[("en.yml", "greeting: Hello\n")]);
    assert_eq!(store.lookup("en-US", "greeting"), "Hello");
    assert_eq!(store.lookup("de", "greeting"), "greeting");
}

/// 翻訳フォルダが無くてもエラーにならない
#[test]
fn test_missing_directory() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = TranslationStore::new(dir.path().join("i18n"));
    assert_eq!(store.resolve("en", "greeting", "en"), "greeting");
}
