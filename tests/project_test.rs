//! プロジェクト読み込み・再読み込みテスト
//!
//! スナップショットの差し替えとリスナー通知を検証

use deck_builder::error::DeckError;
use deck_builder::ProjectStore;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

fn write_project(dir: &Path, yaml: &str, csv: &str) {
    fs::write(dir.join("project.yml"), yaml).unwrap();
    fs::write(dir.join("cards.csv"), csv).unwrap();
    fs::create_dir_all(dir.join("i18n/cards")).unwrap();
    fs::create_dir_all(dir.join("templates")).unwrap();
}

/// プロジェクトを開くと設定・カードが参照できる
#[test]
fn test_open_project() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_project(
        dir.path(),
        "name: Goblin Deck\ndefault_language: de\n",
        "id,name\ngoblin,Goblin\norc,Orc\n",
    );

    let store = ProjectStore::new();
    assert!(!store.is_open());
    store.open_project(dir.path()).unwrap();

    assert!(store.is_open());
    assert_eq!(store.project_name(), "Goblin Deck");
    assert_eq!(store.default_language(), "de");
    assert_eq!(store.default_template(), "templates/default.html");
    assert_eq!(store.card_count(), 2);
    assert_eq!(store.records()[1].id(), "orc");

    let root = dir.path().canonicalize().unwrap();
    assert_eq!(store.project_dir(), Some(root.clone()));
    assert_eq!(store.templates_dir().unwrap(), root.join("templates"));
    assert_eq!(store.resolve("cards.csv").unwrap(), root.join("cards.csv"));
    assert_eq!(store.translations().unwrap().dir(), root.join("i18n"));
    assert_eq!(store.card_translations().unwrap().dir(), root.join("i18n/cards"));
}

/// project.yaml も設定ファイルとして使える
#[test]
fn test_open_project_yaml_extension() {
    let dir = tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("project.yaml"), "name: Alt\n").unwrap();

    let store = ProjectStore::new();
    store.open_project(dir.path()).unwrap();
    assert_eq!(store.project_name(), "Alt");
    // cards.csv が無ければ0枚
    assert_eq!(store.card_count(), 0);
}

/// 設定ファイルが無ければエラー
#[test]
fn test_open_without_config_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = ProjectStore::new();

    let err = store.open_project(dir.path()).unwrap_err();
    assert!(matches!(err, DeckError::ConfigNotFound(_)));
    assert!(!store.is_open());
}

/// 開いていない状態での再読み込みはエラー
#[test]
fn test_reload_without_project() {
    let store = ProjectStore::new();
    assert!(matches!(store.reload_project(), Err(DeckError::ProjectNotOpen)));
    assert!(matches!(store.templates_dir(), Err(DeckError::ProjectNotOpen)));
    assert_eq!(store.card_count(), 0);
    assert_eq!(store.project_name(), "Unnamed Project");
}

/// 再読み込みで変更が反映される
#[test]
fn test_reload_picks_up_changes() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_project(dir.path(), "name: Before\n", "id\na\n");

    let store = ProjectStore::new();
    store.open_project(dir.path()).unwrap();
    let before = store.snapshot().unwrap();

    fs::write(dir.path().join("project.yml"), "name: After\n").unwrap();
    fs::write(dir.path().join("cards.csv"), "id\na\nb\nc\n").unwrap();
    store.reload_project().unwrap();

    assert_eq!(store.project_name(), "After");
    assert_eq!(store.card_count(), 3);
    // 古いスナップショットは変更されない
    assert_eq!(before.config.name(), "Before");
    assert_eq!(before.records.len(), 1);
}

/// 再読み込みで翻訳キャッシュも作り直される
#[test]
fn test_reload_refreshes_translations() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_project(dir.path(), "name: Deck\n", "id\na\n");
    fs::write(dir.path().join("i18n/en.yml"), "title: Old\n").unwrap();

    let store = ProjectStore::new();
    store.open_project(dir.path()).unwrap();
    assert_eq!(store.translations().unwrap().resolve("en", "title", "en"), "Old");

    fs::write(dir.path().join("i18n/en.yml"), "title: New\n").unwrap();
    store.reload_project().unwrap();
    assert_eq!(store.translations().unwrap().resolve("en", "title", "en"), "New");
}

/// 再読み込みに失敗しても直前の状態を維持
#[test]
fn test_failed_reload_keeps_previous_state() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_project(dir.path(), "name: Stable\n", "id\na\n");

    let store = ProjectStore::new();
    store.open_project(dir.path()).unwrap();

    fs::write(dir.path().join("project.yml"), "name: [broken\n").unwrap();
    let err = store.reload_project().unwrap_err();
    assert!(matches!(err, DeckError::ConfigParse { .. }));

    assert_eq!(store.project_name(), "Stable");
    assert_eq!(store.card_count(), 1);
}

/// カードサイズは正規化されてテンプレート用プロパティに入る
#[test]
fn test_project_properties_normalize_card_size() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_project(
        dir.path(),
        "name: Deck\nrarity_colors:\n  rare: gold\ncard:\n  width: 800\n  height: \"  10 CM \"\n  bleed: 3mm\n",
        "id\na\n",
    );

    let store = ProjectStore::new();
    store.open_project(dir.path()).unwrap();
    let props = store.project_properties();

    let card = props.get("card").and_then(|v| v.as_mapping()).unwrap();
    assert_eq!(card.get("width").and_then(|v| v.as_str()), Some("800px"));
    assert_eq!(card.get("height").and_then(|v| v.as_str()), Some("10cm"));
    assert_eq!(card.get("bleed").and_then(|v| v.as_str()), Some("3mm"));
    assert!(props.get("rarity_colors").is_some());
}

/// 概要はJSONに変換できる
#[test]
fn test_summary() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_project(dir.path(), "name: Deck\ncard:\n  width: 63mm\n", "id\na\nb\n");

    let store = ProjectStore::new();
    assert_eq!(store.summary().cards, 0);
    assert_eq!(store.summary().dir, None);

    store.open_project(dir.path()).unwrap();
    let summary = store.summary();
    assert_eq!(summary.name, "Deck");
    assert_eq!(summary.cards, 2);
    assert_eq!(summary.card_width, "63mm");
    assert_eq!(summary.card_height, "3.5in");

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["default_language"], "en");
    assert_eq!(json["cards"], 2);
}

/// 解釈できない寸法は既定値
#[test]
fn test_unparseable_dimension_uses_default() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_project(dir.path(), "card:\n  width: huge\n  height: 3.5in\n", "id\na\n");

    let store = ProjectStore::new();
    store.open_project(dir.path()).unwrap();
    let config = store.config();
    assert_eq!(config.card_width(), "2.5in");
    assert_eq!(config.card_height(), "3.5in");
}

/// 開く・再読み込みのたびにリスナーへ通知
#[test]
fn test_listeners_notified() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_project(dir.path(), "name: Deck\n", "id\na\n");

    let store = ProjectStore::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let id = store.subscribe(move |store| {
        assert!(store.is_open());
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    store.open_project(dir.path()).unwrap();
    store.reload_project().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    assert!(store.unsubscribe(id));
    assert!(!store.unsubscribe(id));
    store.reload_project().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// 失敗・パニックしたリスナーがあっても他のリスナーは呼ばれる
#[test]
fn test_failing_listener_does_not_block_others() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_project(dir.path(), "name: Deck\n", "id\na\n");

    let store = ProjectStore::new();
    let calls = Arc::new(AtomicUsize::new(0));

    store.subscribe(|_| Err(DeckError::ProjectNotOpen));
    store.subscribe(|_| panic!("listener failure"));
    let counter = Arc::clone(&calls);
    store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    assert_eq!(store.listener_count(), 3);

    store.open_project(dir.path()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(store.is_open());
}

/// リスナー内からの登録・解除でデッドロックしない
#[test]
fn test_listener_can_subscribe_during_notify() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_project(dir.path(), "name: Deck\n", "id\na\n");

    let store = Arc::new(ProjectStore::new());
    store.subscribe(|store| {
        store.subscribe(|_| Ok(()));
        Ok(())
    });

    store.open_project(dir.path()).unwrap();
    assert_eq!(store.listener_count(), 2);
}
