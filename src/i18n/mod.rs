//! 翻訳ストア
//!
//! `i18n/<lang>.yml` を言語ごとに遅延読み込みしてキャッシュし、
//! ドット区切りキーを候補言語の順に解決する。
//! 見つからない場合はキー文字列そのものを返す（エラーにしない）。

mod tree;

pub use tree::TranslationTree;

use deck_builder_common::{candidate_languages, candidate_languages_with_fallback};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

const TRANSLATION_EXTENSIONS: &[&str] = &["yml", "yaml"];

/// 1つの翻訳フォルダに対応するストア
///
/// キャッシュはこのインスタンスの寿命の間だけ有効。
/// 再読み込み時は新しいインスタンスを作り直す。
#[derive(Debug)]
pub struct TranslationStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<TranslationTree>>>,
}

impl TranslationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// フォールバック言語付きで解決
    ///
    /// 主言語の全候補を試してからフォールバック言語の候補を試す。
    pub fn resolve(&self, lang: &str, key: &str, fallback_lang: &str) -> String {
        self.translate(&candidate_languages_with_fallback(lang, fallback_lang), key)
    }

    /// フォールバックなしで解決
    pub fn lookup(&self, lang: &str, key: &str) -> String {
        self.translate(&candidate_languages(lang), key)
    }

    /// 解決できなければ None（キー文字列を返さない版）
    pub fn try_resolve(&self, lang: &str, key: &str, fallback_lang: &str) -> Option<String> {
        self.find(&candidate_languages_with_fallback(lang, fallback_lang), key)
    }

    fn translate(&self, candidates: &[String], key: &str) -> String {
        if key.is_empty() {
            return String::new();
        }
        self.find(candidates, key)
            .unwrap_or_else(|| key.to_string())
    }

    fn find(&self, candidates: &[String], key: &str) -> Option<String> {
        if key.is_empty() {
            return None;
        }

        let parts: Vec<&str> = key.split('.').collect();
        candidates.iter().find_map(|candidate| {
            let tree = self.language(candidate);
            if tree.is_empty() {
                return None;
            }
            tree.lookup(&parts)
        })
    }

    /// 言語ツリーを取得（未読み込みなら読み込んでキャッシュ）
    pub fn language(&self, lang: &str) -> Arc<TranslationTree> {
        if let Some(tree) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(lang)
        {
            return Arc::clone(tree);
        }

        let loaded = Arc::new(self.read_language_file(lang));

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // 並行して読み込まれた場合は先に入った方を使う
        Arc::clone(cache.entry(lang.to_string()).or_insert(loaded))
    }

    /// キャッシュ済みの言語数
    pub fn cached_languages(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn read_language_file(&self, lang: &str) -> TranslationTree {
        // パス区切りを含む言語コードはファイル名として扱わない
        if lang.trim().is_empty() || lang.contains(['/', '\\']) || lang.contains("..") {
            return TranslationTree::default();
        }

        TRANSLATION_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", lang, ext)))
            .find(|path| path.is_file())
            .map(|path| TranslationTree::load(&path))
            .unwrap_or_default()
    }
}
