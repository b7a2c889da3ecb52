//! テンプレートから呼び出す翻訳関数
//!
//! - `t(key[, lang])`: 共通翻訳
//! - `card_t(key[, lang])`: カード別翻訳（`<カードID>.<key>`）。
//!   見つからなければカード自身のフィールド値、それも無ければ空文字。
//!
//! 言語やカードIDは関数側に保持せず、描画ごとのコンテキストに置いた
//! `RenderScope` から読む。関数オブジェクト自体は全描画で共有される。

use crate::i18n::TranslationStore;
use deck_builder_common::Record;
use minijinja::value::{Object, Value};
use minijinja::{Environment, State};
use std::sync::Arc;

/// コンテキスト上の `RenderScope` のキー名
pub const SCOPE_KEY: &str = "__render_scope";

/// 1回の描画に固有の状態
#[derive(Debug, Clone)]
pub struct RenderScope {
    pub lang: String,
    pub card: Option<Record>,
}

impl Object for RenderScope {}

impl RenderScope {
    pub fn new(lang: impl Into<String>, card: Option<Record>) -> Self {
        Self {
            lang: lang.into(),
            card,
        }
    }

    pub fn into_value(self) -> Value {
        Value::from_object(self)
    }

    fn lookup(state: &State) -> Option<Arc<RenderScope>> {
        state
            .lookup(SCOPE_KEY)
            .and_then(|value| value.downcast_object::<RenderScope>())
    }
}

/// 描画ごとに変わらない翻訳関数の設定
#[derive(Debug, Clone)]
pub struct TranslationFunction {
    store: Arc<TranslationStore>,
    default_lang: String,
}

impl TranslationFunction {
    pub fn new(store: Arc<TranslationStore>, default_lang: &str) -> Self {
        let default_lang = match default_lang.trim() {
            "" => deck_builder_common::DEFAULT_FALLBACK_LANGUAGE.to_string(),
            trimmed => trimmed.to_string(),
        };
        Self { store, default_lang }
    }

    /// 明示指定 → 描画スコープ → プロジェクト既定 の順で言語を決める
    fn language(&self, explicit: Option<&Value>, scope: Option<&RenderScope>) -> String {
        explicit
            .and_then(value_to_string)
            .filter(|lang| !lang.trim().is_empty())
            .or_else(|| {
                scope
                    .map(|s| s.lang.clone())
                    .filter(|lang| !lang.trim().is_empty())
            })
            .unwrap_or_else(|| self.default_lang.clone())
    }

    /// `t(key[, lang])`
    pub fn translate(&self, scope: Option<&RenderScope>, key: Option<&Value>, lang: Option<&Value>) -> String {
        let Some(key) = key.and_then(value_to_string) else {
            return String::new();
        };
        let lang = self.language(lang, scope);
        self.store.resolve(&lang, &key, &self.default_lang)
    }

    /// `card_t(key[, lang])`
    pub fn translate_card(&self, scope: Option<&RenderScope>, key: Option<&Value>, lang: Option<&Value>) -> String {
        let Some(key) = key.and_then(value_to_string) else {
            return String::new();
        };
        let card = scope.and_then(|s| s.card.as_ref());
        let fallback = || {
            card.and_then(|c| c.get(&key))
                .map(str::to_string)
                .unwrap_or_default()
        };

        let Some(card_id) = card.map(Record::id) else {
            return fallback();
        };

        let lang = self.language(lang, scope);
        let translation_key = format!("{}.{}", card_id, key);
        self.store
            .try_resolve(&lang, &translation_key, &self.default_lang)
            .unwrap_or_else(fallback)
    }
}

/// テンプレート環境へ `t` と `card_t` を登録
pub fn register(env: &mut Environment<'static>, general: TranslationFunction, card: TranslationFunction) {
    env.add_function(
        "t",
        move |state: &State, key: Option<Value>, lang: Option<Value>| -> String {
            let scope = RenderScope::lookup(state);
            general.translate(scope.as_deref(), key.as_ref(), lang.as_ref())
        },
    );
    env.add_function(
        "card_t",
        move |state: &State, key: Option<Value>, lang: Option<Value>| -> String {
            let scope = RenderScope::lookup(state);
            card.translate_card(scope.as_deref(), key.as_ref(), lang.as_ref())
        },
    );
}

/// none / undefined は None、それ以外は文字列表現
fn value_to_string(value: &Value) -> Option<String> {
    if value.is_undefined() || value.is_none() {
        return None;
    }
    Some(match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    })
}
