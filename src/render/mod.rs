//! カード描画エンジン
//!
//! プロジェクトの再読み込み通知を受けるたびにテンプレート環境を作り直し、
//! 1枚のカードをHTMLへ描画してラッパーで包む。
//! 描画中のエラーは呼び出し元へ返さず、プレースホルダーHTMLに変換する。

mod functions;
mod wrapper;

pub use functions::{RenderScope, TranslationFunction, SCOPE_KEY};
pub use wrapper::{
    effective_dimensions, is_safe_template_name, resolve_wrapper_name, BUILTIN_WRAPPER,
    DEFAULT_WRAPPER_TEMPLATE,
};

use crate::error::{DeckError, Result};
use crate::project::{ListenerId, ProjectStore, TEMPLATES_DIR_NAME};
use deck_builder_common::Record;
use minijinja::value::Value;
use minijinja::{context, Environment, ErrorKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

pub const NO_SUCH_CARD_HTML: &str = "<p>No such card index</p>";
pub const RENDER_ERROR_HTML: &str = "<p>Error rendering card.</p>";

/// 再構築ごとに作られる描画用の状態一式
///
/// 構築後は変更せず、`Arc` ごと差し替える。
struct RenderBundle {
    env: Environment<'static>,
    records: Arc<Vec<Record>>,
    properties: Value,
    default_template: String,
    default_lang: String,
    wrapper: String,
    card_width: String,
    card_height: String,
}

impl RenderBundle {
    fn build(project: &ProjectStore) -> Result<Self> {
        let snapshot = project.snapshot().ok_or(DeckError::ProjectNotOpen)?;
        let config = &snapshot.config;
        let templates_dir = snapshot.templates_dir();
        let default_lang = config.default_language();

        let mut env = Environment::new();
        env.set_loader(template_loader(templates_dir.clone()));
        functions::register(
            &mut env,
            TranslationFunction::new(Arc::clone(&snapshot.translations), &default_lang),
            TranslationFunction::new(Arc::clone(&snapshot.card_translations), &default_lang),
        );

        let configured = config.html_wrapper_template();
        let wrapper = wrapper::resolve_wrapper_name(&templates_dir, configured.as_deref());
        if wrapper::needs_builtin_wrapper(&templates_dir, &wrapper) {
            env.add_template(DEFAULT_WRAPPER_TEMPLATE, BUILTIN_WRAPPER)?;
        }

        Ok(Self {
            env,
            records: Arc::clone(&snapshot.records),
            properties: Value::from_serialize(config.properties()),
            default_template: config.default_template(),
            default_lang,
            wrapper,
            card_width: config.card_width(),
            card_height: config.card_height(),
        })
    }

    fn render(&self, record: &Record, lang: &str) -> Result<String> {
        let lang = match lang.trim() {
            "" => self.default_lang.as_str(),
            trimmed => trimmed,
        };
        let template_name = record
            .template()
            .map(str::to_string)
            .unwrap_or_else(|| self.default_template.clone());

        // 描画ごとのスコープ（言語・カード）はコンテキスト経由で関数へ渡す
        let scope = RenderScope::new(lang, Some(record.clone())).into_value();

        let mut ctx: BTreeMap<String, Value> = record
            .fields()
            .map(|(key, value)| (key.to_string(), Value::from(value)))
            .collect();
        ctx.insert("lang".into(), Value::from(lang));
        ctx.insert("project".into(), self.properties.clone());
        ctx.insert(SCOPE_KEY.into(), scope.clone());

        let content = self
            .env
            .get_template(&template_name)?
            .render(Value::from(ctx))?;

        let (card_width, card_height) =
            wrapper::effective_dimensions(record, &self.card_width, &self.card_height);

        let html = self.env.get_template(&self.wrapper)?.render(context! {
            content => Value::from_safe_string(content),
            lang => lang,
            project => self.properties.clone(),
            card => Value::from_serialize(record),
            card_width => card_width,
            card_height => card_height,
            __render_scope => scope,
        })?;

        tracing::debug!(card = record.id(), template = %template_name, lang, "Rendered card");
        Ok(html)
    }
}

/// `templates/` を起点にテンプレートを読むローダー
///
/// `templates/` で始まる名前（既定の `templates/default.html` など）は
/// 接頭辞を外した名前でも探す。
fn template_loader(
    templates_dir: PathBuf,
) -> impl Fn(&str) -> std::result::Result<Option<String>, minijinja::Error> + Send + Sync + 'static {
    move |name: &str| {
        if !is_safe_template_name(name) {
            return Ok(None);
        }

        let mut candidates = vec![templates_dir.join(name)];
        if let Some(stripped) = name.strip_prefix(&format!("{}/", TEMPLATES_DIR_NAME)) {
            candidates.push(templates_dir.join(stripped));
        }

        for path in candidates {
            if let Some(source) = read_template(&path)? {
                return Ok(Some(source));
            }
        }
        Ok(None)
    }
}

fn read_template(path: &Path) -> std::result::Result<Option<String>, minijinja::Error> {
    match std::fs::read_to_string(path) {
        Ok(source) => Ok(Some(source)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) if path.is_dir() => {
            tracing::debug!(path = %path.display(), error = %e, "Template path is a directory");
            Ok(None)
        }
        Err(e) => Err(minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("could not read template {}", path.display()),
        )
        .with_source(e)),
    }
}

/// プロジェクトに紐づく描画エンジン
///
/// 状態は再構築のたびに丸ごと差し替えるため、複数スレッドから
/// 同時に `render_card` を呼んでも描画同士が干渉しない。
pub struct RenderEngine {
    project: Arc<ProjectStore>,
    bundle: RwLock<Option<Arc<RenderBundle>>>,
    listener: Mutex<Option<ListenerId>>,
}

impl RenderEngine {
    /// エンジンを作成してプロジェクトの再読み込み通知へ登録
    pub fn attach(project: Arc<ProjectStore>) -> Arc<Self> {
        let engine = Arc::new(Self {
            project: Arc::clone(&project),
            bundle: RwLock::new(None),
            listener: Mutex::new(None),
        });

        let weak: Weak<Self> = Arc::downgrade(&engine);
        let id = project.subscribe(move |_store| {
            if let Some(engine) = weak.upgrade() {
                engine.rebuild();
            }
            Ok(())
        });
        *engine.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);

        if project.is_open() {
            engine.rebuild();
        }
        engine
    }

    pub fn project(&self) -> &Arc<ProjectStore> {
        &self.project
    }

    /// テンプレート環境と翻訳関数を作り直す
    ///
    /// 失敗した場合は描画を無効化（カード0枚）し、中途半端な状態を残さない。
    pub fn rebuild(&self) {
        tracing::info!(dir = ?self.project.project_dir(), "Rebuilding card renderer");
        let next = match RenderBundle::build(&self.project) {
            Ok(bundle) => {
                tracing::info!(cards = bundle.records.len(), wrapper = %bundle.wrapper, "Card renderer ready");
                Some(Arc::new(bundle))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to rebuild card renderer - rendering disabled");
                None
            }
        };
        *self.bundle.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn current(&self) -> Option<Arc<RenderBundle>> {
        self.bundle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_ready(&self) -> bool {
        self.current().is_some()
    }

    pub fn card_count(&self) -> usize {
        self.current().map(|b| b.records.len()).unwrap_or(0)
    }

    /// 描画対象のカード一覧（再構築時点のもの）
    pub fn records(&self) -> Arc<Vec<Record>> {
        self.current()
            .map(|b| Arc::clone(&b.records))
            .unwrap_or_default()
    }

    /// 指定番号のカードをHTMLへ描画
    ///
    /// 範囲外の番号やテンプレートのエラーはプレースホルダーHTMLを返す。
    pub fn render_card(&self, index: usize, lang: &str) -> String {
        let bundle = self.current();
        let count = bundle.as_ref().map_or(0, |b| b.records.len());
        if index >= count {
            tracing::warn!(index, count, "Card index out of bounds");
            return NO_SUCH_CARD_HTML.to_string();
        }

        let Some(bundle) = bundle else {
            tracing::error!("Renderer not initialized correctly");
            return RENDER_ERROR_HTML.to_string();
        };

        let record = &bundle.records[index];
        match bundle.render(record, lang) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(index, card = record.id(), error = %e, "Error rendering card");
                RENDER_ERROR_HTML.to_string()
            }
        }
    }
}

impl Drop for RenderEngine {
    fn drop(&mut self) {
        let id = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(id) = id {
            self.project.unsubscribe(id);
        }
    }
}

impl std::fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderEngine")
            .field("ready", &self.is_ready())
            .field("cards", &self.card_count())
            .finish()
    }
}
