//! Deck Builder Common Library
//!
//! CLIとプレビュー処理で共有される型とユーティリティ（IOなし）

pub mod dimension;
pub mod error;
pub mod language;
pub mod record;

pub use dimension::{parse_dimension, number_to_px, DimensionValue, DEFAULT_CARD_HEIGHT, DEFAULT_CARD_WIDTH};
pub use error::{Error, Result};
pub use language::{candidate_languages, candidate_languages_with_fallback, DEFAULT_FALLBACK_LANGUAGE};
pub use record::{Record, ID_FIELD, TEMPLATE_FIELD};
