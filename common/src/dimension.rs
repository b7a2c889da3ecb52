//! カード寸法の正規化
//!
//! 数値は `<値>px`、`<数値><単位>` 形式の文字列は単位を小文字化して返す。
//! 対応単位: px / in / cm / mm

use regex::Regex;

pub const DEFAULT_CARD_WIDTH: &str = "2.5in";
pub const DEFAULT_CARD_HEIGHT: &str = "3.5in";

/// 寸法の解析結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionValue {
    /// 正規化済みの寸法文字列
    Normalized(String),
    /// 空文字（既定値を使う、警告不要）
    Blank,
    /// 解釈できない値（既定値を使う、警告対象）
    Unrecognized,
}

impl DimensionValue {
    /// 正規化済みの値、またはフォールバック
    pub fn or_fallback(self, fallback: &str) -> String {
        match self {
            DimensionValue::Normalized(value) => value,
            _ => fallback.to_string(),
        }
    }
}

/// 数値をpx指定に変換（末尾の0は出力しない）
pub fn number_to_px(value: f64) -> DimensionValue {
    if !value.is_finite() {
        return DimensionValue::Unrecognized;
    }
    // f64のDisplayは 800.0 → "800", 2.50 → "2.5" を出力する
    DimensionValue::Normalized(format!("{}px", value))
}

/// 文字列の寸法指定を解析
pub fn parse_dimension(text: &str) -> DimensionValue {
    lazy_static::lazy_static! {
        // 数値+単位
        static ref DIMENSION_RE: Regex = Regex::new(r"(?i)^(\d+(?:\.\d+)?)(px|in|cm|mm)$").unwrap();
        // 単位なしの数値
        static ref NUMERIC_RE: Regex = Regex::new(r"^(\d+(?:\.\d+)?)$").unwrap();
    }

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return DimensionValue::Blank;
    }

    if let Some(cap) = DIMENSION_RE.captures(&compact) {
        return DimensionValue::Normalized(format!("{}{}", &cap[1], cap[2].to_lowercase()));
    }

    if let Some(cap) = NUMERIC_RE.captures(&compact) {
        return DimensionValue::Normalized(format!("{}px", &cap[1]));
    }

    DimensionValue::Unrecognized
}
