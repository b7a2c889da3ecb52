//! 翻訳言語の候補リスト生成
//!
//! 要求された言語コードから、翻訳ファイルを探す順序付きの候補を作る。
//! 例: `en-US` → `en-US`, `en_US`, `en_us`, `en`

/// フォールバック言語が未指定の場合に使う言語
pub const DEFAULT_FALLBACK_LANGUAGE: &str = "en";

/// 言語コード1つ分の候補を重複なしで追加
fn push_candidates(candidates: &mut Vec<String>, lang: &str) {
    let trimmed = lang.trim();
    if trimmed.is_empty() {
        return;
    }

    let underscore = trimmed.replace('-', "_");
    let lowered = underscore.to_lowercase();

    let mut variants = vec![trimmed.to_string(), underscore.clone(), lowered];

    // 地域部分を落とした基本言語
    if let Some(idx) = underscore.find('_').filter(|&i| i > 0) {
        variants.push(underscore[..idx].to_string());
    }
    if let Some(idx) = trimmed.find('-').filter(|&i| i > 0) {
        variants.push(trimmed[..idx].to_string());
    }

    for variant in variants {
        if !candidates.contains(&variant) {
            candidates.push(variant);
        }
    }
}

/// フォールバックなしの候補リスト
pub fn candidate_languages(lang: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    push_candidates(&mut candidates, lang);
    candidates
}

/// 主言語の全候補 → フォールバック言語の全候補 の順に並べた候補リスト
///
/// `fallback` が空白のみの場合は `DEFAULT_FALLBACK_LANGUAGE` を使う。
pub fn candidate_languages_with_fallback(lang: &str, fallback: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    push_candidates(&mut candidates, lang);

    let fallback = if fallback.trim().is_empty() {
        DEFAULT_FALLBACK_LANGUAGE
    } else {
        fallback
    };
    push_candidates(&mut candidates, fallback);
    candidates
}
