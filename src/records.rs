//! カードデータ（cards.csv）の読み込み
//!
//! ヘッダー行で列名を決める。列構成はファイルごとに自由。

use deck_builder_common::Record;
use std::path::Path;

/// CSVファイルからカード一覧を読み込み
///
/// - ファイルが無い／読めない場合は空のVecを返す（エラーにしない）
/// - 空または `null` の列名は無視する
/// - `id` が無い行は警告を出してスキップし、以降の行の読み込みを続ける
pub fn load_records(csv_path: &Path) -> Vec<Record> {
    if !csv_path.is_file() {
        return Vec::new();
    }

    let mut reader = match csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(csv_path)
    {
        Ok(reader) => reader,
        Err(e) => {
            tracing::error!(path = %csv_path.display(), error = %e, "Failed to open card data");
            return Vec::new();
        }
    };

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            tracing::error!(path = %csv_path.display(), error = %e, "Failed to read card data header");
            return Vec::new();
        }
    };

    // 有効な列だけ (列番号, 列名) で保持
    let columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| is_usable_header(name))
        .map(|(idx, name)| (idx, name.to_string()))
        .collect();

    let mut records = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        // ヘッダーを1行目として数える
        let line = row_idx + 2;
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(path = %csv_path.display(), line, error = %e, "Skipping malformed card row");
                continue;
            }
        };

        if row.iter().all(|field| field.is_empty()) {
            continue;
        }

        let fields = columns
            .iter()
            .map(|(idx, name)| (name.clone(), row.get(*idx).unwrap_or("").to_string()));

        match Record::new(fields) {
            Ok(record) => records.push(record),
            Err(_) => {
                tracing::warn!(path = %csv_path.display(), line, "Skipping card without required id");
            }
        }
    }

    tracing::debug!(path = %csv_path.display(), count = records.len(), "Loaded card data");
    records
}

fn is_usable_header(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && name != "null"
}
