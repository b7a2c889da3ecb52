//! カードレコードの型定義
//!
//! CSVの1行を表す可変長のフィールドマップ。
//! `id` は必須で、前後の空白を除いた値が空であってはならない。

use crate::error::{Error, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// 必須のIDフィールド名
pub const ID_FIELD: &str = "id";

/// レコード固有のテンプレートを指定する予約フィールド名
pub const TEMPLATE_FIELD: &str = "template";

/// 1枚のカード（CSVの1データ行）
///
/// フィールドの順序は入力順を保持する。構築後は変更できない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// フィールド列からレコードを構築
    ///
    /// 同名フィールドは後勝ち（位置は最初の出現位置を維持）。
    /// `id` が無いか空白のみの場合は `Error::MissingField` を返す。
    pub fn new<I, K, V>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut collected: Vec<(String, String)> = Vec::new();
        for (key, value) in fields {
            let key = key.into();
            let value = value.into();
            match collected.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => collected.push((key, value)),
            }
        }

        let id_slot = collected
            .iter_mut()
            .find(|(k, _)| k == ID_FIELD)
            .ok_or(Error::MissingField(ID_FIELD))?;
        let trimmed = id_slot.1.trim();
        if trimmed.is_empty() {
            return Err(Error::MissingField(ID_FIELD));
        }
        id_slot.1 = trimmed.to_string();

        Ok(Self { fields: collected })
    }

    /// カードID（トリム済み、非空）
    pub fn id(&self) -> &str {
        // new() で存在を保証済み
        self.get(ID_FIELD).unwrap_or_default()
    }

    /// レコード固有のテンプレート名（空白のみは None）
    pub fn template(&self) -> Option<&str> {
        self.non_blank(TEMPLATE_FIELD)
    }

    /// フィールド値を取得（列があれば空文字でも Some）
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.as_str())
    }

    /// 値が空白のみでないフィールドを取得
    pub fn non_blank(&self, field: &str) -> Option<&str> {
        self.get(field).filter(|v| !v.trim().is_empty())
    }

    /// 入力順のフィールド一覧
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
