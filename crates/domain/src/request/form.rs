//! # フォームスキーマ
//!
//! 申請種別ごとに動的に定義されるフォームのスキーマ型。
//! request_types テーブルの `form_schema` カラム（JSON）からデシリアライズされる。

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::DomainError;

/// フォームスキーマ
///
/// フィールド定義の配列。スキーマ自体のスキーマ検証は行わない
/// （不正な JSON はデシリアライズエラーとして扱う）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FormSchema {
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl FormSchema {
    /// JSON 値からスキーマを復元する
    pub fn from_json(value: &JsonValue) -> Result<Self, DomainError> {
        serde_json::from_value(value.clone())
            .map_err(|e| DomainError::Validation(format!("不正なフォームスキーマ: {}", e)))
    }

    /// JSON 値に変換する（DB 格納用）
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).expect("フォームスキーマのシリアライズに失敗しました")
    }
}

/// フィールド定義
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// フィールド名（form_data のキー）
    pub name: String,
    /// 表示ラベル（エラーメッセージに使用）
    pub label: String,
    /// フィールド型
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// 必須フラグ
    #[serde(default)]
    pub required: bool,
    /// select 型の選択肢
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// array 型の要素フィールド定義（ネストは 1 段のみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subfields: Option<Vec<FieldSpec>>,
}

/// フィールド型
///
/// 未知の型は [`Unknown`](FieldType::Unknown) にフォールバックし、
/// 必須チェックのみ適用される（型チェックはスキップ）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Date,
    Select,
    Array,
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_json_正常系() {
        let schema = FormSchema::from_json(&json!({
            "fields": [
                {"name": "amount", "label": "金額", "type": "number", "required": true},
                {"name": "category", "label": "分類", "type": "select",
                 "options": ["交通費", "宿泊費"]}
            ]
        }))
        .unwrap();

        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields[0].field_type, FieldType::Number);
        assert!(schema.fields[0].required);
        assert!(!schema.fields[1].required);
    }

    #[test]
    fn test_from_json_fieldsなしは空スキーマ() {
        let schema = FormSchema::from_json(&json!({})).unwrap();

        assert!(schema.fields.is_empty());
    }

    #[test]
    fn test_未知のフィールド型はunknownにフォールバックする() {
        let schema = FormSchema::from_json(&json!({
            "fields": [{"name": "sig", "label": "署名", "type": "signature"}]
        }))
        .unwrap();

        assert_eq!(schema.fields[0].field_type, FieldType::Unknown);
    }

    #[test]
    fn test_subfields_のネスト定義を読み込める() {
        let schema = FormSchema::from_json(&json!({
            "fields": [
                {"name": "items", "label": "明細", "type": "array", "required": true,
                 "subfields": [
                     {"name": "description", "label": "内容", "type": "text", "required": true}
                 ]}
            ]
        }))
        .unwrap();

        let subfields = schema.fields[0].subfields.as_ref().unwrap();
        assert_eq!(subfields[0].name, "description");
    }
}
