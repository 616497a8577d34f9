//! # フォームバリデーション
//!
//! 申請フォームデータをフォームスキーマに対して検証する。
//! 申請作成時に実行され、すべてのエラーを収集して返す（最初のエラーで
//! 打ち切らない）。
//!
//! ## 検証ルール
//!
//! - 必須フィールドが未入力（欠損 / null / 空文字）→ 必須エラー。
//!   そのフィールドの型チェックはスキップ
//! - `number`: JSON 数値、または数値としてパース可能な文字列
//! - `date`: `YYYY-MM-DD` 形式（正規表現による字面チェックのみ。
//!   暦として有効かは検証しない — `2024-13-45` は通る）
//! - `select`: options が定義されている場合、そのいずれかに一致
//! - `array`: JSON 配列であること。必須なら非空。subfields があれば
//!   各要素の必須サブフィールドを検証（ネストは 1 段のみ）
//!
//! フィールド間の相関チェックは行わない。

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::form::{FieldSpec, FieldType, FormSchema};

/// `YYYY-MM-DD` の字面チェック用正規表現
///
/// 暦の妥当性（月が 1〜12 か等）は意図的に検証しない。
static DATE_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("不正な正規表現"));

/// バリデーション結果
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub valid:  bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// すべてのエラーメッセージを改行区切りで結合する
    pub fn joined_messages(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// バリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub code:    String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field:   Option<String>,
}

impl ValidationError {
    fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            code:    code.into(),
            message: message.into(),
            field:   Some(field.into()),
        }
    }
}

/// フォームデータをスキーマに対してバリデーションする
///
/// 純粋関数。すべてのフィールドを検証し、エラーを収集して返す。
pub fn validate_form(form_data: &JsonValue, schema: &FormSchema) -> ValidationResult {
    let mut errors = Vec::new();

    for field in &schema.fields {
        validate_field(form_data, field, &mut errors);
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}

/// 値が「未入力」か判定する（欠損 / null / 空文字）
fn is_empty_value(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn validate_field(form_data: &JsonValue, field: &FieldSpec, errors: &mut Vec<ValidationError>) {
    let value = form_data.get(&field.name);

    // 必須チェック。未入力ならこのフィールドの型チェックはスキップ
    if is_empty_value(value) {
        if field.required {
            errors.push(ValidationError::new(
                "required_field",
                format!("{}は必須です", field.label),
                &field.name,
            ));
        }
        return;
    }
    let value = value.expect("is_empty_value が None を除外済み");

    match field.field_type {
        FieldType::Number => validate_number(value, field, errors),
        FieldType::Date => validate_date(value, field, errors),
        FieldType::Select => validate_select(value, field, errors),
        FieldType::Array => validate_array(value, field, errors),
        // text / textarea / 未知の型は必須チェックのみ
        FieldType::Text | FieldType::Textarea | FieldType::Unknown => {}
    }
}

/// number: JSON 数値、または数値としてパース可能な文字列
fn validate_number(value: &JsonValue, field: &FieldSpec, errors: &mut Vec<ValidationError>) {
    let is_number = match value {
        JsonValue::Number(_) => true,
        JsonValue::String(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    };
    if !is_number {
        errors.push(ValidationError::new(
            "invalid_number",
            format!("{}は数値である必要があります", field.label),
            &field.name,
        ));
    }
}

/// date: `YYYY-MM-DD` の字面チェックのみ（暦の妥当性は見ない）
fn validate_date(value: &JsonValue, field: &FieldSpec, errors: &mut Vec<ValidationError>) {
    let matches = value
        .as_str()
        .is_some_and(|s| DATE_FORMAT.is_match(s));
    if !matches {
        errors.push(ValidationError::new(
            "invalid_date_format",
            format!("{}は YYYY-MM-DD 形式である必要があります", field.label),
            &field.name,
        ));
    }
}

/// select: options が定義されている場合、そのいずれかに一致すること
fn validate_select(value: &JsonValue, field: &FieldSpec, errors: &mut Vec<ValidationError>) {
    let Some(options) = &field.options else {
        // options 未定義なら任意の値を許容する
        return;
    };
    let is_valid = value
        .as_str()
        .is_some_and(|s| options.iter().any(|o| o == s));
    if !is_valid {
        errors.push(ValidationError::new(
            "invalid_option",
            format!("{}は選択肢のいずれかである必要があります", field.label),
            &field.name,
        ));
    }
}

/// array: 配列型チェック + 必須なら非空 + 各要素の必須サブフィールド検証
fn validate_array(value: &JsonValue, field: &FieldSpec, errors: &mut Vec<ValidationError>) {
    let Some(items) = value.as_array() else {
        errors.push(ValidationError::new(
            "invalid_array",
            format!("{}は配列である必要があります", field.label),
            &field.name,
        ));
        return;
    };

    if field.required && items.is_empty() {
        errors.push(ValidationError::new(
            "empty_array",
            format!("{}は 1 件以上入力してください", field.label),
            &field.name,
        ));
        return;
    }

    // サブフィールドの必須チェック（ネストは 1 段のみ。型チェックは行わない）
    let Some(subfields) = &field.subfields else {
        return;
    };
    for (index, item) in items.iter().enumerate() {
        for subfield in subfields {
            if subfield.required && is_empty_value(item.get(&subfield.name)) {
                errors.push(ValidationError::new(
                    "required_field",
                    format!(
                        "{}の {} 行目: {}は必須です",
                        field.label,
                        index + 1,
                        subfield.label
                    ),
                    format!("{}[{}].{}", field.name, index, subfield.name),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    /// テスト用のスキーマを生成するヘルパー
    fn expense_schema() -> FormSchema {
        FormSchema::from_json(&json!({
            "fields": [
                {"name": "title", "label": "件名", "type": "text", "required": true},
                {"name": "amount", "label": "金額", "type": "number", "required": true},
                {"name": "date", "label": "利用日", "type": "date", "required": true},
                {"name": "category", "label": "分類", "type": "select", "required": false,
                 "options": ["交通費", "宿泊費", "消耗品"]},
                {"name": "items", "label": "明細", "type": "array", "required": false,
                 "subfields": [
                     {"name": "description", "label": "内容", "type": "text", "required": true},
                     {"name": "note", "label": "備考", "type": "text", "required": false}
                 ]}
            ]
        }))
        .unwrap()
    }

    fn valid_form_data() -> serde_json::Value {
        json!({
            "title": "出張精算",
            "amount": 12800,
            "date": "2025-04-01",
            "category": "交通費",
            "items": [{"description": "新幹線", "note": null}]
        })
    }

    fn has_error(result: &ValidationResult, code: &str) -> bool {
        result.errors.iter().any(|e| e.code == code)
    }

    #[test]
    fn test_有効なフォームデータでバリデーション成功() {
        let result = validate_form(&valid_form_data(), &expense_schema());

        assert!(result.valid, "errors: {:?}", result.errors);
        assert!(result.errors.is_empty());
    }

    // --- 必須チェック ---

    #[test]
    fn test_複数の必須エラーが同時に返される() {
        // title, amount, date がすべて欠損 → 3 件まとめて返る（打ち切らない）
        let result = validate_form(&json!({}), &expense_schema());

        assert!(!result.valid);
        let required_errors: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.code == "required_field")
            .collect();
        assert_eq!(required_errors.len(), 3);
    }

    #[test]
    fn test_必須エラーメッセージにラベルが含まれる() {
        let result = validate_form(&json!({}), &expense_schema());

        assert!(result.errors.iter().any(|e| e.message.contains("件名")));
        assert!(result.errors.iter().any(|e| e.message.contains("金額")));
        assert!(result.errors.iter().any(|e| e.message.contains("利用日")));
    }

    #[test]
    fn test_nullは未入力として扱う() {
        let mut data = valid_form_data();
        data["title"] = json!(null);

        let result = validate_form(&data, &expense_schema());

        assert!(has_error(&result, "required_field"));
    }

    #[test]
    fn test_空文字は未入力として扱う() {
        let mut data = valid_form_data();
        data["title"] = json!("");

        let result = validate_form(&data, &expense_schema());

        assert!(has_error(&result, "required_field"));
    }

    #[test]
    fn test_必須でないフィールドの欠損はエラーにならない() {
        let mut data = valid_form_data();
        data.as_object_mut().unwrap().remove("category");
        data.as_object_mut().unwrap().remove("items");

        let result = validate_form(&data, &expense_schema());

        assert!(result.valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn test_未入力フィールドの型チェックはスキップされる() {
        // amount が欠損 → required_field は出るが invalid_number は出ない
        let mut data = valid_form_data();
        data.as_object_mut().unwrap().remove("amount");

        let result = validate_form(&data, &expense_schema());

        assert!(has_error(&result, "required_field"));
        assert!(!has_error(&result, "invalid_number"));
    }

    // --- number ---

    #[test]
    fn test_数値文字列は数値として許容される() {
        let mut data = valid_form_data();
        data["amount"] = json!("12800");

        let result = validate_form(&data, &expense_schema());

        assert!(result.valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn test_数値としてパースできない文字列はエラー() {
        let mut data = valid_form_data();
        data["amount"] = json!("一万二千円");

        let result = validate_form(&data, &expense_schema());

        assert!(has_error(&result, "invalid_number"));
    }

    #[test]
    fn test_真偽値は数値エラー() {
        let mut data = valid_form_data();
        data["amount"] = json!(true);

        let result = validate_form(&data, &expense_schema());

        assert!(has_error(&result, "invalid_number"));
    }

    // --- date ---

    #[test]
    fn test_形式違反の日付はエラー() {
        let mut data = valid_form_data();
        data["date"] = json!("2025/04/01");

        let result = validate_form(&data, &expense_schema());

        assert!(has_error(&result, "invalid_date_format"));
    }

    #[test]
    fn test_暦として不正でも形式が合えば通る() {
        // 字面チェックのみ、という仕様の境界ケース。
        // 13 月 45 日は暦には存在しないが YYYY-MM-DD 形式には一致する。
        let mut data = valid_form_data();
        data["date"] = json!("2024-13-45");

        let result = validate_form(&data, &expense_schema());

        assert!(result.valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn test_文字列でない日付はエラー() {
        let mut data = valid_form_data();
        data["date"] = json!(20250401);

        let result = validate_form(&data, &expense_schema());

        assert!(has_error(&result, "invalid_date_format"));
    }

    // --- select ---

    #[test]
    fn test_選択肢にない値はエラー() {
        let mut data = valid_form_data();
        data["category"] = json!("接待費");

        let result = validate_form(&data, &expense_schema());

        assert!(has_error(&result, "invalid_option"));
    }

    #[test]
    fn test_optionsのないselectは任意の値を許容する() {
        let schema = FormSchema::from_json(&json!({
            "fields": [{"name": "free", "label": "自由選択", "type": "select"}]
        }))
        .unwrap();

        let result = validate_form(&json!({"free": "なんでも"}), &schema);

        assert!(result.valid);
    }

    // --- array ---

    #[test]
    fn test_配列でない値はエラー() {
        let mut data = valid_form_data();
        data["items"] = json!("明細A");

        let result = validate_form(&data, &expense_schema());

        assert!(has_error(&result, "invalid_array"));
    }

    #[test]
    fn test_必須配列の空はエラー() {
        let schema = FormSchema::from_json(&json!({
            "fields": [{"name": "items", "label": "明細", "type": "array", "required": true}]
        }))
        .unwrap();

        let result = validate_form(&json!({"items": []}), &schema);

        assert!(has_error(&result, "empty_array"));
    }

    #[test]
    fn test_必須でない配列の空は許容される() {
        let mut data = valid_form_data();
        data["items"] = json!([]);

        let result = validate_form(&data, &expense_schema());

        assert!(result.valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn test_要素の必須サブフィールド欠損はエラー() {
        let mut data = valid_form_data();
        data["items"] = json!([
            {"description": "新幹線"},
            {"note": "領収書なし"}
        ]);

        let result = validate_form(&data, &expense_schema());

        // 2 要素目のみ description 欠損
        let sub_errors: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.code == "required_field")
            .collect();
        assert_eq!(sub_errors.len(), 1);
        assert!(sub_errors[0].message.contains("2 行目"));
        assert_eq!(sub_errors[0].field.as_deref(), Some("items[1].description"));
    }

    // --- 集約 ---

    #[test]
    fn test_複数種類のエラーが同時に返される() {
        let data = json!({
            "title": "精算",
            "amount": "金額未定",
            "date": "01-04-2025",
            "category": "接待費"
        });

        let result = validate_form(&data, &expense_schema());

        assert!(has_error(&result, "invalid_number"));
        assert!(has_error(&result, "invalid_date_format"));
        assert!(has_error(&result, "invalid_option"));
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_joined_messagesは改行区切りで結合する() {
        let result = validate_form(&json!({}), &expense_schema());

        let joined = result.joined_messages();
        assert_eq!(joined.lines().count(), result.errors.len());
    }
}
