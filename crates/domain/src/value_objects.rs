//! # 共通値オブジェクト
//!
//! 複数のエンティティで共有される値オブジェクトを定義する。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: プリミティブ型をラップし、型安全性を確保
//! - **バリデーション**: 生成時に検証し、不正な値の存在を型レベルで排除
//! - **不変性**: 一度作成したら変更不可
//!
//! ## 含まれる型
//!
//! | 型 | ラップ対象 | 用途 |
//! |---|-----------|------|
//! | [`Version`] | `u32` | エンティティのバージョン番号（楽観的ロック） |
//! | [`StepOrder`] | `i32` | ワークフロー内のステップ順序（1 始まり） |
//! | [`Priority`] | enum | 申請の優先度 |
//! | [`RequestTitle`] | `String` | 申請の件名 |
//! | [`WorkflowName`] | `String` | ワークフロー名 |
//! | [`UserName`] | `String` | ユーザー表示名 |

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::DomainError;

// =========================================================================
// Version（バージョン番号）
// =========================================================================

/// バージョン番号（値オブジェクト）
///
/// 申請・承認レコードの楽観的ロックに使用。
/// 1 から始まり、更新のたびにインクリメントされる。
///
/// # 不変条件
///
/// - バージョン番号は 1 以上
///
/// # 使用例
///
/// ```rust
/// use shinseiflow_domain::value_objects::Version;
///
/// let v1 = Version::initial();
/// assert_eq!(v1.as_u32(), 1);
///
/// let v2 = v1.next();
/// assert_eq!(v2.as_u32(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u32);

impl Version {
    /// 初期バージョン（1）を作成する
    pub fn initial() -> Self {
        Self(1)
    }

    /// 指定した値からバージョンを作成する
    ///
    /// # エラー
    ///
    /// 0 は無効（バージョンは 1 以上）。`DomainError::Validation` を返す。
    pub fn new(value: u32) -> Result<Self, DomainError> {
        if value == 0 {
            return Err(DomainError::Validation(
                "バージョン番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 次のバージョンを返す
    ///
    /// # パニック
    ///
    /// u32 の最大値を超える場合はパニックする。実運用では到達しない想定。
    pub fn next(&self) -> Self {
        Self(
            self.0
                .checked_add(1)
                .expect("バージョン番号がオーバーフローしました"),
        )
    }

    /// 内部の u32 値を取得する
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// i32 に変換する（DB 互換用）
    ///
    /// # パニック
    ///
    /// i32 の範囲を超える場合はパニックする。
    pub fn as_i32(&self) -> i32 {
        i32::try_from(self.0).expect("バージョン番号が i32 の範囲を超えています")
    }
}

impl TryFrom<i32> for Version {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(DomainError::Validation(
                "バージョン番号は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value as u32))
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

// =========================================================================
// StepOrder（ステップ順序）
// =========================================================================

/// ワークフロー内のステップ順序（値オブジェクト）
///
/// ワークフロー内で一意な昇順の番号。次ステップの判定は
/// 「現在の順序より大きい最小の順序」で行う。
///
/// # 不変条件
///
/// - 1 以上の正整数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StepOrder(i32);

impl StepOrder {
    /// 指定した値からステップ順序を作成する
    ///
    /// # エラー
    ///
    /// 0 以下は無効。`DomainError::Validation` を返す。
    pub fn new(value: i32) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::Validation(
                "ステップ順序は 1 以上である必要があります".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// 内部の i32 値を取得する
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for StepOrder {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::fmt::Display for StepOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =========================================================================
// Priority（優先度）
// =========================================================================

/// 申請の優先度
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    /// 低
    Low,
    /// 中（デフォルト）
    Medium,
    /// 高
    High,
    /// 緊急
    Urgent,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl std::str::FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(DomainError::Validation(format!("不正な優先度: {}", s))),
        }
    }
}

// =========================================================================
// バリデーション付き文字列
// =========================================================================

define_validated_string! {
    /// 申請の件名
    pub struct RequestTitle {
        label: "件名",
        max_length: 200,
    }
}

define_validated_string! {
    /// ワークフロー名
    pub struct WorkflowName {
        label: "ワークフロー名",
        max_length: 100,
    }
}

define_validated_string! {
    /// ユーザー表示名
    pub struct UserName {
        label: "ユーザー名",
        max_length: 100,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // ===== Version =====

    #[test]
    fn test_initial_は1を返す() {
        assert_eq!(Version::initial().as_u32(), 1);
    }

    #[test]
    fn test_next_はインクリメントする() {
        let v = Version::initial().next().next();
        assert_eq!(v.as_u32(), 3);
    }

    #[test]
    fn test_version_new_0はエラー() {
        assert!(Version::new(0).is_err());
    }

    #[test]
    fn test_version_try_from_負数はエラー() {
        assert!(Version::try_from(-1).is_err());
    }

    #[test]
    fn test_version_displayはvプレフィックス付き() {
        assert_eq!(Version::initial().to_string(), "v1");
    }

    // ===== StepOrder =====

    #[test]
    fn test_step_order_正常系() {
        let order = StepOrder::new(1).unwrap();
        assert_eq!(order.as_i32(), 1);
    }

    #[test]
    fn test_step_order_0以下はエラー() {
        assert!(StepOrder::new(0).is_err());
        assert!(StepOrder::new(-5).is_err());
    }

    #[test]
    fn test_step_order_は順序比較できる() {
        let first = StepOrder::new(1).unwrap();
        let second = StepOrder::new(2).unwrap();
        assert!(first < second);
    }

    // ===== Priority =====

    #[test]
    fn test_priority_デフォルトはmedium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_priority_from_str_正常系() {
        assert_eq!("urgent".parse::<Priority>().unwrap(), Priority::Urgent);
    }

    #[test]
    fn test_priority_from_str_不正な値はエラー() {
        assert!("critical".parse::<Priority>().is_err());
    }

    #[test]
    fn test_priority_into_static_str() {
        let s: &str = Priority::High.into();
        assert_eq!(s, "high");
    }

    // ===== RequestTitle =====

    #[test]
    fn test_request_title_正常系() {
        let title = RequestTitle::new("出張申請").unwrap();
        assert_eq!(title.as_str(), "出張申請");
    }

    #[test]
    fn test_request_title_前後の空白はトリムされる() {
        let title = RequestTitle::new("  出張申請  ").unwrap();
        assert_eq!(title.as_str(), "出張申請");
    }

    #[test]
    fn test_request_title_空文字はエラー() {
        assert!(RequestTitle::new("").is_err());
        assert!(RequestTitle::new("   ").is_err());
    }

    #[test]
    fn test_request_title_最大長超過はエラー() {
        let long = "あ".repeat(201);
        assert!(RequestTitle::new(long).is_err());
    }
}
