//! # ユーザー
//!
//! ユーザーエンティティとそれに関連する値オブジェクトを定義する。
//! 承認者解決と通知送信の対象となる最小限のモデル。
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: UserId は UUID をラップし、型安全性を確保
//! - **不変性**: エンティティフィールドは基本的に不変、変更はメソッド経由
//! - **PII 保護**: メールアドレスは Debug 出力でマスクされる

use chrono::{DateTime, Utc};

use crate::value_objects::UserName;

define_uuid_id! {
    /// ユーザー ID（一意識別子）
    ///
    /// UUID v7 を使用し、生成順にソート可能。
    pub struct UserId;
}

define_validated_string! {
    /// メールアドレス
    ///
    /// 形式の厳密な検証は行わない（`@` を含むことのみ確認したい場合は
    /// 呼び出し側の責務）。PII のため Debug 出力はマスクされる。
    pub struct Email {
        label: "メールアドレス",
        max_length: 254,
        pii: true,
    }
}

/// ユーザーエンティティ
///
/// 承認ステップの担当者・通知の宛先として参照される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id:         UserId,
    name:       UserName,
    email:      Email,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// 新しいユーザーを作成する
    pub fn new(id: UserId, name: UserName, email: Email, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            email,
            created_at: now,
            updated_at: now,
        }
    }

    /// 既存のデータから復元する
    pub fn from_db(
        id: UserId,
        name: UserName,
        email: Email,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
