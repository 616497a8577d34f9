//! # 役割・部署
//!
//! ロールベースの承認者解決で使用する識別子と、ロールエンティティを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 用途 |
//! |---|------------|------|
//! | [`Role`] | 役割（ロール） | ロール指定の承認ステップを、ロール保持者全員に展開する |
//! | [`DepartmentId`] | 部署 ID | 部署指定の承認ステップ（解決パス未実装、明示的エラー） |
//!
//! ## 設計方針
//!
//! - ユーザーとロールの対応（user_roles）はインフラ層のリポジトリが管理する
//! - 承認レコードの展開はステップ到達時点のロール保持者のスナップショット。
//!   以後のメンバー変更は保留中の承認レコードに反映されない

use chrono::{DateTime, Utc};

define_uuid_id! {
    /// ロール ID（一意識別子）
    pub struct RoleId;
}

define_uuid_id! {
    /// 部署 ID（一意識別子）
    pub struct DepartmentId;
}

/// ロールエンティティ
///
/// 「上長」「経理」などの役割。承認ステップの担当者指定に使用する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    id:          RoleId,
    name:        String,
    description: Option<String>,
    created_at:  DateTime<Utc>,
}

impl Role {
    /// 新しいロールを作成する
    pub fn new(id: RoleId, name: String, description: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            description,
            created_at: now,
        }
    }

    pub fn id(&self) -> &RoleId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
