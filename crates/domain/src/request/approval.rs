//! # 承認レコード
//!
//! ステップ × 承認者ごとの承認タスクを管理する。
//! ロール指定のステップでは、ステップ到達時点のロール保持者 1 人につき
//! 1 レコードが作成される（スナップショット。以後のメンバー変更は反映しない）。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use super::{instance::RequestId, workflow::WorkflowStepId};
use crate::{DomainError, user::UserId, value_objects::Version};

define_uuid_id! {
    /// 承認レコード ID
    pub struct ApprovalId;
}

/// 承認レコードステータス
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApprovalStatus {
    /// 承認待ち
    Pending,
    /// 承認
    Approved,
    /// 却下
    Rejected,
}

impl std::str::FromStr for ApprovalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DomainError::Validation(format!(
                "不正な承認ステータス: {}",
                s
            ))),
        }
    }
}

/// 承認レコードエンティティ
///
/// 承認者 1 人分の承認タスク。判断結果とコメントを保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    id: ApprovalId,
    request_id: RequestId,
    step_id: WorkflowStepId,
    approver_id: UserId,
    status: ApprovalStatus,
    version: Version,
    comment: Option<String>,
    decided_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// 承認レコードの新規作成パラメータ
pub struct NewApproval {
    pub id: ApprovalId,
    pub request_id: RequestId,
    pub step_id: WorkflowStepId,
    pub approver_id: UserId,
    pub now: DateTime<Utc>,
}

/// 承認レコードの DB 復元パラメータ
pub struct ApprovalRecord {
    pub id: ApprovalId,
    pub request_id: RequestId,
    pub step_id: WorkflowStepId,
    pub approver_id: UserId,
    pub status: ApprovalStatus,
    pub version: Version,
    pub comment: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Approval {
    /// 新しい承認レコードを作成する（承認待ち）
    pub fn new(params: NewApproval) -> Self {
        Self {
            id: params.id,
            request_id: params.request_id,
            step_id: params.step_id,
            approver_id: params.approver_id,
            status: ApprovalStatus::Pending,
            version: Version::initial(),
            comment: None,
            decided_at: None,
            created_at: params.now,
            updated_at: params.now,
        }
    }

    /// 既存のデータから復元する
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: 判断済みなのに decided_at が NULL
    pub fn from_db(record: ApprovalRecord) -> Result<Self, DomainError> {
        if record.status != ApprovalStatus::Pending && record.decided_at.is_none() {
            return Err(DomainError::Validation(format!(
                "{} の承認レコードには decided_at が必要です",
                record.status
            )));
        }

        Ok(Self {
            id: record.id,
            request_id: record.request_id,
            step_id: record.step_id,
            approver_id: record.approver_id,
            status: record.status,
            version: record.version,
            comment: record.comment,
            decided_at: record.decided_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    // Getter メソッド

    pub fn id(&self) -> &ApprovalId {
        &self.id
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn step_id(&self) -> &WorkflowStepId {
        &self.step_id
    }

    pub fn approver_id(&self) -> &UserId {
        &self.approver_id
    }

    pub fn status(&self) -> ApprovalStatus {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ビジネスロジックメソッド

    /// 承認した新しいインスタンスを返す
    ///
    /// コメントは任意。version をインクリメントして楽観的ロックに対応。
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: 承認待ち以外の状態で呼び出した場合
    ///   （二重承認の防止）
    pub fn approved(
        self,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if self.status != ApprovalStatus::Pending {
            return Err(DomainError::Validation(format!(
                "承認は承認待ち状態でのみ可能です（現在: {}）",
                self.status
            )));
        }

        Ok(Self {
            status: ApprovalStatus::Approved,
            version: self.version.next(),
            comment,
            decided_at: Some(now),
            updated_at: now,
            ..self
        })
    }

    /// 却下した新しいインスタンスを返す
    ///
    /// 却下にはコメントが必須（空白のみも不可）。
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: コメントが空、または承認待ち以外の状態
    pub fn rejected(self, comment: String, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if comment.trim().is_empty() {
            return Err(DomainError::Validation(
                "却下にはコメントが必須です".to_string(),
            ));
        }
        if self.status != ApprovalStatus::Pending {
            return Err(DomainError::Validation(format!(
                "却下は承認待ち状態でのみ可能です（現在: {}）",
                self.status
            )));
        }

        Ok(Self {
            status: ApprovalStatus::Rejected,
            version: self.version.next(),
            comment: Some(comment),
            decided_at: Some(now),
            updated_at: now,
            ..self
        })
    }
}
