//! # 申請種別
//!
//! 申請のテンプレート。フォームスキーマと既定ワークフローを保持する。
//! 既定ワークフローが未設定の申請種別も許容される（その場合、作成された
//! 申請は承認ステップを持たない）。

use chrono::{DateTime, Utc};

use super::{form::FormSchema, workflow::WorkflowId};

define_uuid_id! {
    /// 申請種別 ID
    pub struct RequestTypeId;
}

/// 申請種別エンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct RequestType {
    id:                  RequestTypeId,
    name:                String,
    default_workflow_id: Option<WorkflowId>,
    form_schema:         FormSchema,
    created_at:          DateTime<Utc>,
    updated_at:          DateTime<Utc>,
}

/// 申請種別の新規作成パラメータ
pub struct NewRequestType {
    pub id:                  RequestTypeId,
    pub name:                String,
    pub default_workflow_id: Option<WorkflowId>,
    pub form_schema:         FormSchema,
    pub now:                 DateTime<Utc>,
}

impl RequestType {
    /// 新しい申請種別を作成する
    pub fn new(params: NewRequestType) -> Self {
        Self {
            id: params.id,
            name: params.name,
            default_workflow_id: params.default_workflow_id,
            form_schema: params.form_schema,
            created_at: params.now,
            updated_at: params.now,
        }
    }

    /// 既存のデータから復元する
    pub fn from_db(
        id: RequestTypeId,
        name: String,
        default_workflow_id: Option<WorkflowId>,
        form_schema: FormSchema,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            default_workflow_id,
            form_schema,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &RequestTypeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_workflow_id(&self) -> Option<&WorkflowId> {
        self.default_workflow_id.as_ref()
    }

    pub fn form_schema(&self) -> &FormSchema {
        &self.form_schema
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
