//! 申請ハンドラ
//!
//! DTO 定義と共有状態。操作ごとのハンドラは `command` / `query`
//! サブモジュールにある。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use shinseiflow_domain::{
    request::{Approval, Request},
    value_objects::Priority,
};
use uuid::Uuid;

use crate::usecase::{PendingApprovalItem, RequestUseCaseImpl, RequestWithApprovals};

mod command;
mod query;

pub use command::{approve_step, cancel_request, create_request, reject_step};
pub use query::{get_request, list_my_requests, list_pending_approvals};

/// 申請ハンドラの共有状態
pub struct RequestApiState {
    pub usecase: RequestUseCaseImpl,
}

// ===== リクエスト DTO =====

/// 申請作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateRequestRequest {
    pub requester_id:    Uuid,
    pub request_type_id: Uuid,
    pub title:           String,
    #[serde(default)]
    pub form_data:       JsonValue,
    #[serde(default)]
    pub priority:        Priority,
    pub due_date:        Option<NaiveDate>,
}

/// ステップ承認リクエスト
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub user_id: Uuid,
    pub comment: Option<String>,
}

/// ステップ却下リクエスト（コメント必須）
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub user_id: Uuid,
    pub comment: String,
}

/// 申請取り消しリクエスト
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub user_id: Uuid,
}

/// (申請 ID, ステップ ID) のパスパラメータ
#[derive(Debug, Deserialize)]
pub struct StepPathParams {
    pub id:      Uuid,
    pub step_id: Uuid,
}

/// user_id クエリパラメータ
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Uuid,
}

// ===== レスポンス DTO =====

/// 申請 DTO
#[derive(Debug, Serialize)]
pub struct RequestDto {
    pub id:              Uuid,
    pub request_type_id: Uuid,
    pub workflow_id:     Option<Uuid>,
    pub title:           String,
    pub form_data:       JsonValue,
    pub priority:        Priority,
    pub due_date:        Option<NaiveDate>,
    pub status:          String,
    pub version:         u32,
    pub current_step_id: Option<Uuid>,
    pub requester_id:    Uuid,
    pub completed_at:    Option<DateTime<Utc>>,
    pub created_at:      DateTime<Utc>,
    pub updated_at:      DateTime<Utc>,
}

impl RequestDto {
    pub fn from_request(request: &Request) -> Self {
        let status: &str = request.status().into();
        Self {
            id: *request.id().as_uuid(),
            request_type_id: *request.request_type_id().as_uuid(),
            workflow_id: request.workflow_id().map(|w| *w.as_uuid()),
            title: request.title().as_str().to_string(),
            form_data: request.form_data().clone(),
            priority: request.priority(),
            due_date: request.due_date(),
            status: status.to_string(),
            version: request.version().as_u32(),
            current_step_id: request.current_step_id().map(|s| *s.as_uuid()),
            requester_id: *request.requester_id().as_uuid(),
            completed_at: request.completed_at(),
            created_at: request.created_at(),
            updated_at: request.updated_at(),
        }
    }
}

/// 承認レコード DTO
#[derive(Debug, Serialize)]
pub struct ApprovalDto {
    pub id:          Uuid,
    pub request_id:  Uuid,
    pub step_id:     Uuid,
    pub approver_id: Uuid,
    pub status:      String,
    pub comment:     Option<String>,
    pub decided_at:  Option<DateTime<Utc>>,
    pub created_at:  DateTime<Utc>,
}

impl ApprovalDto {
    pub fn from_approval(approval: &Approval) -> Self {
        let status: &str = approval.status().into();
        Self {
            id: *approval.id().as_uuid(),
            request_id: *approval.request_id().as_uuid(),
            step_id: *approval.step_id().as_uuid(),
            approver_id: *approval.approver_id().as_uuid(),
            status: status.to_string(),
            comment: approval.comment().map(String::from),
            decided_at: approval.decided_at(),
            created_at: approval.created_at(),
        }
    }
}

/// 申請詳細 DTO（承認レコード付き）
#[derive(Debug, Serialize)]
pub struct RequestDetailDto {
    pub request:   RequestDto,
    pub approvals: Vec<ApprovalDto>,
}

impl RequestDetailDto {
    pub fn from_result(result: &RequestWithApprovals) -> Self {
        Self {
            request:   RequestDto::from_request(&result.request),
            approvals: result
                .approvals
                .iter()
                .map(ApprovalDto::from_approval)
                .collect(),
        }
    }
}

/// 承認待ち一覧（受信箱）の 1 件
#[derive(Debug, Serialize)]
pub struct PendingApprovalDto {
    pub approval:      ApprovalDto,
    pub request_title: String,
}

impl PendingApprovalDto {
    pub fn from_item(item: &PendingApprovalItem) -> Self {
        Self {
            approval:      ApprovalDto::from_approval(&item.approval),
            request_title: item.request_title.clone(),
        }
    }
}
