//! # 申請ユースケース
//!
//! 申請の作成・承認・却下・取り消しに関するビジネスロジックを実装する。
//! 承認フローの遷移ロジックはこのユースケースが唯一の実装
//! （ハンドラやクライアント側に重複実装を持たない）。

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use shinseiflow_domain::{
    clock::Clock,
    request::{Approval, Request, RequestTypeId},
    value_objects::Priority,
};
use shinseiflow_infra::{
    TransactionManager,
    repository::{
        ApprovalRepository,
        NotificationRepository,
        RequestRepository,
        RequestTypeRepository,
        RoleRepository,
        WorkflowRepository,
    },
};

mod command;
mod query;
mod resolver;

/// 申請作成入力
#[derive(Debug, Clone)]
pub struct CreateRequestInput {
    /// 申請種別 ID
    pub request_type_id: RequestTypeId,
    /// 件名
    pub title:           String,
    /// フォームデータ（申請種別のスキーマで検証される）
    pub form_data:       JsonValue,
    /// 優先度
    pub priority:        Priority,
    /// 期日
    pub due_date:        Option<NaiveDate>,
}

/// ステップ承認入力
#[derive(Debug, Clone)]
pub struct ApproveInput {
    /// コメント（任意）
    pub comment: Option<String>,
}

/// ステップ却下入力
#[derive(Debug, Clone)]
pub struct RejectInput {
    /// コメント（必須。空白のみは不可）
    pub comment: String,
}

/// 申請と承認レコード一覧のペア
#[derive(Debug, PartialEq)]
pub struct RequestWithApprovals {
    pub request:   Request,
    pub approvals: Vec<Approval>,
}

/// 承認待ち一覧（受信箱）の 1 件
#[derive(Debug, PartialEq, Eq)]
pub struct PendingApprovalItem {
    pub approval:      Approval,
    pub request_title: String,
}

/// 申請ユースケースの依存コンポーネント
pub struct RequestUseCaseDeps {
    pub request_repo:      Arc<dyn RequestRepository>,
    pub request_type_repo: Arc<dyn RequestTypeRepository>,
    pub workflow_repo:     Arc<dyn WorkflowRepository>,
    pub approval_repo:     Arc<dyn ApprovalRepository>,
    pub role_repo:         Arc<dyn RoleRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub clock:             Arc<dyn Clock>,
    pub tx_manager:        Arc<dyn TransactionManager>,
}

/// 申請ユースケース実装
///
/// 操作ごとの実装は `command` / `query` サブモジュールに分割している。
pub struct RequestUseCaseImpl {
    deps: RequestUseCaseDeps,
}

impl RequestUseCaseImpl {
    /// 新しい申請ユースケースを作成する
    pub fn new(deps: RequestUseCaseDeps) -> Self {
        Self { deps }
    }
}
