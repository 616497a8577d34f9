//! # テスト用モックリポジトリ
//!
//! ユースケーステストで使用するインメモリモックリポジトリ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! shinseiflow-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use shinseiflow_domain::{
    notification::Notification,
    request::{
        Approval,
        Request,
        RequestId,
        RequestStatus,
        RequestType,
        RequestTypeId,
        Workflow,
        WorkflowId,
        WorkflowStep,
        WorkflowStepId,
    },
    role::RoleId,
    user::{User, UserId},
    value_objects::{StepOrder, Version},
};

use crate::{
    db::{TransactionManager, TxContext},
    error::InfraError,
    repository::{
        ApprovalRepository,
        NotificationRepository,
        RequestRepository,
        RequestTypeRepository,
        RoleRepository,
        UserRepository,
        WorkflowRepository,
    },
};

// ===== MockTransactionManager =====

/// テスト用 TransactionManager
///
/// Mock リポジトリはインメモリ実装のため、実際のトランザクションは発生しない。
pub struct MockTransactionManager;

#[async_trait]
impl TransactionManager for MockTransactionManager {
    async fn begin(&self) -> Result<TxContext, InfraError> {
        Ok(TxContext::mock())
    }
}

// ===== MockRequestRepository =====

#[derive(Clone, Default)]
pub struct MockRequestRepository {
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト用にトランザクションなしで申請を追加する
    pub fn add_request(&self, request: Request) {
        self.requests.lock().unwrap().push(request);
    }
}

#[async_trait]
impl RequestRepository for MockRequestRepository {
    async fn insert(&self, _tx: &mut TxContext, request: &Request) -> Result<(), InfraError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn update_with_version_check(
        &self,
        _tx: &mut TxContext,
        request: &Request,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        let mut requests = self.requests.lock().unwrap();
        let Some(pos) = requests.iter().position(|r| r.id() == request.id()) else {
            return Ok(());
        };
        if requests[pos].version() != expected_version {
            return Err(InfraError::conflict(
                "Request",
                request.id().as_uuid().to_string(),
            ));
        }
        requests[pos] = request.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &RequestId) -> Result<Option<Request>, InfraError> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned())
    }

    async fn find_by_requester(&self, requester_id: &UserId) -> Result<Vec<Request>, InfraError> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.requester_id() == requester_id)
            .cloned()
            .collect())
    }

    async fn find_due_on(&self, due_date: NaiveDate) -> Result<Vec<Request>, InfraError> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.due_date() == Some(due_date)
                    && matches!(
                        r.status(),
                        RequestStatus::Pending | RequestStatus::InProgress
                    )
            })
            .cloned()
            .collect())
    }
}

// ===== MockWorkflowRepository =====

#[derive(Clone, Default)]
pub struct MockWorkflowRepository {
    workflows: Arc<Mutex<Vec<Workflow>>>,
    steps:     Arc<Mutex<Vec<WorkflowStep>>>,
}

impl MockWorkflowRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_workflow(&self, workflow: Workflow) {
        self.workflows.lock().unwrap().push(workflow);
    }

    pub fn add_step(&self, step: WorkflowStep) {
        self.steps.lock().unwrap().push(step);
    }
}

#[async_trait]
impl WorkflowRepository for MockWorkflowRepository {
    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<Workflow>, InfraError> {
        Ok(self
            .workflows
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.id() == id)
            .cloned())
    }

    async fn find_steps(&self, workflow_id: &WorkflowId) -> Result<Vec<WorkflowStep>, InfraError> {
        let mut steps: Vec<WorkflowStep> = self
            .steps
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.workflow_id() == workflow_id)
            .cloned()
            .collect();
        steps.sort_by_key(|s| s.step_order());
        Ok(steps)
    }

    async fn find_step_by_id(
        &self,
        step_id: &WorkflowStepId,
    ) -> Result<Option<WorkflowStep>, InfraError> {
        Ok(self
            .steps
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id() == step_id)
            .cloned())
    }

    async fn find_first_step(
        &self,
        workflow_id: &WorkflowId,
    ) -> Result<Option<WorkflowStep>, InfraError> {
        Ok(self
            .find_steps(workflow_id)
            .await?
            .into_iter()
            .next())
    }

    async fn find_next_step(
        &self,
        workflow_id: &WorkflowId,
        after: StepOrder,
    ) -> Result<Option<WorkflowStep>, InfraError> {
        Ok(self
            .find_steps(workflow_id)
            .await?
            .into_iter()
            .find(|s| s.step_order() > after))
    }
}

// ===== MockApprovalRepository =====

#[derive(Clone, Default)]
pub struct MockApprovalRepository {
    approvals: Arc<Mutex<Vec<Approval>>>,
}

impl MockApprovalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_approval(&self, approval: Approval) {
        self.approvals.lock().unwrap().push(approval);
    }
}

#[async_trait]
impl ApprovalRepository for MockApprovalRepository {
    async fn insert(&self, _tx: &mut TxContext, approval: &Approval) -> Result<(), InfraError> {
        self.approvals.lock().unwrap().push(approval.clone());
        Ok(())
    }

    async fn update_with_version_check(
        &self,
        _tx: &mut TxContext,
        approval: &Approval,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        let mut approvals = self.approvals.lock().unwrap();
        let Some(pos) = approvals.iter().position(|a| a.id() == approval.id()) else {
            return Ok(());
        };
        if approvals[pos].version() != expected_version {
            return Err(InfraError::conflict(
                "Approval",
                approval.id().as_uuid().to_string(),
            ));
        }
        approvals[pos] = approval.clone();
        Ok(())
    }

    async fn find_pending_for(
        &self,
        request_id: &RequestId,
        step_id: &WorkflowStepId,
        approver_id: &UserId,
    ) -> Result<Option<Approval>, InfraError> {
        Ok(self
            .approvals
            .lock()
            .unwrap()
            .iter()
            .find(|a| {
                a.request_id() == request_id
                    && a.step_id() == step_id
                    && a.approver_id() == approver_id
                    && a.status() == shinseiflow_domain::request::ApprovalStatus::Pending
            })
            .cloned())
    }

    async fn find_by_request(&self, request_id: &RequestId) -> Result<Vec<Approval>, InfraError> {
        Ok(self
            .approvals
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.request_id() == request_id)
            .cloned()
            .collect())
    }

    async fn find_pending_by_step(
        &self,
        request_id: &RequestId,
        step_id: &WorkflowStepId,
    ) -> Result<Vec<Approval>, InfraError> {
        Ok(self
            .approvals
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                a.request_id() == request_id
                    && a.step_id() == step_id
                    && a.status() == shinseiflow_domain::request::ApprovalStatus::Pending
            })
            .cloned()
            .collect())
    }

    async fn find_pending_by_approver(
        &self,
        approver_id: &UserId,
    ) -> Result<Vec<Approval>, InfraError> {
        Ok(self
            .approvals
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                a.approver_id() == approver_id
                    && a.status() == shinseiflow_domain::request::ApprovalStatus::Pending
            })
            .cloned()
            .collect())
    }
}

// ===== MockRequestTypeRepository =====

#[derive(Clone, Default)]
pub struct MockRequestTypeRepository {
    request_types: Arc<Mutex<Vec<RequestType>>>,
}

impl MockRequestTypeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_request_type(&self, request_type: RequestType) {
        self.request_types.lock().unwrap().push(request_type);
    }
}

#[async_trait]
impl RequestTypeRepository for MockRequestTypeRepository {
    async fn find_by_id(&self, id: &RequestTypeId) -> Result<Option<RequestType>, InfraError> {
        Ok(self
            .request_types
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id() == id)
            .cloned())
    }
}

// ===== MockUserRepository =====

#[derive(Clone, Default)]
pub struct MockUserRepository {
    users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id() == id)
            .cloned())
    }
}

// ===== MockRoleRepository =====

#[derive(Clone, Default)]
pub struct MockRoleRepository {
    assignments: Arc<Mutex<Vec<(RoleId, UserId)>>>,
}

impl MockRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// ユーザーにロールを割り当てる
    pub fn assign(&self, role_id: RoleId, user_id: UserId) {
        self.assignments.lock().unwrap().push((role_id, user_id));
    }
}

#[async_trait]
impl RoleRepository for MockRoleRepository {
    async fn find_member_ids(&self, role_id: &RoleId) -> Result<Vec<UserId>, InfraError> {
        Ok(self
            .assignments
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == role_id)
            .map(|(_, u)| u.clone())
            .collect())
    }
}

// ===== MockNotificationRepository =====

#[derive(Clone, Default)]
pub struct MockNotificationRepository {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl MockNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 作成された通知の総数（テストのアサーション用）
    pub fn count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationRepository for MockNotificationRepository {
    async fn insert(
        &self,
        _tx: &mut TxContext,
        notification: &Notification,
    ) -> Result<(), InfraError> {
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Notification>, InfraError> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id() == user_id)
            .cloned()
            .collect())
    }
}
