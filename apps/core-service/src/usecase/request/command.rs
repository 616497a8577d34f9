//! 申請ユースケースの状態変更操作

mod cancel;
mod create;
mod decision;
mod helpers;

#[cfg(test)]
pub(super) mod test_helpers {
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use serde_json::json;
    use shinseiflow_domain::{
        clock::FixedClock,
        request::{
            ApproverSpec,
            FormSchema,
            NewRequestType,
            NewWorkflowStep,
            RequestType,
            RequestTypeId,
            StepType,
            Workflow,
            WorkflowId,
            WorkflowStep,
            WorkflowStepId,
        },
        role::RoleId,
        user::UserId,
        value_objects::{StepOrder, WorkflowName},
    };
    use shinseiflow_infra::mock::{
        MockApprovalRepository,
        MockNotificationRepository,
        MockRequestRepository,
        MockRequestTypeRepository,
        MockRoleRepository,
        MockTransactionManager,
        MockWorkflowRepository,
    };

    use crate::usecase::request::{RequestUseCaseDeps, RequestUseCaseImpl};

    /// テストで使用するモックリポジトリ一式
    ///
    /// SUT 構築後もモックへの参照を保持し、シナリオの準備とアサーションに使う。
    pub struct TestWorld {
        pub request_repo:      MockRequestRepository,
        pub request_type_repo: MockRequestTypeRepository,
        pub workflow_repo:     MockWorkflowRepository,
        pub approval_repo:     MockApprovalRepository,
        pub role_repo:         MockRoleRepository,
        pub notification_repo: MockNotificationRepository,
        pub now:               DateTime<Utc>,
    }

    impl TestWorld {
        pub fn new() -> Self {
            Self {
                request_repo:      MockRequestRepository::new(),
                request_type_repo: MockRequestTypeRepository::new(),
                workflow_repo:     MockWorkflowRepository::new(),
                approval_repo:     MockApprovalRepository::new(),
                role_repo:         MockRoleRepository::new(),
                notification_repo: MockNotificationRepository::new(),
                now:               DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            }
        }
    }

    /// SUT（RequestUseCaseImpl）を構築する
    ///
    /// Mock repos は参照で受け取り、内部で clone する（共有ステートが保持される）。
    pub fn build_sut(world: &TestWorld) -> RequestUseCaseImpl {
        RequestUseCaseImpl::new(RequestUseCaseDeps {
            request_repo:      Arc::new(world.request_repo.clone()),
            request_type_repo: Arc::new(world.request_type_repo.clone()),
            workflow_repo:     Arc::new(world.workflow_repo.clone()),
            approval_repo:     Arc::new(world.approval_repo.clone()),
            role_repo:         Arc::new(world.role_repo.clone()),
            notification_repo: Arc::new(world.notification_repo.clone()),
            clock:             Arc::new(FixedClock::new(world.now)),
            tx_manager:        Arc::new(MockTransactionManager),
        })
    }

    /// 必須テキストフィールド 1 つの簡易スキーマ
    pub fn simple_schema() -> FormSchema {
        FormSchema::from_json(&json!({
            "fields": [
                {"name": "reason", "label": "理由", "type": "text", "required": true}
            ]
        }))
        .unwrap()
    }

    /// 簡易スキーマを満たすフォームデータ
    pub fn simple_form_data() -> serde_json::Value {
        json!({"reason": "私用のため"})
    }

    /// 申請種別を登録する
    pub fn add_request_type(world: &TestWorld, workflow_id: Option<WorkflowId>) -> RequestType {
        let request_type = RequestType::new(NewRequestType {
            id: RequestTypeId::new(),
            name: "休暇申請".to_string(),
            default_workflow_id: workflow_id,
            form_schema: simple_schema(),
            now: world.now,
        });
        world.request_type_repo.add_request_type(request_type.clone());
        request_type
    }

    /// ワークフローとステップ列を登録する
    ///
    /// `specs` の並び順が step_order（1 始まり）になる。
    pub fn add_workflow(
        world: &TestWorld,
        specs: Vec<(StepType, ApproverSpec)>,
    ) -> (Workflow, Vec<WorkflowStep>) {
        let workflow = Workflow::new(
            WorkflowId::new(),
            WorkflowName::new("承認フロー").unwrap(),
            world.now,
        );
        world.workflow_repo.add_workflow(workflow.clone());

        let steps: Vec<WorkflowStep> = specs
            .into_iter()
            .enumerate()
            .map(|(index, (step_type, approver))| {
                let step = WorkflowStep::new(NewWorkflowStep {
                    id: WorkflowStepId::new(),
                    workflow_id: workflow.id().clone(),
                    step_order: StepOrder::new(index as i32 + 1).unwrap(),
                    step_name: format!("ステップ{}", index + 1),
                    step_type,
                    approver,
                    is_required: true,
                    now: world.now,
                });
                world.workflow_repo.add_step(step.clone());
                step
            })
            .collect();

        (workflow, steps)
    }

    /// 担当者 1 名の判断ステップ
    pub fn decision_step_for(user_id: &UserId) -> (StepType, ApproverSpec) {
        (StepType::Decision, ApproverSpec::User(user_id.clone()))
    }

    /// ロール指定の判断ステップ
    pub fn decision_step_for_role(role_id: &RoleId) -> (StepType, ApproverSpec) {
        (StepType::Decision, ApproverSpec::Role(role_id.clone()))
    }
}
