//! 申請の作成
//!
//! フォームバリデーション → ワークフロー解決 → 申請 + 初回承認レコードの
//! 作成を単一トランザクションで行う。

use shinseiflow_domain::{
    notification::NotificationEventType,
    request::{Approval, ApprovalId, NewApproval, NewRequest, Request, RequestId, validate_form},
    user::UserId,
    value_objects::RequestTitle,
};
use shinseiflow_shared::{event_log::event, log_business_event};

use crate::{
    error::CoreError,
    usecase::{
        helpers::FindResultExt,
        request::{CreateRequestInput, RequestUseCaseImpl, RequestWithApprovals},
    },
};

impl RequestUseCaseImpl {
    /// 申請を作成する
    ///
    /// ## 処理フロー
    ///
    /// 1. 申請種別を取得し、フォームデータをスキーマで検証
    ///    （全エラーを集約して返す）
    /// 2. 申請種別の既定ワークフローを解決。未設定なら承認ステップなしで作成
    /// 3. ワークフローがあれば最初のステップ（step_order 最小）を現在ステップに
    /// 4. ステータスは Pending 固定で申請を作成
    /// 5. 最初のステップの承認者を解決し、承認待ちレコードを作成
    ///    （申請と同一トランザクション）
    /// 6. 承認者へ承認依頼通知を作成（fire-and-forget）
    ///
    /// ## エラー
    ///
    /// - `BadRequest`: フォームバリデーション失敗（集約メッセージ）、
    ///   件名不正、部署指定ステップ
    /// - `NotFound`: 申請種別が存在しない
    pub async fn create_request(
        &self,
        input: CreateRequestInput,
        requester_id: UserId,
    ) -> Result<RequestWithApprovals, CoreError> {
        // 1. 申請種別の取得とフォームバリデーション
        let request_type = self
            .deps
            .request_type_repo
            .find_by_id(&input.request_type_id)
            .await
            .or_not_found("申請種別")?;

        let validation = validate_form(&input.form_data, request_type.form_schema());
        if !validation.valid {
            return Err(CoreError::BadRequest(validation.joined_messages()));
        }

        let title = RequestTitle::new(input.title)
            .map_err(|e| CoreError::BadRequest(e.to_string()))?;

        // 2-3. ワークフローと最初のステップを解決
        let workflow_id = request_type.default_workflow_id().cloned();
        let first_step = match &workflow_id {
            Some(workflow_id) => match self.deps.workflow_repo.find_first_step(workflow_id).await {
                Ok(step) => step,
                // ステップ取得の失敗は申請作成を妨げない。
                // ステップなしで作成し、ログに残す
                Err(e) => {
                    tracing::warn!(
                        %workflow_id,
                        "最初のステップの取得に失敗したため、ステップなしで作成します: {}",
                        e
                    );
                    None
                }
            },
            None => None,
        };

        // 4. 申請を作成（ステータスは Pending 固定）
        let now = self.deps.clock.now();
        let request = Request::new(NewRequest {
            id: RequestId::new(),
            request_type_id: input.request_type_id,
            workflow_id,
            first_step_id: first_step.as_ref().map(|s| s.id().clone()),
            title,
            form_data: input.form_data,
            priority: input.priority,
            due_date: input.due_date,
            requester_id,
            now,
        });

        // 5. 承認者を解決し、申請 + 承認レコードを単一トランザクションで保存
        let approver_ids = match &first_step {
            Some(step) => self.resolve_approvers(step).await?,
            None => Vec::new(),
        };

        let approvals: Vec<Approval> = match &first_step {
            Some(step) => approver_ids
                .iter()
                .map(|approver_id| {
                    Approval::new(NewApproval {
                        id: ApprovalId::new(),
                        request_id: request.id().clone(),
                        step_id: step.id().clone(),
                        approver_id: approver_id.clone(),
                        now,
                    })
                })
                .collect(),
            None => Vec::new(),
        };

        let mut tx = self.begin_tx().await?;
        self.deps
            .request_repo
            .insert(&mut tx, &request)
            .await
            .map_err(|e| CoreError::Internal(format!("申請の保存に失敗: {}", e)))?;
        for approval in &approvals {
            self.insert_approval(&mut tx, approval).await?;
        }
        self.commit_tx(tx).await?;

        // 6. 承認依頼通知（fire-and-forget）
        if let Some(step) = &first_step {
            let notifications = approver_ids
                .iter()
                .map(|approver_id| {
                    self.build_notification(
                        approver_id.clone(),
                        NotificationEventType::ApprovalRequested,
                        "承認依頼",
                        format!(
                            "「{}」の承認をお願いします（{}）",
                            request.title(),
                            step.step_name()
                        ),
                        request.id(),
                    )
                })
                .collect();
            self.create_notifications(notifications).await;
        }

        log_business_event!(
            event.category = event::category::REQUEST,
            event.action = event::action::REQUEST_CREATED,
            event.entity_type = event::entity_type::REQUEST,
            event.entity_id = %request.id(),
            event.actor_id = %request.requester_id(),
            event.result = event::result::SUCCESS,
            "申請作成"
        );

        Ok(RequestWithApprovals {
            request,
            approvals,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use shinseiflow_domain::{
        request::{ApprovalStatus, RequestStatus, RequestTypeId},
        role::RoleId,
        user::UserId,
        value_objects::Priority,
    };

    use shinseiflow_infra::repository::{NotificationRepository, RequestRepository};

    use super::super::test_helpers::{
        TestWorld,
        add_request_type,
        add_workflow,
        build_sut,
        decision_step_for,
        decision_step_for_role,
        simple_form_data,
    };
    use crate::{
        error::CoreError,
        usecase::request::CreateRequestInput,
    };

    fn create_input(request_type_id: RequestTypeId) -> CreateRequestInput {
        CreateRequestInput {
            request_type_id,
            title: "夏季休暇".to_string(),
            form_data: simple_form_data(),
            priority: Priority::Medium,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_ワークフローなしの申請種別はステップなしで作成される() {
        // Arrange
        let world = TestWorld::new();
        let request_type = add_request_type(&world, None);
        let sut = build_sut(&world);

        // Act
        let result = sut
            .create_request(create_input(request_type.id().clone()), UserId::new())
            .await
            .unwrap();

        // Assert: Pending + ステップなし + 承認レコードゼロ
        assert_eq!(result.request.status(), RequestStatus::Pending);
        assert_eq!(result.request.current_step_id(), None);
        assert!(result.approvals.is_empty());
    }

    #[tokio::test]
    async fn test_ステータスはpendingで固定される() {
        let world = TestWorld::new();
        let approver = UserId::new();
        let (workflow, _steps) = add_workflow(&world, vec![decision_step_for(&approver)]);
        let request_type = add_request_type(&world, Some(workflow.id().clone()));
        let sut = build_sut(&world);

        let result = sut
            .create_request(create_input(request_type.id().clone()), UserId::new())
            .await
            .unwrap();

        assert_eq!(result.request.status(), RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_最初のステップの承認レコードが作成される() {
        // Arrange
        let world = TestWorld::new();
        let approver = UserId::new();
        let (workflow, steps) = add_workflow(&world, vec![decision_step_for(&approver)]);
        let request_type = add_request_type(&world, Some(workflow.id().clone()));
        let sut = build_sut(&world);

        // Act
        let result = sut
            .create_request(create_input(request_type.id().clone()), UserId::new())
            .await
            .unwrap();

        // Assert
        assert_eq!(result.request.current_step_id(), Some(steps[0].id()));
        assert_eq!(result.approvals.len(), 1);
        assert_eq!(result.approvals[0].approver_id(), &approver);
        assert_eq!(result.approvals[0].status(), ApprovalStatus::Pending);
    }

    #[tokio::test]
    async fn test_承認者へ承認依頼通知が作成される() {
        let world = TestWorld::new();
        let approver = UserId::new();
        let (workflow, _steps) = add_workflow(&world, vec![decision_step_for(&approver)]);
        let request_type = add_request_type(&world, Some(workflow.id().clone()));
        let sut = build_sut(&world);

        sut.create_request(create_input(request_type.id().clone()), UserId::new())
            .await
            .unwrap();

        let notifications = world.notification_repo.find_by_user(&approver).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].body().contains("夏季休暇"));
    }

    #[tokio::test]
    async fn test_ロール保持者ゼロのステップは承認レコードなしで作成される() {
        // Arrange: ロールにメンバーを割り当てない
        let world = TestWorld::new();
        let role_id = RoleId::new();
        let (workflow, steps) = add_workflow(&world, vec![decision_step_for_role(&role_id)]);
        let request_type = add_request_type(&world, Some(workflow.id().clone()));
        let sut = build_sut(&world);

        // Act
        let result = sut
            .create_request(create_input(request_type.id().clone()), UserId::new())
            .await
            .unwrap();

        // Assert: 申請はステップに留まり、誰も承認できない（既知の挙動）
        assert_eq!(result.request.status(), RequestStatus::Pending);
        assert_eq!(result.request.current_step_id(), Some(steps[0].id()));
        assert!(result.approvals.is_empty());
    }

    #[tokio::test]
    async fn test_フォームバリデーション失敗で作成されない() {
        // Arrange: 必須フィールド reason を欠落させる
        let world = TestWorld::new();
        let request_type = add_request_type(&world, None);
        let sut = build_sut(&world);
        let requester = UserId::new();

        let input = CreateRequestInput {
            form_data: json!({}),
            ..create_input(request_type.id().clone())
        };

        // Act
        let result = sut.create_request(input, requester.clone()).await;

        // Assert: 集約メッセージの BadRequest + 何も書き込まれない
        match result {
            Err(CoreError::BadRequest(msg)) => assert!(msg.contains("理由")),
            other => panic!("BadRequest を期待したが {:?} を受信", other),
        }
        let stored = world.request_repo.find_by_requester(&requester).await.unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_存在しない申請種別はnot_found() {
        let world = TestWorld::new();
        let sut = build_sut(&world);

        let result = sut
            .create_request(create_input(RequestTypeId::new()), UserId::new())
            .await;

        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }
}
