//! 申請ユースケースの参照系操作

use shinseiflow_domain::{
    request::{Request, RequestId},
    user::UserId,
};

use super::{PendingApprovalItem, RequestUseCaseImpl, RequestWithApprovals};
use crate::{error::CoreError, usecase::helpers::FindResultExt};

impl RequestUseCaseImpl {
    /// 申請を承認レコード付きで取得する
    pub async fn get_request(
        &self,
        request_id: RequestId,
    ) -> Result<RequestWithApprovals, CoreError> {
        let request = self
            .deps
            .request_repo
            .find_by_id(&request_id)
            .await
            .or_not_found("申請")?;

        let approvals = self
            .deps
            .approval_repo
            .find_by_request(&request_id)
            .await
            .map_err(|e| CoreError::Internal(format!("承認レコードの取得に失敗: {}", e)))?;

        Ok(RequestWithApprovals { request, approvals })
    }

    /// 申請者の申請一覧を取得する
    pub async fn list_requests_by_requester(
        &self,
        requester_id: UserId,
    ) -> Result<Vec<Request>, CoreError> {
        self.deps
            .request_repo
            .find_by_requester(&requester_id)
            .await
            .map_err(|e| CoreError::Internal(format!("申請の取得に失敗: {}", e)))
    }

    /// 指定ユーザーの承認待ち一覧（受信箱）を取得する
    ///
    /// 各承認レコードに申請の件名を付与して返す。
    pub async fn list_pending_approvals(
        &self,
        approver_id: UserId,
    ) -> Result<Vec<PendingApprovalItem>, CoreError> {
        let approvals = self
            .deps
            .approval_repo
            .find_pending_by_approver(&approver_id)
            .await
            .map_err(|e| CoreError::Internal(format!("承認レコードの取得に失敗: {}", e)))?;

        let mut items = Vec::with_capacity(approvals.len());
        for approval in approvals {
            let request = self
                .deps
                .request_repo
                .find_by_id(approval.request_id())
                .await
                .or_not_found("申請")?;
            items.push(PendingApprovalItem {
                request_title: request.title().as_str().to_string(),
                approval,
            });
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use shinseiflow_domain::{user::UserId, value_objects::Priority};

    use super::super::command::test_helpers::{
        TestWorld,
        add_request_type,
        add_workflow,
        build_sut,
        decision_step_for,
        simple_form_data,
    };
    use crate::{
        error::CoreError,
        usecase::request::CreateRequestInput,
    };

    #[tokio::test]
    async fn test_get_request_は承認レコード付きで返す() {
        let world = TestWorld::new();
        let requester = UserId::new();
        let approver = UserId::new();
        let (workflow, _steps) = add_workflow(&world, vec![decision_step_for(&approver)]);
        let request_type = add_request_type(&world, Some(workflow.id().clone()));
        let sut = build_sut(&world);

        let created = sut
            .create_request(
                CreateRequestInput {
                    request_type_id: request_type.id().clone(),
                    title: "備品申請".to_string(),
                    form_data: simple_form_data(),
                    priority: Priority::Medium,
                    due_date: None,
                },
                requester,
            )
            .await
            .unwrap();

        let result = sut.get_request(created.request.id().clone()).await.unwrap();

        assert_eq!(result.request, created.request);
        assert_eq!(result.approvals.len(), 1);
    }

    #[tokio::test]
    async fn test_get_request_存在しない申請はnot_found() {
        let world = TestWorld::new();
        let sut = build_sut(&world);

        let result = sut
            .get_request(shinseiflow_domain::request::RequestId::new())
            .await;

        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_承認待ち一覧に件名が付与される() {
        let world = TestWorld::new();
        let approver = UserId::new();
        let (workflow, _steps) = add_workflow(&world, vec![decision_step_for(&approver)]);
        let request_type = add_request_type(&world, Some(workflow.id().clone()));
        let sut = build_sut(&world);

        sut.create_request(
            CreateRequestInput {
                request_type_id: request_type.id().clone(),
                title: "備品申請".to_string(),
                form_data: simple_form_data(),
                priority: Priority::Medium,
                due_date: None,
            },
            UserId::new(),
        )
        .await
        .unwrap();

        let items = sut.list_pending_approvals(approver).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].request_title, "備品申請");
    }
}
