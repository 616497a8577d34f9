//! 承認者の解決
//!
//! ステップの担当者指定（ユーザー / ロール / 部署）を具体的なユーザー ID 列に
//! 展開する。

use itertools::Itertools;
use shinseiflow_domain::{request::{ApproverSpec, WorkflowStep}, user::UserId};

use super::RequestUseCaseImpl;
use crate::error::CoreError;

impl RequestUseCaseImpl {
    /// ステップの担当者指定を承認者のユーザー ID 列に展開する
    ///
    /// - `User`: そのユーザー 1 名
    /// - `Role`: 解決時点のロール保持者全員（スナップショット）。
    ///   該当者が 0 人の場合は空の Vec を返し、呼び出し側は承認レコードを
    ///   作成しない（申請はそのステップに留まる）
    /// - `Department`: 解決パスが存在しないため明示的にエラー
    ///
    /// 重複する ID は順序を保って除去される。
    pub(super) async fn resolve_approvers(
        &self,
        step: &WorkflowStep,
    ) -> Result<Vec<UserId>, CoreError> {
        match step.approver() {
            ApproverSpec::User(user_id) => Ok(vec![user_id.clone()]),
            ApproverSpec::Role(role_id) => {
                let members = self
                    .deps
                    .role_repo
                    .find_member_ids(role_id)
                    .await
                    .map_err(|e| {
                        CoreError::Internal(format!("ロールメンバーの取得に失敗: {}", e))
                    })?;
                Ok(members.into_iter().unique().collect())
            }
            ApproverSpec::Department(department_id) => Err(CoreError::BadRequest(format!(
                "部署指定の承認ステップは未対応です（department_id: {}）",
                department_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use shinseiflow_domain::{
        request::{NewWorkflowStep, StepType, WorkflowId, WorkflowStepId},
        role::{DepartmentId, RoleId},
        value_objects::StepOrder,
    };

    use super::super::command::test_helpers::{TestWorld, build_sut};
    use super::*;

    fn step_with_approver(approver: ApproverSpec) -> WorkflowStep {
        WorkflowStep::new(NewWorkflowStep {
            id: WorkflowStepId::new(),
            workflow_id: WorkflowId::new(),
            step_order: StepOrder::new(1).unwrap(),
            step_name: "承認".to_string(),
            step_type: StepType::Decision,
            approver,
            is_required: true,
            now: chrono::Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_ユーザー指定は単一要素のリストを返す() {
        let world = TestWorld::new();
        let sut = build_sut(&world);
        let user_id = UserId::new();
        let step = step_with_approver(ApproverSpec::User(user_id.clone()));

        let result = sut.resolve_approvers(&step).await.unwrap();

        assert_eq!(result, vec![user_id]);
    }

    #[tokio::test]
    async fn test_ロール指定は保持者全員を返す() {
        let world = TestWorld::new();
        let role_id = RoleId::new();
        let member1 = UserId::new();
        let member2 = UserId::new();
        world.role_repo.assign(role_id.clone(), member1.clone());
        world.role_repo.assign(role_id.clone(), member2.clone());
        let sut = build_sut(&world);
        let step = step_with_approver(ApproverSpec::Role(role_id));

        let result = sut.resolve_approvers(&step).await.unwrap();

        assert_eq!(result, vec![member1, member2]);
    }

    #[tokio::test]
    async fn test_ロール指定で保持者ゼロなら空リスト() {
        let world = TestWorld::new();
        let sut = build_sut(&world);
        let step = step_with_approver(ApproverSpec::Role(RoleId::new()));

        let result = sut.resolve_approvers(&step).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_重複するメンバーは除去される() {
        let world = TestWorld::new();
        let role_id = RoleId::new();
        let member = UserId::new();
        world.role_repo.assign(role_id.clone(), member.clone());
        world.role_repo.assign(role_id.clone(), member.clone());
        let sut = build_sut(&world);
        let step = step_with_approver(ApproverSpec::Role(role_id));

        let result = sut.resolve_approvers(&step).await.unwrap();

        assert_eq!(result, vec![member]);
    }

    #[tokio::test]
    async fn test_部署指定はエラー() {
        let world = TestWorld::new();
        let sut = build_sut(&world);
        let step = step_with_approver(ApproverSpec::Department(DepartmentId::new()));

        let result = sut.resolve_approvers(&step).await;

        assert!(matches!(result, Err(CoreError::BadRequest(_))));
    }
}
