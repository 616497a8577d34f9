//! ステップの承認・却下
//!
//! 承認フローの遷移はここが唯一の実装。判断ステップは承認で次へ進み、
//! 却下で申請全体が却下される。意見ステップは判断結果にかかわらず次へ進む。
//! 一連の書き込み（承認レコード更新 → 次ステップの承認レコード作成 →
//! 申請更新）は単一トランザクションでコミットされる。

use chrono::{DateTime, Utc};
use shinseiflow_domain::{
    notification::NotificationEventType,
    request::{
        Approval,
        ApprovalId,
        NewApproval,
        Request,
        RequestId,
        StepType,
        WorkflowStep,
        WorkflowStepId,
    },
    user::UserId,
    value_objects::Version,
};
use shinseiflow_shared::{event_log::event, log_business_event};

use crate::{
    error::CoreError,
    usecase::{
        helpers::FindResultExt,
        request::{ApproveInput, RejectInput, RequestUseCaseImpl, RequestWithApprovals},
    },
};

/// ステップ判断後の申請の行き先
enum DecisionOutcome {
    /// 次のステップへ進んだ（新しい承認者の一覧付き）
    Advanced {
        next_step:    WorkflowStep,
        approver_ids: Vec<UserId>,
    },
    /// 最終ステップを通過し、承認完了した
    Approved,
    /// 却下により終了した
    Rejected,
}

impl RequestUseCaseImpl {
    /// ワークフローステップを承認する
    ///
    /// ## 処理フロー
    ///
    /// 1. 申請を取得し、対象ステップが現在のステップであることを確認
    /// 2. 操作ユーザー自身の承認待ちレコードを取得
    ///    （見つからない = 担当者でない、または判断済み）
    /// 3. 承認レコードを承認済みに遷移
    /// 4. 次ステップ（step_order がより大きい最初のもの）を判定:
    ///    - あり → 申請を次ステップへ進め、新しい承認者の承認レコードを作成
    ///    - なし → 申請を Approved に遷移（ステップポインタは最終ステップの
    ///      まま凍結）
    /// 5. 全書き込みを単一トランザクションでコミット
    /// 6. 関係者へ通知（fire-and-forget）
    pub async fn approve_step(
        &self,
        request_id: RequestId,
        step_id: WorkflowStepId,
        acting_user: UserId,
        input: ApproveInput,
    ) -> Result<RequestWithApprovals, CoreError> {
        let (request, approval, step) =
            self.load_decision_target(&request_id, &step_id, &acting_user).await?;

        let now = self.deps.clock.now();
        let approval_expected = approval.version();
        let approved = approval
            .approved(input.comment, now)
            .map_err(|e| CoreError::BadRequest(e.to_string()))?;

        let request_expected = request.version();
        let (updated_request, outcome) = self.plan_advancement(request, &step, now).await?;

        self.persist_decision(&approved, approval_expected, &updated_request, request_expected, &outcome, now)
            .await?;

        self.notify_outcome(&updated_request, &outcome).await;

        log_business_event!(
            event.category = event::category::REQUEST,
            event.action = event::action::STEP_APPROVED,
            event.entity_type = event::entity_type::APPROVAL,
            event.entity_id = %approved.id(),
            event.actor_id = %acting_user,
            event.result = event::result::SUCCESS,
            "ステップ承認"
        );

        let approvals = self.fetch_request_approvals(&request_id).await?;

        Ok(RequestWithApprovals {
            request: updated_request,
            approvals,
        })
    }

    /// ワークフローステップを却下する
    ///
    /// コメントは必須（空白のみは不可）。判断ステップの却下は申請全体を
    /// Rejected にする。意見ステップの却下は記録されるが、フローは承認時と
    /// 同様に次へ進む。
    pub async fn reject_step(
        &self,
        request_id: RequestId,
        step_id: WorkflowStepId,
        acting_user: UserId,
        input: RejectInput,
    ) -> Result<RequestWithApprovals, CoreError> {
        let (request, approval, step) =
            self.load_decision_target(&request_id, &step_id, &acting_user).await?;

        let now = self.deps.clock.now();
        let approval_expected = approval.version();
        // コメント必須チェックはドメイン層で行われる。失敗時は何も書き込まない
        let rejected = approval
            .rejected(input.comment, now)
            .map_err(|e| CoreError::BadRequest(e.to_string()))?;

        let request_expected = request.version();
        let (updated_request, outcome) = match step.step_type() {
            StepType::Decision => {
                let updated = request
                    .completed_with_rejection(now)
                    .map_err(|e| CoreError::BadRequest(e.to_string()))?;
                (updated, DecisionOutcome::Rejected)
            }
            // 意見ステップは結果にかかわらず次へ進む
            StepType::Opinion => self.plan_advancement(request, &step, now).await?,
        };

        self.persist_decision(&rejected, approval_expected, &updated_request, request_expected, &outcome, now)
            .await?;

        self.notify_outcome(&updated_request, &outcome).await;

        log_business_event!(
            event.category = event::category::REQUEST,
            event.action = event::action::STEP_REJECTED,
            event.entity_type = event::entity_type::APPROVAL,
            event.entity_id = %rejected.id(),
            event.actor_id = %acting_user,
            event.result = event::result::SUCCESS,
            "ステップ却下"
        );

        let approvals = self.fetch_request_approvals(&request_id).await?;

        Ok(RequestWithApprovals {
            request: updated_request,
            approvals,
        })
    }

    /// 承認・却下対象の申請・承認レコード・ステップ定義を取得する
    ///
    /// 対象ステップが申請の現在ステップでない場合はエラー
    /// （過去ステップに残った承認待ちレコードでフローを動かせないようにする）。
    async fn load_decision_target(
        &self,
        request_id: &RequestId,
        step_id: &WorkflowStepId,
        acting_user: &UserId,
    ) -> Result<(Request, Approval, WorkflowStep), CoreError> {
        let request = self
            .deps
            .request_repo
            .find_by_id(request_id)
            .await
            .or_not_found("申請")?;

        if request.active_step_id() != Some(step_id) {
            return Err(CoreError::BadRequest(
                "このステップは現在処理中のステップではありません".to_string(),
            ));
        }

        let approval = self
            .deps
            .approval_repo
            .find_pending_for(request_id, step_id, acting_user)
            .await
            .or_not_found("承認レコード")?;

        let step = self
            .deps
            .workflow_repo
            .find_step_by_id(step_id)
            .await
            .or_not_found("ステップ")?;

        Ok((request, approval, step))
    }

    /// 現在ステップ通過後の申請の行き先を決める
    ///
    /// 次ステップがあれば申請をそこへ進め、新しい承認者を解決する。
    /// なければ承認完了に遷移させる。
    async fn plan_advancement(
        &self,
        request: Request,
        current_step: &WorkflowStep,
        now: DateTime<Utc>,
    ) -> Result<(Request, DecisionOutcome), CoreError> {
        let workflow_id = request.workflow_id().cloned().ok_or_else(|| {
            CoreError::Internal(
                "アクティブなステップを持つ申請にワークフローがありません".to_string(),
            )
        })?;

        let next_step = self
            .deps
            .workflow_repo
            .find_next_step(&workflow_id, current_step.step_order())
            .await
            .map_err(|e| CoreError::Internal(format!("次ステップの取得に失敗: {}", e)))?;

        match next_step {
            Some(next_step) => {
                let approver_ids = self.resolve_approvers(&next_step).await?;
                let updated = request
                    .advanced_to(next_step.id().clone(), now)
                    .map_err(|e| CoreError::BadRequest(e.to_string()))?;
                Ok((updated, DecisionOutcome::Advanced {
                    next_step,
                    approver_ids,
                }))
            }
            None => {
                let updated = request
                    .completed_with_approval(now)
                    .map_err(|e| CoreError::BadRequest(e.to_string()))?;
                Ok((updated, DecisionOutcome::Approved))
            }
        }
    }

    /// 判断結果の一連の書き込みを単一トランザクションで実行する
    async fn persist_decision(
        &self,
        decided_approval: &Approval,
        approval_expected: Version,
        updated_request: &Request,
        request_expected: Version,
        outcome: &DecisionOutcome,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let new_approvals: Vec<Approval> = match outcome {
            DecisionOutcome::Advanced {
                next_step,
                approver_ids,
            } => approver_ids
                .iter()
                .map(|approver_id| {
                    Approval::new(NewApproval {
                        id: ApprovalId::new(),
                        request_id: updated_request.id().clone(),
                        step_id: next_step.id().clone(),
                        approver_id: approver_id.clone(),
                        now,
                    })
                })
                .collect(),
            DecisionOutcome::Approved | DecisionOutcome::Rejected => Vec::new(),
        };

        let mut tx = self.begin_tx().await?;
        self.save_approval(&mut tx, decided_approval, approval_expected)
            .await?;
        for approval in &new_approvals {
            self.insert_approval(&mut tx, approval).await?;
        }
        self.save_request(&mut tx, updated_request, request_expected)
            .await?;
        self.commit_tx(tx).await?;

        Ok(())
    }

    /// 判断結果に応じた通知を作成する（fire-and-forget）
    async fn notify_outcome(&self, request: &Request, outcome: &DecisionOutcome) {
        let notifications = match outcome {
            DecisionOutcome::Advanced {
                next_step,
                approver_ids,
            } => {
                let mut notifications: Vec<_> = approver_ids
                    .iter()
                    .map(|approver_id| {
                        self.build_notification(
                            approver_id.clone(),
                            NotificationEventType::ApprovalRequested,
                            "承認依頼",
                            format!(
                                "「{}」の承認をお願いします（{}）",
                                request.title(),
                                next_step.step_name()
                            ),
                            request.id(),
                        )
                    })
                    .collect();
                notifications.push(self.build_notification(
                    request.requester_id().clone(),
                    NotificationEventType::StepApproved,
                    "ステップ承認",
                    format!("「{}」が次のステップへ進みました", request.title()),
                    request.id(),
                ));
                notifications
            }
            DecisionOutcome::Approved => vec![self.build_notification(
                request.requester_id().clone(),
                NotificationEventType::RequestApproved,
                "承認完了",
                format!("「{}」が承認されました", request.title()),
                request.id(),
            )],
            DecisionOutcome::Rejected => vec![self.build_notification(
                request.requester_id().clone(),
                NotificationEventType::RequestRejected,
                "却下",
                format!("「{}」が却下されました", request.title()),
                request.id(),
            )],
        };

        self.create_notifications(notifications).await;
    }
}
