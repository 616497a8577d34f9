//! # リマインダーユースケース
//!
//! 外部スケジューラから定期的に呼び出され、期日が翌日に迫った未完了の申請を
//! 走査して、申請者と現在ステップの承認待ち担当者にリマインダー通知を書き込む。

use std::sync::Arc;

use chrono::Days;
use itertools::Itertools;
use shinseiflow_domain::{
    clock::Clock,
    notification::{NewNotification, Notification, NotificationEventType, NotificationId},
    user::UserId,
};
use shinseiflow_infra::{
    TransactionManager,
    repository::{ApprovalRepository, NotificationRepository, RequestRepository},
};
use shinseiflow_shared::{event_log::event, log_business_event};

use crate::error::CoreError;

/// リマインダーユースケースの依存コンポーネント
pub struct ReminderUseCaseDeps {
    pub request_repo:      Arc<dyn RequestRepository>,
    pub approval_repo:     Arc<dyn ApprovalRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub clock:             Arc<dyn Clock>,
    pub tx_manager:        Arc<dyn TransactionManager>,
}

/// リマインダーユースケース実装
pub struct ReminderUseCaseImpl {
    deps: ReminderUseCaseDeps,
}

impl ReminderUseCaseImpl {
    /// 新しいリマインダーユースケースを作成する
    pub fn new(deps: ReminderUseCaseDeps) -> Self {
        Self { deps }
    }

    /// 期日リマインダーを実行する
    ///
    /// 期日が翌日の pending / in_progress な申請を走査し、申請者と
    /// 現在ステップの承認待ち担当者に通知を書き込む。作成した通知の件数を返す。
    ///
    /// 呼び出しはべき等ではない（実行のたびに通知が作られる）。
    /// 実行間隔の制御は外部スケジューラの責務。
    pub async fn run_due_reminders(&self) -> Result<usize, CoreError> {
        let now = self.deps.clock.now();
        let tomorrow = now
            .date_naive()
            .checked_add_days(Days::new(1))
            .expect("日付の加算に失敗しました");

        let due_requests = self
            .deps
            .request_repo
            .find_due_on(tomorrow)
            .await
            .map_err(|e| CoreError::Internal(format!("申請の取得に失敗: {}", e)))?;

        let mut notifications = Vec::new();
        for request in &due_requests {
            // 申請者 + 現在ステップの承認待ち担当者に通知する
            let mut recipients = vec![request.requester_id().clone()];
            if let Some(step_id) = request.active_step_id() {
                let pending = self
                    .deps
                    .approval_repo
                    .find_pending_by_step(request.id(), step_id)
                    .await
                    .map_err(|e| {
                        CoreError::Internal(format!("承認レコードの取得に失敗: {}", e))
                    })?;
                recipients.extend(pending.iter().map(|a| a.approver_id().clone()));
            }

            let recipients: Vec<UserId> = recipients.into_iter().unique().collect();
            for user_id in recipients {
                notifications.push(Notification::new(NewNotification {
                    id: NotificationId::new(),
                    user_id,
                    event_type: NotificationEventType::DueReminder,
                    title: "期日リマインダー".to_string(),
                    body: format!("「{}」の期日が明日に迫っています", request.title()),
                    request_id: Some(request.id().clone()),
                    now,
                }));
            }
        }

        let count = notifications.len();
        if count > 0 {
            let mut tx = self
                .deps
                .tx_manager
                .begin()
                .await
                .map_err(|e| CoreError::Internal(format!("トランザクション開始に失敗: {}", e)))?;
            for notification in &notifications {
                self.deps
                    .notification_repo
                    .insert(&mut tx, notification)
                    .await
                    .map_err(|e| CoreError::Internal(format!("通知の作成に失敗: {}", e)))?;
            }
            tx.commit()
                .await
                .map_err(|e| CoreError::Internal(format!("トランザクションコミットに失敗: {}", e)))?;
        }

        log_business_event!(
            event.category = event::category::NOTIFICATION,
            event.action = event::action::REMINDERS_DISPATCHED,
            event.entity_type = event::entity_type::NOTIFICATION,
            event.result = event::result::SUCCESS,
            reminder.count = count,
            "期日リマインダー実行"
        );

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Days, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use shinseiflow_domain::{
        clock::FixedClock,
        request::{
            Approval,
            ApprovalId,
            NewApproval,
            NewRequest,
            Request,
            RequestId,
            RequestTypeId,
            WorkflowId,
            WorkflowStepId,
        },
        user::UserId,
        value_objects::{Priority, RequestTitle},
    };
    use shinseiflow_infra::mock::{
        MockApprovalRepository,
        MockNotificationRepository,
        MockRequestRepository,
        MockTransactionManager,
    };

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn build_sut(
        request_repo: &MockRequestRepository,
        approval_repo: &MockApprovalRepository,
        notification_repo: &MockNotificationRepository,
    ) -> ReminderUseCaseImpl {
        ReminderUseCaseImpl::new(ReminderUseCaseDeps {
            request_repo:      Arc::new(request_repo.clone()),
            approval_repo:     Arc::new(approval_repo.clone()),
            notification_repo: Arc::new(notification_repo.clone()),
            clock:             Arc::new(FixedClock::new(fixed_now())),
            tx_manager:        Arc::new(MockTransactionManager),
        })
    }

    /// 翌日が期日の申請（step_id があれば承認ステップ付き）を作る
    fn due_tomorrow_request(
        requester: &UserId,
        step_id: Option<WorkflowStepId>,
    ) -> Request {
        let tomorrow = fixed_now()
            .date_naive()
            .checked_add_days(Days::new(1))
            .unwrap();
        Request::new(NewRequest {
            id: RequestId::new(),
            request_type_id: RequestTypeId::new(),
            workflow_id: step_id.as_ref().map(|_| WorkflowId::new()),
            first_step_id: step_id,
            title: RequestTitle::new("期日あり申請").unwrap(),
            form_data: json!({}),
            priority: Priority::High,
            due_date: Some(tomorrow),
            requester_id: requester.clone(),
            now: fixed_now(),
        })
    }

    #[tokio::test]
    async fn test_期日翌日の申請の申請者と承認者に通知される() {
        // Arrange
        let request_repo = MockRequestRepository::new();
        let approval_repo = MockApprovalRepository::new();
        let notification_repo = MockNotificationRepository::new();

        let requester = UserId::new();
        let approver = UserId::new();
        let step_id = WorkflowStepId::new();
        let request = due_tomorrow_request(&requester, Some(step_id.clone()));
        request_repo.add_request(request.clone());
        approval_repo.add_approval(Approval::new(NewApproval {
            id: ApprovalId::new(),
            request_id: request.id().clone(),
            step_id,
            approver_id: approver.clone(),
            now: fixed_now(),
        }));

        let sut = build_sut(&request_repo, &approval_repo, &notification_repo);

        // Act
        let count = sut.run_due_reminders().await.unwrap();

        // Assert
        assert_eq!(count, 2);
        assert_eq!(
            notification_repo.find_by_user(&requester).await.unwrap().len(),
            1
        );
        assert_eq!(
            notification_repo.find_by_user(&approver).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_対象申請がなければ通知ゼロ() {
        let request_repo = MockRequestRepository::new();
        let approval_repo = MockApprovalRepository::new();
        let notification_repo = MockNotificationRepository::new();
        let sut = build_sut(&request_repo, &approval_repo, &notification_repo);

        let count = sut.run_due_reminders().await.unwrap();

        assert_eq!(count, 0);
        assert_eq!(notification_repo.count(), 0);
    }

    #[tokio::test]
    async fn test_申請者が承認者を兼ねる場合は重複通知しない() {
        let request_repo = MockRequestRepository::new();
        let approval_repo = MockApprovalRepository::new();
        let notification_repo = MockNotificationRepository::new();

        let requester = UserId::new();
        let step_id = WorkflowStepId::new();
        let request = due_tomorrow_request(&requester, Some(step_id.clone()));
        request_repo.add_request(request.clone());
        // 申請者自身が承認者
        approval_repo.add_approval(Approval::new(NewApproval {
            id: ApprovalId::new(),
            request_id: request.id().clone(),
            step_id,
            approver_id: requester.clone(),
            now: fixed_now(),
        }));

        let sut = build_sut(&request_repo, &approval_repo, &notification_repo);

        let count = sut.run_due_reminders().await.unwrap();

        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_ワークフローなし申請は申請者のみに通知される() {
        let request_repo = MockRequestRepository::new();
        let approval_repo = MockApprovalRepository::new();
        let notification_repo = MockNotificationRepository::new();

        let requester = UserId::new();
        request_repo.add_request(due_tomorrow_request(&requester, None));

        let sut = build_sut(&request_repo, &approval_repo, &notification_repo);

        let count = sut.run_due_reminders().await.unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            notification_repo.find_by_user(&requester).await.unwrap().len(),
            1
        );
    }
}
