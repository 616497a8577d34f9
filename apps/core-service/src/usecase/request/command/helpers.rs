//! 申請コマンド共通のヘルパー関数
//!
//! 永続化ボイラープレート（トランザクション操作、version check 付き更新）と
//! 通知作成を共通化する。

use shinseiflow_domain::{
    notification::{NewNotification, Notification, NotificationEventType, NotificationId},
    request::{Approval, Request, RequestId},
    user::UserId,
    value_objects::Version,
};
use shinseiflow_infra::{InfraErrorKind, TxContext};

use super::super::RequestUseCaseImpl;
use crate::error::CoreError;

impl RequestUseCaseImpl {
    /// トランザクションを開始する
    pub(super) async fn begin_tx(&self) -> Result<TxContext, CoreError> {
        self.deps
            .tx_manager
            .begin()
            .await
            .map_err(|e| CoreError::Internal(format!("トランザクション開始に失敗: {}", e)))
    }

    /// トランザクションをコミットする
    pub(super) async fn commit_tx(&self, tx: TxContext) -> Result<(), CoreError> {
        tx.commit()
            .await
            .map_err(|e| CoreError::Internal(format!("トランザクションコミットに失敗: {}", e)))
    }

    /// 申請を version check 付きで更新する
    pub(super) async fn save_request(
        &self,
        tx: &mut TxContext,
        request: &Request,
        expected_version: Version,
    ) -> Result<(), CoreError> {
        self.deps
            .request_repo
            .update_with_version_check(tx, request, expected_version)
            .await
            .map_err(|e| match e.kind() {
                InfraErrorKind::Conflict { .. } => CoreError::Conflict(
                    "申請は既に更新されています。最新の情報を取得してください。".to_string(),
                ),
                _ => CoreError::Internal(format!("申請の保存に失敗: {}", e)),
            })
    }

    /// 承認レコードを version check 付きで更新する
    pub(super) async fn save_approval(
        &self,
        tx: &mut TxContext,
        approval: &Approval,
        expected_version: Version,
    ) -> Result<(), CoreError> {
        self.deps
            .approval_repo
            .update_with_version_check(tx, approval, expected_version)
            .await
            .map_err(|e| match e.kind() {
                InfraErrorKind::Conflict { .. } => CoreError::Conflict(
                    "承認レコードは既に更新されています。最新の情報を取得してください。"
                        .to_string(),
                ),
                _ => CoreError::Internal(format!("承認レコードの保存に失敗: {}", e)),
            })
    }

    /// 承認レコードを新規作成する
    pub(super) async fn insert_approval(
        &self,
        tx: &mut TxContext,
        approval: &Approval,
    ) -> Result<(), CoreError> {
        self.deps
            .approval_repo
            .insert(tx, approval)
            .await
            .map_err(|e| CoreError::Internal(format!("承認レコードの作成に失敗: {}", e)))
    }

    /// 申請に紐づく承認レコード一覧を取得する
    pub(super) async fn fetch_request_approvals(
        &self,
        request_id: &RequestId,
    ) -> Result<Vec<Approval>, CoreError> {
        self.deps
            .approval_repo
            .find_by_request(request_id)
            .await
            .map_err(|e| CoreError::Internal(format!("承認レコードの取得に失敗: {}", e)))
    }

    /// 通知を組み立てる
    pub(super) fn build_notification(
        &self,
        user_id: UserId,
        event_type: NotificationEventType,
        title: impl Into<String>,
        body: impl Into<String>,
        request_id: &RequestId,
    ) -> Notification {
        Notification::new(NewNotification {
            id: NotificationId::new(),
            user_id,
            event_type,
            title: title.into(),
            body: body.into(),
            request_id: Some(request_id.clone()),
            now: self.deps.clock.now(),
        })
    }

    /// 通知を作成する（fire-and-forget）
    ///
    /// 通知の作成失敗は申請操作の成否に影響させない。
    /// 失敗はログに残すのみ。
    pub(super) async fn create_notifications(&self, notifications: Vec<Notification>) {
        if notifications.is_empty() {
            return;
        }

        let result: Result<(), CoreError> = async {
            let mut tx = self.begin_tx().await?;
            for notification in &notifications {
                self.deps
                    .notification_repo
                    .insert(&mut tx, notification)
                    .await
                    .map_err(|e| CoreError::Internal(format!("通知の作成に失敗: {}", e)))?;
            }
            self.commit_tx(tx).await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!("通知の作成に失敗しました（処理は継続）: {}", e);
        }
    }
}
