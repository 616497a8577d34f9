//! NotificationRepository: 通知の永続化
//!
//! 承認依頼・承認完了・却下・期日リマインダーの通知行を管理する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shinseiflow_domain::{
    notification::{Notification, NotificationEventType, NotificationId},
    request::RequestId,
    user::UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// NotificationRepository トレイト
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 新規通知を作成する
    async fn insert(
        &self,
        tx: &mut TxContext,
        notification: &Notification,
    ) -> Result<(), InfraError>;

    /// ユーザーの通知一覧を取得する（作成日時の降順）
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Notification>, InfraError>;
}

/// DB の notifications テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    event_type: String,
    title: String,
    body: String,
    request_id: Option<Uuid>,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = InfraError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification::from_db(
            NotificationId::from_uuid(row.id),
            UserId::from_uuid(row.user_id),
            row.event_type
                .parse::<NotificationEventType>()
                .map_err(|e| InfraError::unexpected(format!("不正な通知種別: {}", e)))?,
            row.title,
            row.body,
            row.request_id.map(RequestId::from_uuid),
            row.read_at,
            row.created_at,
        ))
    }
}

/// PostgreSQL 実装
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(notification_id = %notification.id()))]
    async fn insert(
        &self,
        tx: &mut TxContext,
        notification: &Notification,
    ) -> Result<(), InfraError> {
        let event_type: &str = notification.event_type().into();
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, user_id, event_type, title, body, request_id, read_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(notification.id().as_uuid())
        .bind(notification.user_id().as_uuid())
        .bind(event_type)
        .bind(notification.title())
        .bind(notification.body())
        .bind(notification.request_id().map(|r| r.as_uuid()))
        .bind(notification.read_at())
        .bind(notification.created_at())
        .execute(tx.conn())
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Notification>, InfraError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, event_type, title, body, request_id, read_at, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Notification::try_from).collect()
    }
}
