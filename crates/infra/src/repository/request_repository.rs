//! RequestRepository: 申請の永続化
//!
//! 申請行の作成・更新・検索を担当する。更新は楽観的ロック
//! （version 一致チェック）付きで行う。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use shinseiflow_domain::{
    request::{
        Request,
        RequestId,
        RequestRecord,
        RequestStatus,
        RequestTypeId,
        WorkflowId,
        WorkflowStepId,
    },
    user::UserId,
    value_objects::{Priority, RequestTitle, Version},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// RequestRepository トレイト
#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// 新規申請を作成する
    async fn insert(&self, tx: &mut TxContext, request: &Request) -> Result<(), InfraError>;

    /// 楽観的ロック付きで申請を更新する
    ///
    /// `expected_version` と DB 上のバージョンが一致する場合のみ更新する。
    /// 不一致の場合は `InfraErrorKind::Conflict` を返す。
    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        request: &Request,
        expected_version: Version,
    ) -> Result<(), InfraError>;

    /// ID で申請を検索する
    async fn find_by_id(&self, id: &RequestId) -> Result<Option<Request>, InfraError>;

    /// 申請者で申請一覧を取得する（作成日時の降順）
    async fn find_by_requester(&self, requester_id: &UserId) -> Result<Vec<Request>, InfraError>;

    /// 指定日が期日の未完了申請を取得する（リマインダー用）
    ///
    /// ステータスが pending / in_progress のものに限る。
    async fn find_due_on(&self, due_date: NaiveDate) -> Result<Vec<Request>, InfraError>;
}

/// DB の requests テーブルの行を表す中間構造体
///
/// `query_as` が SQL 結果を直接マッピングする対象。
/// `TryFrom` で `Request` への変換ロジックを一箇所に集約する。
#[derive(sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    request_type_id: Uuid,
    workflow_id: Option<Uuid>,
    title: String,
    form_data: JsonValue,
    priority: String,
    due_date: Option<NaiveDate>,
    status: String,
    version: i32,
    current_step_id: Option<Uuid>,
    requester_id: Uuid,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for Request {
    type Error = InfraError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let record = RequestRecord {
            id: RequestId::from_uuid(row.id),
            request_type_id: RequestTypeId::from_uuid(row.request_type_id),
            workflow_id: row.workflow_id.map(WorkflowId::from_uuid),
            title: RequestTitle::new(row.title)?,
            form_data: row.form_data,
            priority: row
                .priority
                .parse::<Priority>()
                .map_err(|e| InfraError::unexpected(format!("不正な優先度: {}", e)))?,
            due_date: row.due_date,
            status: row
                .status
                .parse::<RequestStatus>()
                .map_err(|e| InfraError::unexpected(format!("不正なステータス: {}", e)))?,
            version: Version::try_from(row.version)?,
            current_step_id: row.current_step_id.map(WorkflowStepId::from_uuid),
            requester_id: UserId::from_uuid(row.requester_id),
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        Ok(Request::from_db(record)?)
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, request_type_id, workflow_id, title, form_data, priority, due_date,
           status, version, current_step_id, requester_id, completed_at,
           created_at, updated_at
    FROM requests
"#;

/// PostgreSQL 実装
pub struct PostgresRequestRepository {
    pool: PgPool,
}

impl PostgresRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestRepository for PostgresRequestRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(request_id = %request.id()))]
    async fn insert(&self, tx: &mut TxContext, request: &Request) -> Result<(), InfraError> {
        let status: &str = request.status().into();
        let priority: &str = request.priority().into();
        sqlx::query(
            r#"
            INSERT INTO requests (
                id, request_type_id, workflow_id, title, form_data, priority, due_date,
                status, version, current_step_id, requester_id, completed_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(request.id().as_uuid())
        .bind(request.request_type_id().as_uuid())
        .bind(request.workflow_id().map(|w| w.as_uuid()))
        .bind(request.title().as_str())
        .bind(request.form_data())
        .bind(priority)
        .bind(request.due_date())
        .bind(status)
        .bind(request.version().as_i32())
        .bind(request.current_step_id().map(|s| s.as_uuid()))
        .bind(request.requester_id().as_uuid())
        .bind(request.completed_at())
        .bind(request.created_at())
        .bind(request.updated_at())
        .execute(tx.conn())
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(request_id = %request.id()))]
    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        request: &Request,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        let status: &str = request.status().into();
        let result = sqlx::query(
            r#"
            UPDATE requests SET
                status = $1,
                version = $2,
                current_step_id = $3,
                completed_at = $4,
                updated_at = $5
            WHERE id = $6 AND version = $7
            "#,
        )
        .bind(status)
        .bind(request.version().as_i32())
        .bind(request.current_step_id().map(|s| s.as_uuid()))
        .bind(request.completed_at())
        .bind(request.updated_at())
        .bind(request.id().as_uuid())
        .bind(expected_version.as_i32())
        .execute(tx.conn())
        .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::conflict(
                "Request",
                request.id().as_uuid().to_string(),
            ));
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &RequestId) -> Result<Option<Request>, InfraError> {
        let row = sqlx::query_as::<_, RequestRow>(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Request::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%requester_id))]
    async fn find_by_requester(&self, requester_id: &UserId) -> Result<Vec<Request>, InfraError> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            "{} WHERE requester_id = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(requester_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Request::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%due_date))]
    async fn find_due_on(&self, due_date: NaiveDate) -> Result<Vec<Request>, InfraError> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            "{} WHERE due_date = $1 AND status IN ('pending', 'in_progress') ORDER BY created_at",
            SELECT_COLUMNS
        ))
        .bind(due_date)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Request::try_from).collect()
    }
}
