//! ApprovalRepository: 承認レコードの永続化
//!
//! ステップ × 承認者ごとの承認レコードを管理する。
//! 「自分の承認待ちレコード」の検索が承認・却下操作の権限チェックを兼ねる
//! （見つからない = 担当者でない、または既に判断済み）。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shinseiflow_domain::{
    request::{Approval, ApprovalId, ApprovalRecord, ApprovalStatus, RequestId, WorkflowStepId},
    user::UserId,
    value_objects::Version,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// ApprovalRepository トレイト
#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    /// 新規承認レコードを作成する
    async fn insert(&self, tx: &mut TxContext, approval: &Approval) -> Result<(), InfraError>;

    /// 楽観的ロック付きで承認レコードを更新する
    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        approval: &Approval,
        expected_version: Version,
    ) -> Result<(), InfraError>;

    /// 指定ユーザーの承認待ちレコードを (申請, ステップ) で検索する
    ///
    /// 見つからない場合は、ユーザーがそのステップの承認者でないか、
    /// 既に判断済みであることを意味する。
    async fn find_pending_for(
        &self,
        request_id: &RequestId,
        step_id: &WorkflowStepId,
        approver_id: &UserId,
    ) -> Result<Option<Approval>, InfraError>;

    /// 申請の承認レコード一覧を取得する（作成順）
    async fn find_by_request(&self, request_id: &RequestId) -> Result<Vec<Approval>, InfraError>;

    /// ステップの承認待ちレコード一覧を取得する
    async fn find_pending_by_step(
        &self,
        request_id: &RequestId,
        step_id: &WorkflowStepId,
    ) -> Result<Vec<Approval>, InfraError>;

    /// 指定ユーザーの承認待ちレコード一覧を取得する（受信箱用）
    async fn find_pending_by_approver(
        &self,
        approver_id: &UserId,
    ) -> Result<Vec<Approval>, InfraError>;
}

/// DB の request_approvals テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct ApprovalRow {
    id: Uuid,
    request_id: Uuid,
    step_id: Uuid,
    approver_id: Uuid,
    status: String,
    version: i32,
    comment: Option<String>,
    decided_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApprovalRow> for Approval {
    type Error = InfraError;

    fn try_from(row: ApprovalRow) -> Result<Self, Self::Error> {
        let record = ApprovalRecord {
            id: ApprovalId::from_uuid(row.id),
            request_id: RequestId::from_uuid(row.request_id),
            step_id: WorkflowStepId::from_uuid(row.step_id),
            approver_id: UserId::from_uuid(row.approver_id),
            status: row
                .status
                .parse::<ApprovalStatus>()
                .map_err(|e| InfraError::unexpected(format!("不正なステータス: {}", e)))?,
            version: Version::try_from(row.version)?,
            comment: row.comment,
            decided_at: row.decided_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        Ok(Approval::from_db(record)?)
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, request_id, step_id, approver_id, status, version,
           comment, decided_at, created_at, updated_at
    FROM request_approvals
"#;

/// PostgreSQL 実装
pub struct PostgresApprovalRepository {
    pool: PgPool,
}

impl PostgresApprovalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApprovalRepository for PostgresApprovalRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(approval_id = %approval.id()))]
    async fn insert(&self, tx: &mut TxContext, approval: &Approval) -> Result<(), InfraError> {
        let status: &str = approval.status().into();
        sqlx::query(
            r#"
            INSERT INTO request_approvals (
                id, request_id, step_id, approver_id, status, version,
                comment, decided_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(approval.id().as_uuid())
        .bind(approval.request_id().as_uuid())
        .bind(approval.step_id().as_uuid())
        .bind(approval.approver_id().as_uuid())
        .bind(status)
        .bind(approval.version().as_i32())
        .bind(approval.comment())
        .bind(approval.decided_at())
        .bind(approval.created_at())
        .bind(approval.updated_at())
        .execute(tx.conn())
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(approval_id = %approval.id()))]
    async fn update_with_version_check(
        &self,
        tx: &mut TxContext,
        approval: &Approval,
        expected_version: Version,
    ) -> Result<(), InfraError> {
        let status: &str = approval.status().into();
        let result = sqlx::query(
            r#"
            UPDATE request_approvals SET
                status = $1,
                version = $2,
                comment = $3,
                decided_at = $4,
                updated_at = $5
            WHERE id = $6 AND version = $7
            "#,
        )
        .bind(status)
        .bind(approval.version().as_i32())
        .bind(approval.comment())
        .bind(approval.decided_at())
        .bind(approval.updated_at())
        .bind(approval.id().as_uuid())
        .bind(expected_version.as_i32())
        .execute(tx.conn())
        .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::conflict(
                "Approval",
                approval.id().as_uuid().to_string(),
            ));
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%request_id, %step_id, %approver_id))]
    async fn find_pending_for(
        &self,
        request_id: &RequestId,
        step_id: &WorkflowStepId,
        approver_id: &UserId,
    ) -> Result<Option<Approval>, InfraError> {
        let row = sqlx::query_as::<_, ApprovalRow>(&format!(
            "{} WHERE request_id = $1 AND step_id = $2 AND approver_id = $3 \
             AND status = 'pending'",
            SELECT_COLUMNS
        ))
        .bind(request_id.as_uuid())
        .bind(step_id.as_uuid())
        .bind(approver_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Approval::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%request_id))]
    async fn find_by_request(&self, request_id: &RequestId) -> Result<Vec<Approval>, InfraError> {
        let rows = sqlx::query_as::<_, ApprovalRow>(&format!(
            "{} WHERE request_id = $1 ORDER BY created_at",
            SELECT_COLUMNS
        ))
        .bind(request_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Approval::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%request_id, %step_id))]
    async fn find_pending_by_step(
        &self,
        request_id: &RequestId,
        step_id: &WorkflowStepId,
    ) -> Result<Vec<Approval>, InfraError> {
        let rows = sqlx::query_as::<_, ApprovalRow>(&format!(
            "{} WHERE request_id = $1 AND step_id = $2 AND status = 'pending' \
             ORDER BY created_at",
            SELECT_COLUMNS
        ))
        .bind(request_id.as_uuid())
        .bind(step_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Approval::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%approver_id))]
    async fn find_pending_by_approver(
        &self,
        approver_id: &UserId,
    ) -> Result<Vec<Approval>, InfraError> {
        let rows = sqlx::query_as::<_, ApprovalRow>(&format!(
            "{} WHERE approver_id = $1 AND status = 'pending' ORDER BY created_at",
            SELECT_COLUMNS
        ))
        .bind(approver_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Approval::try_from).collect()
    }
}
