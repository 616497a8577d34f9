//! WorkflowRepository: ワークフロー定義とステップの読み取り
//!
//! ワークフロー定義は申請エンジンからは読み取り専用
//! （進行中の申請から参照されるステップは不変）。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shinseiflow_domain::{
    request::{ApproverSpec, StepType, Workflow, WorkflowId, WorkflowStep, WorkflowStepId},
    value_objects::{StepOrder, WorkflowName},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// WorkflowRepository トレイト
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// ID でワークフローを検索する
    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<Workflow>, InfraError>;

    /// ワークフローのステップ一覧を step_order 昇順で取得する
    async fn find_steps(&self, workflow_id: &WorkflowId) -> Result<Vec<WorkflowStep>, InfraError>;

    /// ID でステップを検索する
    async fn find_step_by_id(
        &self,
        step_id: &WorkflowStepId,
    ) -> Result<Option<WorkflowStep>, InfraError>;

    /// ワークフローの最初のステップ（step_order 最小）を取得する
    async fn find_first_step(
        &self,
        workflow_id: &WorkflowId,
    ) -> Result<Option<WorkflowStep>, InfraError>;

    /// 指定順序より後の次ステップ（昇順で最初の 1 件）を取得する
    async fn find_next_step(
        &self,
        workflow_id: &WorkflowId,
        after: StepOrder,
    ) -> Result<Option<WorkflowStep>, InfraError>;
}

/// DB の workflow_steps テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct WorkflowStepRow {
    id: Uuid,
    workflow_id: Uuid,
    step_order: i32,
    step_name: String,
    step_type: String,
    approver_type: String,
    approver_id: Uuid,
    is_required: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<WorkflowStepRow> for WorkflowStep {
    type Error = InfraError;

    fn try_from(row: WorkflowStepRow) -> Result<Self, Self::Error> {
        Ok(WorkflowStep::from_db(
            WorkflowStepId::from_uuid(row.id),
            WorkflowId::from_uuid(row.workflow_id),
            StepOrder::try_from(row.step_order)?,
            row.step_name,
            row.step_type
                .parse::<StepType>()
                .map_err(|e| InfraError::unexpected(format!("不正なステップ種別: {}", e)))?,
            ApproverSpec::from_db(&row.approver_type, row.approver_id)?,
            row.is_required,
            row.created_at,
        ))
    }
}

const SELECT_STEP_COLUMNS: &str = r#"
    SELECT id, workflow_id, step_order, step_name, step_type,
           approver_type, approver_id, is_required, created_at
    FROM workflow_steps
"#;

/// PostgreSQL 実装
pub struct PostgresWorkflowRepository {
    pool: PgPool,
}

impl PostgresWorkflowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowRepository for PostgresWorkflowRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &WorkflowId) -> Result<Option<Workflow>, InfraError> {
        let row = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>, DateTime<Utc>)>(
            "SELECT id, name, created_at, updated_at FROM workflows WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, name, created_at, updated_at)| {
            Ok(Workflow::from_db(
                WorkflowId::from_uuid(id),
                WorkflowName::new(name)?,
                created_at,
                updated_at,
            ))
        })
        .transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%workflow_id))]
    async fn find_steps(&self, workflow_id: &WorkflowId) -> Result<Vec<WorkflowStep>, InfraError> {
        let rows = sqlx::query_as::<_, WorkflowStepRow>(&format!(
            "{} WHERE workflow_id = $1 ORDER BY step_order",
            SELECT_STEP_COLUMNS
        ))
        .bind(workflow_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WorkflowStep::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%step_id))]
    async fn find_step_by_id(
        &self,
        step_id: &WorkflowStepId,
    ) -> Result<Option<WorkflowStep>, InfraError> {
        let row = sqlx::query_as::<_, WorkflowStepRow>(&format!(
            "{} WHERE id = $1",
            SELECT_STEP_COLUMNS
        ))
        .bind(step_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkflowStep::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%workflow_id))]
    async fn find_first_step(
        &self,
        workflow_id: &WorkflowId,
    ) -> Result<Option<WorkflowStep>, InfraError> {
        let row = sqlx::query_as::<_, WorkflowStepRow>(&format!(
            "{} WHERE workflow_id = $1 ORDER BY step_order LIMIT 1",
            SELECT_STEP_COLUMNS
        ))
        .bind(workflow_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkflowStep::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%workflow_id, %after))]
    async fn find_next_step(
        &self,
        workflow_id: &WorkflowId,
        after: StepOrder,
    ) -> Result<Option<WorkflowStep>, InfraError> {
        let row = sqlx::query_as::<_, WorkflowStepRow>(&format!(
            "{} WHERE workflow_id = $1 AND step_order > $2 ORDER BY step_order LIMIT 1",
            SELECT_STEP_COLUMNS
        ))
        .bind(workflow_id.as_uuid())
        .bind(after.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(WorkflowStep::try_from).transpose()
    }
}
