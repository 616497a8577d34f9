//! RequestTypeRepository: 申請種別の読み取り
//!
//! フォームスキーマと既定ワークフローの参照元。申請エンジンからは読み取り専用。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use shinseiflow_domain::request::{FormSchema, RequestType, RequestTypeId, WorkflowId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// RequestTypeRepository トレイト
#[async_trait]
pub trait RequestTypeRepository: Send + Sync {
    /// ID で申請種別を検索する
    async fn find_by_id(&self, id: &RequestTypeId) -> Result<Option<RequestType>, InfraError>;
}

/// DB の request_types テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct RequestTypeRow {
    id: Uuid,
    name: String,
    default_workflow_id: Option<Uuid>,
    form_schema: JsonValue,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RequestTypeRow> for RequestType {
    type Error = InfraError;

    fn try_from(row: RequestTypeRow) -> Result<Self, Self::Error> {
        Ok(RequestType::from_db(
            RequestTypeId::from_uuid(row.id),
            row.name,
            row.default_workflow_id.map(WorkflowId::from_uuid),
            FormSchema::from_json(&row.form_schema)?,
            row.created_at,
            row.updated_at,
        ))
    }
}

/// PostgreSQL 実装
pub struct PostgresRequestTypeRepository {
    pool: PgPool,
}

impl PostgresRequestTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestTypeRepository for PostgresRequestTypeRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &RequestTypeId) -> Result<Option<RequestType>, InfraError> {
        let row = sqlx::query_as::<_, RequestTypeRow>(
            r#"
            SELECT id, name, default_workflow_id, form_schema, created_at, updated_at
            FROM request_types
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(RequestType::try_from).transpose()
    }
}
