//! UserRepository: ユーザーの読み取り
//!
//! 承認者・申請者の表示名とメールアドレスの解決に使用する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shinseiflow_domain::{
    user::{Email, User, UserId},
    value_objects::UserName,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// UserRepository トレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ID でユーザーを検索する
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError>;
}

/// DB の users テーブルの行を表す中間構造体
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = InfraError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User::from_db(
            UserId::from_uuid(row.id),
            UserName::new(row.name)?,
            Email::new(row.email)?,
            row.created_at,
            row.updated_at,
        ))
    }
}

/// PostgreSQL 実装
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, InfraError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }
}
