//! RoleRepository: ロールとメンバーシップの読み取り
//!
//! ロール指定の承認ステップを具体的なユーザー ID 列に展開するために使用する。
//! メンバーシップは user_roles テーブルの現時点の内容（スナップショット）。

use async_trait::async_trait;
use shinseiflow_domain::{role::RoleId, user::UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// RoleRepository トレイト
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// ロール保持者のユーザー ID 一覧を取得する
    ///
    /// 割り当て日時の昇順。該当者がいない場合は空の Vec を返す
    /// （エラーにはしない — その場合の扱いはユースケース層の責務）。
    async fn find_member_ids(&self, role_id: &RoleId) -> Result<Vec<UserId>, InfraError>;
}

/// PostgreSQL 実装
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%role_id))]
    async fn find_member_ids(&self, role_id: &RoleId) -> Result<Vec<UserId>, InfraError> {
        let rows = sqlx::query_as::<_, (Uuid,)>(
            "SELECT user_id FROM user_roles WHERE role_id = $1 ORDER BY assigned_at",
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| UserId::from_uuid(id)).collect())
    }
}
