//! ヘルスチェックハンドラ

use axum::Json;
use shinseiflow_shared::HealthResponse;

/// ヘルスチェック
///
/// ## エンドポイント
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status:  "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
