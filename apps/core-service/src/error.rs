//! # Core Service エラー定義
//!
//! Core Service 固有のエラーと、HTTP レスポンスへの変換を定義する。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shinseiflow_shared::ErrorResponse;
use thiserror::Error;

/// Core Service で発生するエラー
#[derive(Debug, Error)]
pub enum CoreError {
    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 権限不足
    #[error("権限がありません: {0}")]
    Forbidden(String),

    /// 競合（楽観的ロック失敗）
    #[error("競合が発生しました: {0}")]
    Conflict(String),

    /// データベースエラー
    #[error("データベースエラー: {0}")]
    Database(#[from] shinseiflow_infra::InfraError),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let body = match &self {
            CoreError::NotFound(msg) => ErrorResponse::not_found(msg.clone()),
            CoreError::BadRequest(msg) => ErrorResponse::bad_request(msg.clone()),
            CoreError::Forbidden(msg) => ErrorResponse::forbidden(msg.clone()),
            CoreError::Conflict(msg) => ErrorResponse::conflict(msg.clone()),
            CoreError::Database(e) => {
                tracing::error!(
                    error.kind = "database",
                    span_trace = %e.span_trace(),
                    "データベースエラー: {}",
                    e
                );
                ErrorResponse::internal_error()
            }
            CoreError::Internal(msg) => {
                tracing::error!(error.kind = "internal", "内部エラー: {}", msg);
                ErrorResponse::internal_error()
            }
        };

        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_foundは404になる() {
        let response = CoreError::NotFound("申請が見つかりません".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_bad_requestは400になる() {
        let response = CoreError::BadRequest("件名は必須です".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_conflictは409になる() {
        let response = CoreError::Conflict("競合".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internalは500になる() {
        let response = CoreError::Internal("想定外".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
