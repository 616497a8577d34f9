//! 申請ハンドラの参照系操作

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shinseiflow_domain::{request::RequestId, user::UserId};
use shinseiflow_shared::ApiResponse;
use uuid::Uuid;

use super::{PendingApprovalDto, RequestApiState, RequestDetailDto, RequestDto, UserQuery};
use crate::error::CoreError;

/// 申請を取得する（承認レコード付き）
///
/// ## エンドポイント
/// GET /internal/requests/{id}
pub async fn get_request(
    State(state): State<Arc<RequestApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RequestDetailDto>>, CoreError> {
    let result = state.usecase.get_request(RequestId::from_uuid(id)).await?;

    Ok(Json(ApiResponse::new(RequestDetailDto::from_result(
        &result,
    ))))
}

/// 自分の申請一覧を取得する
///
/// ## エンドポイント
/// GET /internal/requests?user_id={user_id}
pub async fn list_my_requests(
    State(state): State<Arc<RequestApiState>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<Vec<RequestDto>>>, CoreError> {
    let requests = state
        .usecase
        .list_requests_by_requester(UserId::from_uuid(query.user_id))
        .await?;

    let dtos = requests.iter().map(RequestDto::from_request).collect();

    Ok(Json(ApiResponse::new(dtos)))
}

/// 自分の承認待ち一覧（受信箱）を取得する
///
/// ## エンドポイント
/// GET /internal/approvals/my?user_id={user_id}
pub async fn list_pending_approvals(
    State(state): State<Arc<RequestApiState>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<Vec<PendingApprovalDto>>>, CoreError> {
    let items = state
        .usecase
        .list_pending_approvals(UserId::from_uuid(query.user_id))
        .await?;

    let dtos = items.iter().map(PendingApprovalDto::from_item).collect();

    Ok(Json(ApiResponse::new(dtos)))
}
