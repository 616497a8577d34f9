//! 申請ハンドラの状態変更操作

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shinseiflow_domain::{
    request::{RequestId, RequestTypeId, WorkflowStepId},
    user::UserId,
};
use shinseiflow_shared::ApiResponse;
use uuid::Uuid;

use super::{
    ApproveRequest,
    CancelRequest,
    CreateRequestRequest,
    RejectRequest,
    RequestApiState,
    RequestDetailDto,
    RequestDto,
    StepPathParams,
};
use crate::{
    error::CoreError,
    usecase::{ApproveInput, CreateRequestInput, RejectInput},
};

/// 申請を作成する
///
/// ## エンドポイント
/// POST /internal/requests
pub async fn create_request(
    State(state): State<Arc<RequestApiState>>,
    Json(req): Json<CreateRequestRequest>,
) -> Result<Response, CoreError> {
    let requester_id = UserId::from_uuid(req.requester_id);

    let input = CreateRequestInput {
        request_type_id: RequestTypeId::from_uuid(req.request_type_id),
        title: req.title,
        form_data: req.form_data,
        priority: req.priority,
        due_date: req.due_date,
    };

    let result = state.usecase.create_request(input, requester_id).await?;

    let response = ApiResponse::new(RequestDetailDto::from_result(&result));

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// ワークフローステップを承認する
///
/// ## エンドポイント
/// POST /internal/requests/{id}/steps/{step_id}/approve
pub async fn approve_step(
    State(state): State<Arc<RequestApiState>>,
    Path(params): Path<StepPathParams>,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<ApiResponse<RequestDetailDto>>, CoreError> {
    let result = state
        .usecase
        .approve_step(
            RequestId::from_uuid(params.id),
            WorkflowStepId::from_uuid(params.step_id),
            UserId::from_uuid(req.user_id),
            ApproveInput {
                comment: req.comment,
            },
        )
        .await?;

    Ok(Json(ApiResponse::new(RequestDetailDto::from_result(
        &result,
    ))))
}

/// ワークフローステップを却下する
///
/// ## エンドポイント
/// POST /internal/requests/{id}/steps/{step_id}/reject
pub async fn reject_step(
    State(state): State<Arc<RequestApiState>>,
    Path(params): Path<StepPathParams>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<ApiResponse<RequestDetailDto>>, CoreError> {
    let result = state
        .usecase
        .reject_step(
            RequestId::from_uuid(params.id),
            WorkflowStepId::from_uuid(params.step_id),
            UserId::from_uuid(req.user_id),
            RejectInput {
                comment: req.comment,
            },
        )
        .await?;

    Ok(Json(ApiResponse::new(RequestDetailDto::from_result(
        &result,
    ))))
}

/// 申請を取り消す
///
/// ## エンドポイント
/// POST /internal/requests/{id}/cancel
pub async fn cancel_request(
    State(state): State<Arc<RequestApiState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<ApiResponse<RequestDto>>, CoreError> {
    let request = state
        .usecase
        .cancel_request(RequestId::from_uuid(id), UserId::from_uuid(req.user_id))
        .await?;

    Ok(Json(ApiResponse::new(RequestDto::from_request(&request))))
}
