//! リマインダーハンドラ
//!
//! 外部スケジューラから定期的に呼び出されるエンドポイント。リクエストボディは
//! 持たない。

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use shinseiflow_shared::ApiResponse;

use crate::{error::CoreError, usecase::ReminderUseCaseImpl};

/// リマインダーハンドラの共有状態
pub struct ReminderApiState {
    pub usecase: ReminderUseCaseImpl,
}

/// リマインダー実行結果
#[derive(Debug, Serialize)]
pub struct ReminderRunDto {
    /// 作成した通知の件数
    pub dispatched: usize,
}

/// 期日リマインダーを実行する
///
/// ## エンドポイント
/// POST /internal/reminders/run
pub async fn run_reminders(
    State(state): State<Arc<ReminderApiState>>,
) -> Result<Json<ApiResponse<ReminderRunDto>>, CoreError> {
    let dispatched = state.usecase.run_due_reminders().await?;

    Ok(Json(ApiResponse::new(ReminderRunDto { dispatched })))
}
