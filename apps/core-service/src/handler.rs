//! # ハンドラ層
//!
//! HTTP リクエストのパースとレスポンスの構築を担当する。
//! ビジネスロジックはユースケース層に委譲する。

pub mod health;
pub mod reminder;
pub mod request;

pub use health::health_check;
pub use reminder::{ReminderApiState, run_reminders};
pub use request::{
    RequestApiState,
    approve_step,
    cancel_request,
    create_request,
    get_request,
    list_my_requests,
    list_pending_approvals,
    reject_step,
};
