//! # ビジネスイベントログの構造化ヘルパー
//!
//! ログフィールドの命名規約とヘルパーマクロを提供する。
//! `jq` で効率的に調査できるよう、ドット記法のフラットなキーを使用する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`event.action`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID
/// - `event.actor_id`: 操作者 ID
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const REQUEST: &str = "request";
        pub const NOTIFICATION: &str = "notification";
    }

    /// イベントアクション
    pub mod action {
        // 申請
        pub const REQUEST_CREATED: &str = "request.created";
        pub const REQUEST_APPROVED: &str = "request.approved";
        pub const REQUEST_REJECTED: &str = "request.rejected";
        pub const REQUEST_CANCELLED: &str = "request.cancelled";
        pub const STEP_APPROVED: &str = "step.approved";
        pub const STEP_REJECTED: &str = "step.rejected";
        pub const STEP_ADVANCED: &str = "step.advanced";

        // 通知
        pub const NOTIFICATION_CREATED: &str = "notification.created";
        pub const REMINDERS_DISPATCHED: &str = "reminders.dispatched";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const REQUEST: &str = "request";
        pub const APPROVAL: &str = "request_approval";
        pub const NOTIFICATION: &str = "notification";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}
