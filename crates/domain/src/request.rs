//! # 申請ワークフロー
//!
//! 申請（Request）とその承認ワークフローを管理する。
//!
//! ## 概念モデル
//!
//! - **RequestType**: 申請種別。フォームスキーマと既定ワークフローを持つ
//! - **Workflow / WorkflowStep**: 承認手順のテンプレート（順序付きステップ列）
//! - **Request**: 申請の実体。ステータスと現在ステップを保持する
//! - **Approval**: ステップ × 承認者ごとの承認レコード
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use serde_json::json;
//! use shinseiflow_domain::request::{NewRequest, Request, RequestId, RequestStatus};
//! use shinseiflow_domain::user::UserId;
//! use shinseiflow_domain::value_objects::{Priority, RequestTitle};
//!
//! let request = Request::new(NewRequest {
//!     id: RequestId::new(),
//!     request_type_id: shinseiflow_domain::request::RequestTypeId::new(),
//!     workflow_id: None,
//!     first_step_id: None,
//!     title: RequestTitle::new("経費精算")?,
//!     form_data: json!({"amount": 1200}),
//!     priority: Priority::Medium,
//!     due_date: None,
//!     requester_id: UserId::new(),
//!     now: chrono::Utc::now(),
//! });
//! assert_eq!(request.status(), RequestStatus::Pending);
//! # Ok(())
//! # }
//! ```

mod approval;
mod form;
mod form_validator;
mod instance;
mod request_type;
mod workflow;

pub use approval::*;
pub use form::*;
pub use form_validator::*;
pub use instance::*;
pub use request_type::*;
pub use workflow::*;
