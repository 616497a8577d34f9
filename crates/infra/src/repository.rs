//! # リポジトリ実装
//!
//! ユースケース層から利用するリポジトリトレイトと、その PostgreSQL 実装を
//! 提供する。
//!
//! ## 設計方針
//!
//! - **依存性逆転**: トレイトをこの層で定義し、ユースケース層はトレイト経由で
//!   アクセスする
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **テスタビリティ**: トレイト経由でモック可能な設計（[`crate::mock`]）
//! - **書き込みは TxContext 必須**: トランザクションなしの書き込みを
//!   コンパイルエラーにする

pub mod approval_repository;
pub mod notification_repository;
pub mod request_repository;
pub mod request_type_repository;
pub mod role_repository;
pub mod user_repository;
pub mod workflow_repository;

pub use approval_repository::{ApprovalRepository, PostgresApprovalRepository};
pub use notification_repository::{NotificationRepository, PostgresNotificationRepository};
pub use request_repository::{PostgresRequestRepository, RequestRepository};
pub use request_type_repository::{PostgresRequestTypeRepository, RequestTypeRepository};
pub use role_repository::{PostgresRoleRepository, RoleRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
pub use workflow_repository::{PostgresWorkflowRepository, WorkflowRepository};
