//! # ShinseiFlow ドメイン層
//!
//! ビジネスロジックの中核を担うドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! このクレートは DDD（ドメイン駆動設計）の原則に従い、以下を提供する:
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: Request, Approval）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: Version,
//!   Priority）
//! - **ドメインサービス**: エンティティに属さないビジネスロジック
//!   （例: フォームバリデータ）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! core-service → infra → domain → shared
//! ```
//!
//! ドメイン層はインフラ層（DB、外部サービス）には一切依存しない。
//! これにより、ビジネスロジックの純粋性が保たれる。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`request`] - 申請・承認ワークフローのエンティティと状態遷移
//! - [`user`] / [`role`] - ユーザーと役割（承認者解決の対象）
//! - [`notification`] - アプリ内通知
//!
//! ## 使用例
//!
//! ```rust
//! use shinseiflow_domain::{DomainError, user::UserId};
//!
//! // ユーザー ID の生成
//! let user_id = UserId::new();
//!
//! // ドメインエラーの生成
//! let error = DomainError::NotFound {
//!     entity_type: "Request",
//!     id:          "req-123".to_string(),
//! };
//! ```

#[macro_use]
mod macros;

pub mod clock;
pub mod error;
pub mod notification;
pub mod request;
pub mod role;
pub mod user;
pub mod value_objects;

pub use error::DomainError;
