//! # ShinseiFlow インフラ層
//!
//! データベースアクセスと永続化を担当する。
//!
//! ## 設計方針
//!
//! - **依存性逆転**: リポジトリトレイトをこの層で定義し、ユースケース層は
//!   トレイト経由でアクセスする
//! - **構造的トランザクション強制**: 書き込みメソッドは [`TxContext`] を
//!   必須引数とし、トランザクションなしの書き込みをコンパイルエラーにする
//! - **楽観的ロック**: 更新系は version 一致チェック付きで実行し、
//!   競合時は [`InfraError`] の Conflict を返す

pub mod db;
pub mod error;
pub mod repository;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use db::{PgTransactionManager, TransactionManager, TxContext};
pub use error::{InfraError, InfraErrorKind};
