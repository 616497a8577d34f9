//! # Core Service ライブラリ
//!
//! Core Service のユースケースとハンドラを公開する。

pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
