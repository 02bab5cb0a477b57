//! # ユースケース層
//!
//! Core Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・キュー・時計を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//! - **型付きエラー**: 配信の失敗理由は [`SendMessageError`] で呼び出し側に伝える
//!
//! ## モジュール構成
//!
//! - `message`: メッセージ配信のユースケース

pub mod message;

pub use message::{MessageUseCaseImpl, SendMessageError, TemplateRenderError};
