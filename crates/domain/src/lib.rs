//! # Kawaraban ドメイン層
//!
//! 一括配信メールのビジネスロジックの中核を担うドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! このクレートは DDD（ドメイン駆動設計）の原則に従い、以下を提供する:
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（例: Message, Template）
//! - **値オブジェクト**: 識別子を持たない不変オブジェクト（例: Subject,
//!   EmailAddress）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、キュー）に一切依存しない。
//! これにより、配信オーケストレーションの純粋性が保たれる。
//!
//! ## モジュール構成
//!
//! - [`message`] - メッセージ集約（送信状態のライフサイクルを持つ）
//! - [`template`] - テンプレート（本文の置換点を 1 つ持つ再利用コンテンツ）
//! - [`sender`] - 差出人
//! - [`tag`] - 配信対象を束ねるタグ
//! - [`contact`] - 購読者コンタクトの識別子
//! - [`clock`] - 時刻プロバイダ（テストで固定時刻を注入可能にする）
//! - [`error`] - ドメイン層で発生するエラーの定義
//!
//! ## 使用例
//!
//! ```rust
//! use kawaraban_domain::{DomainError, message::MessageId};
//!
//! // メッセージ ID の生成
//! let message_id = MessageId::new();
//!
//! // ドメインエラーの生成
//! let error = DomainError::NotFound {
//!     entity_type: "Message",
//!     id:          message_id.to_string(),
//! };
//! ```

#[macro_use]
mod macros;

pub mod clock;
pub mod contact;
pub mod error;
pub mod message;
pub mod sender;
pub mod tag;
pub mod template;

pub use error::DomainError;
