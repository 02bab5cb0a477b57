//! # リポジトリ実装
//!
//! 配信コアが参照・更新する各集約の永続化を提供する。
//!
//! ## 設計方針
//!
//! - **依存性逆転**: trait を定義し、ユースケース層は trait にのみ依存
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **テスタビリティ**: trait 経由でモック可能な設計

pub mod contact_repository;
pub mod message_repository;
pub mod sender_repository;
pub mod template_repository;

pub use contact_repository::{PostgresTagContactIndex, TagContactIndex};
pub use message_repository::{MessageRepository, PostgresMessageRepository};
pub use sender_repository::{PostgresSenderRepository, SenderRepository};
pub use template_repository::{PostgresTemplateRepository, TemplateRepository};
