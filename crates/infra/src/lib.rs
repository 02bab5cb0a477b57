//! # Kawaraban インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはドメイン層で定義された概念（メッセージ、テンプレート、
//! 差出人、タグ購読）の永続化と、送信キューへの受け渡しを実装する。
//! 外部システムの詳細をカプセル化し、ドメイン層をインフラの変更から保護する。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プールとトランザクション管理
//! - **リポジトリ実装**: メッセージ・テンプレート・差出人・タグ購読の読み書き
//! - **送信キュー**: 配信ジョブの Redis キューへの投入
//!
//! ## 依存関係
//!
//! ```text
//! core-service → infra → domain
//! ```
//!
//! インフラ層は `domain` に依存する。
//! ドメイン層はインフラ層に依存しない（依存性逆転の原則）。
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL 接続管理とトランザクションコンテキスト
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリ実装
//! - [`queue`] - 送信キュー実装

pub mod db;
pub mod error;
pub mod queue;
pub mod repository;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::InfraError;
