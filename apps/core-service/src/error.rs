//! # Core Service エラー定義
//!
//! Core Service 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! 配信ユースケースの型付きエラー（[`SendMessageError`]）は
//! `From` 実装でここに集約され、RFC 9457 Problem Details として返される。

use axum::{
   Json,
   http::StatusCode,
   response::{IntoResponse, Response},
};
use kawaraban_shared::ErrorResponse;
use thiserror::Error;

use crate::usecase::SendMessageError;

/// Core Service で発生するエラー
#[derive(Debug, Error)]
pub enum CoreError {
   /// リソースが見つからない
   #[error("リソースが見つかりません: {0}")]
   NotFound(String),

   /// 処理不能なエンティティ（参照整合性の破れ、レンダリング失敗）
   #[error("処理できないリクエスト: {0}")]
   UnprocessableEntity(String),

   /// 競合（既に送信済み）
   #[error("競合が発生しました: {0}")]
   Conflict(String),

   /// データベースエラー
   #[error("データベースエラー: {0}")]
   Database(#[from] kawaraban_infra::InfraError),

   /// 送信キューエラー
   #[error("送信キューエラー: {0}")]
   Queue(String),
}

impl From<SendMessageError> for CoreError {
   fn from(e: SendMessageError) -> Self {
      match e {
         SendMessageError::InvalidMessage(id) => {
            CoreError::NotFound(format!("メッセージが見つかりません: {id}"))
         }
         SendMessageError::InvalidSender(id) => {
            CoreError::UnprocessableEntity(format!("差出人が見つかりません: {id}"))
         }
         SendMessageError::InvalidTemplate(id) => {
            CoreError::UnprocessableEntity(format!("テンプレートが見つかりません: {id}"))
         }
         SendMessageError::MessageAlreadySent(id) => {
            CoreError::Conflict(format!("メッセージは既に送信済みです: {id}"))
         }
         SendMessageError::Render(e) => CoreError::UnprocessableEntity(e.to_string()),
         SendMessageError::Repository(e) => CoreError::Database(e),
         SendMessageError::Dispatch(e) => {
            CoreError::Queue(format!("配信ジョブの投入に失敗: {e}"))
         }
      }
   }
}

impl IntoResponse for CoreError {
   fn into_response(self) -> Response {
      let (status, body) = match &self {
         CoreError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::not_found(msg)),
         CoreError::UnprocessableEntity(msg) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorResponse::unprocessable_entity(msg),
         ),
         CoreError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse::conflict(msg)),
         CoreError::Database(e) => {
            tracing::error!(
               error.category = kawaraban_shared::event_log::error::category::INFRASTRUCTURE,
               error.kind = kawaraban_shared::event_log::error::kind::DATABASE,
               "データベースエラー: {}",
               e
            );
            (
               StatusCode::INTERNAL_SERVER_ERROR,
               ErrorResponse::internal_error(),
            )
         }
         CoreError::Queue(msg) => {
            tracing::error!(
               error.category = kawaraban_shared::event_log::error::category::INFRASTRUCTURE,
               error.kind = kawaraban_shared::event_log::error::kind::QUEUE,
               "送信キューエラー: {}",
               msg
            );
            (
               StatusCode::INTERNAL_SERVER_ERROR,
               ErrorResponse::internal_error(),
            )
         }
      };

      (status, Json(body)).into_response()
   }
}
