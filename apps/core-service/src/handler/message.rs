//! # メッセージハンドラ
//!
//! メッセージの取得と配信のエンドポイントを提供する。

use std::sync::Arc;

use axum::{
   Json,
   extract::{Path, State},
   http::StatusCode,
   response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use kawaraban_domain::message::{Message, MessageId};
use kawaraban_shared::ApiResponse;
use serde::Serialize;
use uuid::Uuid;

use crate::{error::CoreError, usecase::MessageUseCaseImpl};

/// メッセージハンドラの共有状態
pub struct MessageState {
   pub usecase: MessageUseCaseImpl,
}

/// メッセージ DTO
#[derive(Debug, Serialize)]
pub struct MessageDto {
   pub id: Uuid,
   pub subject: String,
   pub body: String,
   pub sender_id: Uuid,
   pub template_id: Option<Uuid>,
   pub tag_ids: Vec<Uuid>,
   pub status: String,
   pub sent_at: Option<DateTime<Utc>>,
   pub recipient_contact_ids: Vec<Uuid>,
   pub created_at: DateTime<Utc>,
   pub updated_at: DateTime<Utc>,
}

impl MessageDto {
   fn from_message(message: &Message) -> Self {
      Self {
         id: *message.id().as_uuid(),
         subject: message.subject().as_str().to_string(),
         body: message.body().as_str().to_string(),
         sender_id: *message.sender_id().as_uuid(),
         template_id: message.template_id().map(|t| *t.as_uuid()),
         tag_ids: message.tag_ids().iter().map(|t| *t.as_uuid()).collect(),
         status: message.status().to_string(),
         sent_at: message.sent_at(),
         recipient_contact_ids: message
            .recipients()
            .iter()
            .map(|r| *r.contact_id().as_uuid())
            .collect(),
         created_at: message.created_at(),
         updated_at: message.updated_at(),
      }
   }
}

/// メッセージの詳細を取得する
///
/// ## エンドポイント
/// GET /internal/messages/{id}
pub async fn get_message(
   State(state): State<Arc<MessageState>>,
   Path(id): Path<Uuid>,
) -> Result<Response, CoreError> {
   let message = state.usecase.get_message(MessageId::from_uuid(id)).await?;

   let response = ApiResponse::new(MessageDto::from_message(&message));
   Ok((StatusCode::OK, Json(response)).into_response())
}

/// メッセージを配信する
///
/// ## エンドポイント
/// POST /internal/messages/{id}/send
///
/// ## 処理フロー
/// 1. パスパラメータから ID を取得
/// 2. 配信ユースケースを呼び出し
/// 3. 送信済みメッセージを返す
pub async fn send_message(
   State(state): State<Arc<MessageState>>,
   Path(id): Path<Uuid>,
) -> Result<Response, CoreError> {
   let message = state.usecase.send_message(MessageId::from_uuid(id)).await?;

   let response = ApiResponse::new(MessageDto::from_message(&message));
   Ok((StatusCode::OK, Json(response)).into_response())
}

#[cfg(test)]
mod tests {
   use chrono::Utc;
   use kawaraban_domain::{
      contact::ContactId,
      message::{MessageBody, NewMessage, Subject},
      sender::SenderId,
      tag::TagId,
   };

   use super::*;

   #[test]
   fn test_dtoが下書きメッセージを正しく変換する() {
      let now = Utc::now();
      let message = Message::new(NewMessage {
         id: MessageId::new(),
         subject: Subject::new("今月のお知らせ").unwrap(),
         body: MessageBody::new("本文").unwrap(),
         sender_id: SenderId::new(),
         template_id: None,
         tag_ids: vec![TagId::new()],
         now,
      });

      let dto = MessageDto::from_message(&message);

      assert_eq!(dto.status, "draft");
      assert_eq!(dto.sent_at, None);
      assert!(dto.recipient_contact_ids.is_empty());
      assert_eq!(dto.tag_ids.len(), 1);
   }

   #[test]
   fn test_dtoが送信済みメッセージを正しく変換する() {
      let now = Utc::now();
      let contact_id = ContactId::new();
      let message = Message::new(NewMessage {
         id: MessageId::new(),
         subject: Subject::new("今月のお知らせ").unwrap(),
         body: MessageBody::new("本文").unwrap(),
         sender_id: SenderId::new(),
         template_id: None,
         tag_ids: Vec::new(),
         now,
      })
      .delivered(
         MessageBody::new("最終本文").unwrap(),
         vec![contact_id.clone()],
         now,
      )
      .unwrap();

      let dto = MessageDto::from_message(&message);

      assert_eq!(dto.status, "sent");
      assert_eq!(dto.sent_at, Some(now));
      assert_eq!(dto.body, "最終本文");
      assert_eq!(dto.recipient_contact_ids, vec![*contact_id.as_uuid()]);
   }
}
