//! # MessageRepository
//!
//! メッセージ集約の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **集約単位の読み込み**: メッセージ本体・タグ関連・配信先をまとめて復元
//! - **送信は高々一度**: `mark_sent` は `sent_at IS NULL` を条件とする
//!   compare-and-set で、並行する配信実行のうち一方だけを勝たせる
//! - **書き込みはトランザクション必須**: `&mut TxContext` を要求する

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kawaraban_domain::{
   contact::ContactId,
   message::{Message, MessageBody, MessageId, MessageRecord, Recipient, Subject},
   sender::SenderId,
   tag::TagId,
   template::TemplateId,
};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{db::TxContext, error::InfraError};

/// メッセージリポジトリトレイト
///
/// メッセージ集約の永続化操作を定義する。
#[async_trait]
pub trait MessageRepository: Send + Sync {
   /// ID でメッセージを取得する
   ///
   /// タグ関連と（送信済みの場合は）配信先を含む集約全体を復元する。
   ///
   /// # 戻り値
   ///
   /// - `Ok(Some(message))`: メッセージが見つかった場合
   /// - `Ok(None)`: メッセージが見つからない場合
   /// - `Err(_)`: データベースエラー
   async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, InfraError>;

   /// メッセージを新規保存する（下書き）
   ///
   /// タグ関連も同一トランザクションで保存する。
   async fn insert(&self, tx: &mut TxContext, message: &Message) -> Result<(), InfraError>;

   /// メッセージを送信済みとして保存する
   ///
   /// `sent_at IS NULL` の行だけを更新する compare-and-set。
   /// 更新対象が存在しない（= 既に送信済み）の場合は
   /// `InfraError::Conflict` を返し、呼び出し側が「送信済み」に変換する。
   /// 配信先レコードの挿入も同一トランザクションで行う。
   ///
   /// # 前提
   ///
   /// `message` は送信済み状態（`sent_at` が設定済み）であること。
   async fn mark_sent(&self, tx: &mut TxContext, message: &Message) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の MessageRepository
#[derive(Debug, Clone)]
pub struct PostgresMessageRepository {
   pool: PgPool,
}

impl PostgresMessageRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
   async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, InfraError> {
      let row = sqlx::query(
         r#"
            SELECT id, subject, body, sender_id, template_id,
                   sent_at, created_at, updated_at
            FROM messages
            WHERE id = $1
            "#,
      )
      .bind(id.as_uuid())
      .fetch_optional(&self.pool)
      .await?;

      let Some(row) = row else {
         return Ok(None);
      };

      let tag_rows = sqlx::query(
         r#"
            SELECT tag_id
            FROM message_tags
            WHERE message_id = $1
            ORDER BY created_at, tag_id
            "#,
      )
      .bind(id.as_uuid())
      .fetch_all(&self.pool)
      .await?;

      let tag_ids = tag_rows
         .into_iter()
         .map(|row| Ok(TagId::from_uuid(row.try_get::<Uuid, _>("tag_id")?)))
         .collect::<Result<Vec<_>, sqlx::Error>>()?;

      // 配信先はメッセージ行が送信済みのときだけ読む。
      // 下書きの行を読んだ直後に並行する mark_sent がコミットしても、
      // 下書きスナップショットに配信先が混ざらない。
      let sent_at: Option<DateTime<Utc>> = row.try_get("sent_at")?;
      let recipients = if sent_at.is_some() {
         let recipient_rows = sqlx::query(
            r#"
               SELECT contact_id
               FROM message_recipients
               WHERE message_id = $1
               ORDER BY created_at, contact_id
               "#,
         )
         .bind(id.as_uuid())
         .fetch_all(&self.pool)
         .await?;

         recipient_rows
            .into_iter()
            .map(|row| {
               Ok(Recipient::new(
                  id.clone(),
                  ContactId::from_uuid(row.try_get::<Uuid, _>("contact_id")?),
               ))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?
      } else {
         Vec::new()
      };

      let message = Message::from_db(MessageRecord {
         id: MessageId::from_uuid(row.try_get("id")?),
         subject: Subject::new(row.try_get::<String, _>("subject")?)
            .map_err(|e| InfraError::Unexpected(e.to_string()))?,
         body: MessageBody::new(row.try_get::<String, _>("body")?)
            .map_err(|e| InfraError::Unexpected(e.to_string()))?,
         sender_id: SenderId::from_uuid(row.try_get("sender_id")?),
         template_id: row
            .try_get::<Option<Uuid>, _>("template_id")?
            .map(TemplateId::from_uuid),
         tag_ids,
         sent_at,
         recipients,
         created_at: row.try_get("created_at")?,
         updated_at: row.try_get("updated_at")?,
      })
      .map_err(|e| InfraError::Unexpected(e.to_string()))?;

      Ok(Some(message))
   }

   async fn insert(&self, tx: &mut TxContext, message: &Message) -> Result<(), InfraError> {
      sqlx::query(
         r#"
            INSERT INTO messages (
                id, subject, body, sender_id, template_id,
                sent_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
      )
      .bind(message.id().as_uuid())
      .bind(message.subject().as_str())
      .bind(message.body().as_str())
      .bind(message.sender_id().as_uuid())
      .bind(message.template_id().map(|t| *t.as_uuid()))
      .bind(message.sent_at())
      .bind(message.created_at())
      .bind(message.updated_at())
      .execute(tx.conn())
      .await?;

      for tag_id in message.tag_ids() {
         sqlx::query(
            r#"
               INSERT INTO message_tags (message_id, tag_id, created_at)
               VALUES ($1, $2, $3)
               "#,
         )
         .bind(message.id().as_uuid())
         .bind(tag_id.as_uuid())
         .bind(message.created_at())
         .execute(tx.conn())
         .await?;
      }

      Ok(())
   }

   async fn mark_sent(&self, tx: &mut TxContext, message: &Message) -> Result<(), InfraError> {
      let Some(sent_at) = message.sent_at() else {
         return Err(InfraError::Unexpected(
            "mark_sent には送信済み状態のメッセージが必要です".to_string(),
         ));
      };

      let result = sqlx::query(
         r#"
            UPDATE messages
            SET body = $2, sent_at = $3, updated_at = $4
            WHERE id = $1 AND sent_at IS NULL
            "#,
      )
      .bind(message.id().as_uuid())
      .bind(message.body().as_str())
      .bind(sent_at)
      .bind(message.updated_at())
      .execute(tx.conn())
      .await?;

      if result.rows_affected() == 0 {
         return Err(InfraError::Conflict {
            entity: "Message".to_string(),
            id:     message.id().as_uuid().to_string(),
         });
      }

      for recipient in message.recipients() {
         sqlx::query(
            r#"
               INSERT INTO message_recipients (message_id, contact_id, created_at)
               VALUES ($1, $2, $3)
               "#,
         )
         .bind(recipient.message_id().as_uuid())
         .bind(recipient.contact_id().as_uuid())
         .bind(sent_at)
         .execute(tx.conn())
         .await?;
      }

      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   /// トレイトオブジェクトとして使用できることを確認
   #[test]
   fn test_トレイトはsendとsyncを実装している() {
      fn assert_send_sync<T: Send + Sync>() {}
      assert_send_sync::<Box<dyn MessageRepository>>();
   }
}
