//! # SenderRepository
//!
//! 差出人の読み取りを担当するリポジトリ。
//! 差出人は独立して削除され得るため、配信時の存在チェックに使用される。

use async_trait::async_trait;
use kawaraban_domain::sender::{EmailAddress, Sender, SenderId, SenderName};
use sqlx::{PgPool, Row};

use crate::error::InfraError;

/// 差出人リポジトリトレイト
#[async_trait]
pub trait SenderRepository: Send + Sync {
   /// ID で差出人を取得する
   ///
   /// # 戻り値
   ///
   /// - `Ok(Some(sender))`: 差出人が見つかった場合
   /// - `Ok(None)`: 差出人が見つからない場合
   /// - `Err(_)`: データベースエラー
   async fn find_by_id(&self, id: &SenderId) -> Result<Option<Sender>, InfraError>;
}

/// PostgreSQL 実装の SenderRepository
#[derive(Debug, Clone)]
pub struct PostgresSenderRepository {
   pool: PgPool,
}

impl PostgresSenderRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl SenderRepository for PostgresSenderRepository {
   async fn find_by_id(&self, id: &SenderId) -> Result<Option<Sender>, InfraError> {
      let row = sqlx::query(
         r#"
            SELECT id, name, email, created_at, updated_at
            FROM senders
            WHERE id = $1
            "#,
      )
      .bind(id.as_uuid())
      .fetch_optional(&self.pool)
      .await?;

      let Some(row) = row else {
         return Ok(None);
      };

      let sender = Sender::from_db(
         SenderId::from_uuid(row.try_get("id")?),
         SenderName::new(row.try_get::<String, _>("name")?)
            .map_err(|e| InfraError::Unexpected(e.to_string()))?,
         EmailAddress::new(row.try_get::<String, _>("email")?)
            .map_err(|e| InfraError::Unexpected(e.to_string()))?,
         row.try_get("created_at")?,
         row.try_get("updated_at")?,
      );

      Ok(Some(sender))
   }
}
