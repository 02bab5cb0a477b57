//! # TagContactIndex
//!
//! タグ購読の読み取りインデックス。
//! コンタクト本体は上流の購読者管理が所有するため、
//! 配信コアはタグに紐づくコンタクト ID の一覧だけを参照する。

use async_trait::async_trait;
use kawaraban_domain::{contact::ContactId, tag::TagId};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::InfraError;

/// タグ購読インデックストレイト
///
/// タグを購読しているコンタクト ID を解決する。
#[async_trait]
pub trait TagContactIndex: Send + Sync {
   /// タグを購読しているコンタクト ID の一覧を取得する
   ///
   /// # 戻り値
   ///
   /// - `Ok(Vec<ContactId>)`: 購読者一覧（購読者なしの場合は空）
   /// - `Err(_)`: データベースエラー
   async fn find_contact_ids_by_tag(&self, tag_id: &TagId) -> Result<Vec<ContactId>, InfraError>;
}

/// PostgreSQL 実装の TagContactIndex
#[derive(Debug, Clone)]
pub struct PostgresTagContactIndex {
   pool: PgPool,
}

impl PostgresTagContactIndex {
   /// 新しいインデックスインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl TagContactIndex for PostgresTagContactIndex {
   async fn find_contact_ids_by_tag(&self, tag_id: &TagId) -> Result<Vec<ContactId>, InfraError> {
      let rows = sqlx::query(
         r#"
            SELECT contact_id
            FROM contact_tags
            WHERE tag_id = $1
            ORDER BY created_at, contact_id
            "#,
      )
      .bind(tag_id.as_uuid())
      .fetch_all(&self.pool)
      .await?;

      let contact_ids = rows
         .into_iter()
         .map(|row| Ok(ContactId::from_uuid(row.try_get::<Uuid, _>("contact_id")?)))
         .collect::<Result<Vec<_>, sqlx::Error>>()?;

      Ok(contact_ids)
   }
}
