//! # TemplateRepository
//!
//! テンプレートの読み取りを担当するリポジトリ。
//! 配信コアからは ID による参照のみ行う。

use async_trait::async_trait;
use kawaraban_domain::template::{Template, TemplateContent, TemplateId, TemplateTitle};
use sqlx::{PgPool, Row};

use crate::error::InfraError;

/// テンプレートリポジトリトレイト
#[async_trait]
pub trait TemplateRepository: Send + Sync {
   /// ID でテンプレートを取得する
   ///
   /// # 戻り値
   ///
   /// - `Ok(Some(template))`: テンプレートが見つかった場合
   /// - `Ok(None)`: テンプレートが見つからない場合
   /// - `Err(_)`: データベースエラー
   async fn find_by_id(&self, id: &TemplateId) -> Result<Option<Template>, InfraError>;
}

/// PostgreSQL 実装の TemplateRepository
#[derive(Debug, Clone)]
pub struct PostgresTemplateRepository {
   pool: PgPool,
}

impl PostgresTemplateRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
   async fn find_by_id(&self, id: &TemplateId) -> Result<Option<Template>, InfraError> {
      let row = sqlx::query(
         r#"
            SELECT id, title, content, created_at, updated_at
            FROM templates
            WHERE id = $1
            "#,
      )
      .bind(id.as_uuid())
      .fetch_optional(&self.pool)
      .await?;

      let Some(row) = row else {
         return Ok(None);
      };

      let template = Template::from_db(
         TemplateId::from_uuid(row.try_get("id")?),
         TemplateTitle::new(row.try_get::<String, _>("title")?)
            .map_err(|e| InfraError::Unexpected(e.to_string()))?,
         TemplateContent::new(row.try_get::<String, _>("content")?)
            .map_err(|e| InfraError::Unexpected(e.to_string()))?,
         row.try_get("created_at")?,
         row.try_get("updated_at")?,
      );

      Ok(Some(template))
   }
}
