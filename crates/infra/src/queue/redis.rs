//! # Redis キュー実装
//!
//! Redis のリストを送信キューとして使用する実装。
//! ジョブを JSON にシリアライズし、設定されたリストキーへ LPUSH する。
//! 送信ワーカーは BRPOP で FIFO に取り出す想定。

use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::debug;

use super::{OutboundEmailJob, OutboundQueue, QueueError};

/// Redis 実装の送信キュー
///
/// `ConnectionManager` が再接続を担うため、Clone して共有できる。
#[derive(Clone)]
pub struct RedisOutboundQueue {
   conn:      ConnectionManager,
   queue_key: String,
}

impl RedisOutboundQueue {
   /// Redis へ接続してキューを作成する
   ///
   /// # 引数
   ///
   /// - `redis_url`: 接続先 URL（例: `redis://localhost:6379`）
   /// - `queue_key`: ジョブを積むリストのキー
   pub async fn connect(redis_url: &str, queue_key: String) -> Result<Self, QueueError> {
      let client = redis::Client::open(redis_url)?;
      let conn = ConnectionManager::new(client).await?;
      Ok(Self { conn, queue_key })
   }
}

#[async_trait::async_trait]
impl OutboundQueue for RedisOutboundQueue {
   async fn enqueue(&self, job: &OutboundEmailJob) -> Result<(), QueueError> {
      let payload = serde_json::to_string(job)?;

      let mut conn = self.conn.clone();
      let _: () = conn.lpush(&self.queue_key, payload).await?;

      debug!(
         message_id = %job.message_id,
         contact_id = %job.contact_id,
         queue_key = %self.queue_key,
         "配信ジョブを投入"
      );

      Ok(())
   }
}
