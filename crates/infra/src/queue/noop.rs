//! # Noop キュー実装
//!
//! 実際には何も投入せず、ログ出力のみ行う実装。
//! ローカル開発で Redis を立てずに配信フローを確認する用途。

use tracing::info;

use super::{OutboundEmailJob, OutboundQueue, QueueError};

/// 何もしない送信キュー
#[derive(Debug, Clone, Default)]
pub struct NoopOutboundQueue;

impl NoopOutboundQueue {
   pub fn new() -> Self {
      Self
   }
}

#[async_trait::async_trait]
impl OutboundQueue for NoopOutboundQueue {
   async fn enqueue(&self, job: &OutboundEmailJob) -> Result<(), QueueError> {
      info!(
         message_id = %job.message_id,
         contact_id = %job.contact_id,
         subject = %job.subject,
         "配信ジョブ投入をスキップ（noop バックエンド）"
      );
      Ok(())
   }
}
