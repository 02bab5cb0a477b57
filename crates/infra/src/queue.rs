//! # 送信キュー
//!
//! 配信ジョブを非同期送信ワーカーへ受け渡すキューモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `OutboundQueue` trait でキュー投入を抽象化
//! - **2 つの実装**: Redis（本番・開発）、Noop（テスト・ドライラン用）
//! - **環境変数切替**: `QUEUE_BACKEND` でランタイム選択
//!
//! メール送信そのもの（SMTP / API 配送）はキューの先のワーカーの責務であり、
//! このコアはジョブの投入までを担当する。

mod noop;
mod redis;

use async_trait::async_trait;
use kawaraban_domain::{contact::ContactId, message::MessageId, sender::SenderId};
pub use noop::NoopOutboundQueue;
pub use redis::RedisOutboundQueue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 送信キューエラー
#[derive(Debug, Error)]
pub enum QueueError {
   /// Redis への投入に失敗
   #[error("キューへの投入に失敗: {0}")]
   Redis(#[from] ::redis::RedisError),

   /// ジョブのシリアライズに失敗
   #[error("ジョブのシリアライズに失敗: {0}")]
   Serialization(#[from] serde_json::Error),
}

/// 配信ジョブ
///
/// 配信先 1 件ごとに 1 ジョブを投入する。送信ワーカーはこのペイロードだけで
/// 1 通のメールを組み立てられる。コンシューマは (message_id, contact_id) を
/// キーとして冪等に処理すること（同一ジョブの再投入があり得る）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmailJob {
   /// 配信元メッセージ ID
   pub message_id: MessageId,
   /// 配信先コンタクト ID
   pub contact_id: ContactId,
   /// 差出人 ID
   pub sender_id:  SenderId,
   /// 件名
   pub subject:    String,
   /// レンダリング済み本文
   pub body:       String,
}

/// 送信キュートレイト
///
/// 配信基盤の中核。ジョブ投入の具体的な方法を抽象化する。
/// Redis / Noop の 2 実装を環境変数で切り替える。
#[async_trait]
pub trait OutboundQueue: Send + Sync {
   /// 配信ジョブをキューへ投入する
   async fn enqueue(&self, job: &OutboundEmailJob) -> Result<(), QueueError>;
}
