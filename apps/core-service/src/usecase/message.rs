//! # メッセージ配信ユースケース
//!
//! メッセージの取得・配信オーケストレーションを実装する。
//!
//! ## 設計方針
//!
//! - **配信は高々一度**: 事前チェックと `mark_sent` の compare-and-set の二段構え
//! - **永続化してから投入**: 送信済みマークの確定後に配信ジョブを投入する。
//!   投入失敗時もマークは取り消さない（再配信より未配信通知を選ぶ）

mod query;
mod recipient_resolver;
mod send;
mod template_renderer;

use std::sync::Arc;

use kawaraban_domain::{
    clock::Clock,
    message::MessageId,
    sender::SenderId,
    template::TemplateId,
};
use kawaraban_infra::{
    InfraError,
    db::TransactionManager,
    queue::{OutboundQueue, QueueError},
    repository::{MessageRepository, SenderRepository, TagContactIndex, TemplateRepository},
};
pub use template_renderer::TemplateRenderError;
use thiserror::Error;

/// メッセージ配信の失敗理由
#[derive(Debug, Error)]
pub enum SendMessageError {
    /// メッセージが存在しない
    #[error("メッセージが見つかりません: {0}")]
    InvalidMessage(MessageId),

    /// 差出人が存在しない（参照整合性の破れ）
    #[error("差出人が見つかりません: {0}")]
    InvalidSender(SenderId),

    /// テンプレートが存在しない（参照整合性の破れ）
    #[error("テンプレートが見つかりません: {0}")]
    InvalidTemplate(TemplateId),

    /// 既に送信済み
    #[error("メッセージは既に送信済みです: {0}")]
    MessageAlreadySent(MessageId),

    /// テンプレートのレンダリングに失敗
    #[error(transparent)]
    Render(#[from] TemplateRenderError),

    /// 永続化層のエラー
    #[error("リポジトリエラー: {0}")]
    Repository(#[from] InfraError),

    /// 配信ジョブの投入に失敗（送信済みマークは確定済み）
    #[error("配信ジョブの投入に失敗: {0}")]
    Dispatch(#[from] QueueError),
}

/// メッセージユースケース実装
///
/// 配信オーケストレーションに必要な依存を `Arc<dyn Trait>` で保持する。
pub struct MessageUseCaseImpl {
    message_repo: Arc<dyn MessageRepository>,
    template_repo: Arc<dyn TemplateRepository>,
    sender_repo: Arc<dyn SenderRepository>,
    tag_contact_index: Arc<dyn TagContactIndex>,
    outbound_queue: Arc<dyn OutboundQueue>,
    tx_manager: Arc<dyn TransactionManager>,
    clock: Arc<dyn Clock>,
}

impl MessageUseCaseImpl {
    /// 新しいメッセージユースケースを作成
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        template_repo: Arc<dyn TemplateRepository>,
        sender_repo: Arc<dyn SenderRepository>,
        tag_contact_index: Arc<dyn TagContactIndex>,
        outbound_queue: Arc<dyn OutboundQueue>,
        tx_manager: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            message_repo,
            template_repo,
            sender_repo,
            tag_contact_index,
            outbound_queue,
            tx_manager,
            clock,
        }
    }
}
