//! メッセージの取得

use kawaraban_domain::message::{Message, MessageId};

use crate::usecase::message::{MessageUseCaseImpl, SendMessageError};

impl MessageUseCaseImpl {
    /// メッセージの詳細を取得する
    ///
    /// ## 戻り値
    ///
    /// - `Ok(message)`: メッセージ（下書き・送信済みいずれも）
    /// - `Err(InvalidMessage)`: メッセージが見つからない場合
    /// - `Err(Repository)`: データベースエラー
    pub async fn get_message(&self, id: MessageId) -> Result<Message, SendMessageError> {
        self.message_repo
            .find_by_id(&id)
            .await?
            .ok_or(SendMessageError::InvalidMessage(id))
    }
}
