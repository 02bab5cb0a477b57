//! メッセージの配信

use kawaraban_domain::message::{Message, MessageId};
use kawaraban_infra::{InfraError, queue::OutboundEmailJob};
use kawaraban_shared::{event_log::event, log_business_event};

use crate::usecase::message::{
    MessageUseCaseImpl,
    SendMessageError,
    recipient_resolver,
    template_renderer,
};

impl MessageUseCaseImpl {
    /// メッセージを配信する
    ///
    /// 下書きメッセージを送信済みに遷移させ、配信先ごとに配信ジョブを投入する。
    ///
    /// ## 処理フロー
    ///
    /// 1. メッセージを取得
    /// 2. 送信済みでないか事前チェック
    /// 3. 差出人を取得
    /// 4. テンプレートがあれば取得し、本文をレンダリング
    /// 5. タグ購読から配信先を解決（重複排除）
    /// 6. 送信済み状態に遷移（`sent_at` 確定）
    /// 7. トランザクション内で compare-and-set 保存
    /// 8. 配信先ごとに配信ジョブを投入
    ///
    /// 「送信は高々一度」は手順 2 の事前チェックではなく手順 7 の
    /// compare-and-set が最終的に保証する。並行実行で負けた側は
    /// `MessageAlreadySent` を受け取り、ジョブは投入しない。
    ///
    /// 手順 8 の投入失敗時、送信済みマークは取り消さない。
    /// 同じメッセージの再配信（受信者への二重送信）より、
    /// 一部未投入を運用で救済する方を選ぶ。
    ///
    /// ## エラー
    ///
    /// - `InvalidMessage`: メッセージが見つからない場合
    /// - `InvalidSender`: 差出人が見つからない場合
    /// - `InvalidTemplate`: テンプレートが見つからない場合
    /// - `MessageAlreadySent`: 既に送信済みの場合
    /// - `Render`: テンプレートのレンダリングに失敗した場合
    /// - `Dispatch`: ジョブ投入に失敗した場合（送信済みマークは確定済み）
    pub async fn send_message(&self, message_id: MessageId) -> Result<Message, SendMessageError> {
        // 1. メッセージを取得
        let message = self
            .message_repo
            .find_by_id(&message_id)
            .await?
            .ok_or_else(|| SendMessageError::InvalidMessage(message_id.clone()))?;

        // 2. 送信済みでないか事前チェック（早期リターン）
        if message.is_sent() {
            return Err(SendMessageError::MessageAlreadySent(message_id));
        }

        // 3. 差出人を取得
        let sender = self
            .sender_repo
            .find_by_id(message.sender_id())
            .await?
            .ok_or_else(|| SendMessageError::InvalidSender(message.sender_id().clone()))?;

        // 4. テンプレートがあれば取得し、本文をレンダリング
        let final_body = match message.template_id() {
            Some(template_id) => {
                let template = self
                    .template_repo
                    .find_by_id(template_id)
                    .await?
                    .ok_or_else(|| SendMessageError::InvalidTemplate(template_id.clone()))?;
                template_renderer::render(&template, message.body())?
            }
            None => message.body().clone(),
        };

        // 5. タグ購読から配信先を解決
        let contact_ids =
            recipient_resolver::resolve(self.tag_contact_index.as_ref(), message.tag_ids())
                .await?;

        // 6. 送信済み状態に遷移
        let now = self.clock.now();
        let sent_message = message
            .delivered(final_body, contact_ids, now)
            .map_err(|_| SendMessageError::MessageAlreadySent(message_id.clone()))?;

        // 7. トランザクション内で compare-and-set 保存
        let mut tx = self.tx_manager.begin().await?;
        match self.message_repo.mark_sent(&mut tx, &sent_message).await {
            Ok(()) => {}
            Err(InfraError::Conflict { .. }) => {
                return Err(SendMessageError::MessageAlreadySent(message_id));
            }
            Err(e) => return Err(SendMessageError::Repository(e)),
        }
        tx.commit().await?;

        log_business_event!(
            event.category = event::category::MESSAGE,
            event.action = event::action::MESSAGE_SENT,
            event.entity_type = event::entity_type::MESSAGE,
            event.entity_id = %message_id,
            event.result = event::result::SUCCESS,
            recipient_count = sent_message.recipients().len(),
        );

        // 8. 配信先ごとに配信ジョブを投入
        for recipient in sent_message.recipients() {
            let job = OutboundEmailJob {
                message_id: message_id.clone(),
                contact_id: recipient.contact_id().clone(),
                sender_id:  sender.id().clone(),
                subject:    sent_message.subject().as_str().to_string(),
                body:       sent_message.body().as_str().to_string(),
            };

            if let Err(e) = self.outbound_queue.enqueue(&job).await {
                log_business_event!(
                    event.category = event::category::DELIVERY,
                    event.action = event::action::DELIVERY_ENQUEUE_FAILED,
                    event.entity_type = event::entity_type::OUTBOUND_JOB,
                    event.entity_id = %message_id,
                    event.result = event::result::FAILURE,
                    contact_id = %recipient.contact_id(),
                );
                return Err(SendMessageError::Dispatch(e));
            }
        }

        log_business_event!(
            event.category = event::category::DELIVERY,
            event.action = event::action::DELIVERY_ENQUEUED,
            event.entity_type = event::entity_type::OUTBOUND_JOB,
            event.entity_id = %message_id,
            event.result = event::result::SUCCESS,
            job_count = sent_message.recipients().len(),
        );

        Ok(sent_message)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use kawaraban_domain::{
        clock::FixedClock,
        contact::ContactId,
        message::{MessageBody, MessageStatus, NewMessage, Subject},
        sender::{EmailAddress, Sender, SenderId, SenderName},
        tag::TagId,
        template::{Template, TemplateContent, TemplateId, TemplateTitle},
    };
    use kawaraban_infra::{
        db::TxContext,
        mock::{
            MockMessageRepository,
            MockOutboundQueue,
            MockSenderRepository,
            MockTagContactIndex,
            MockTemplateRepository,
            MockTransactionManager,
        },
        repository::MessageRepository,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::usecase::TemplateRenderError;

    struct Fixture {
        message_repo: MockMessageRepository,
        template_repo: MockTemplateRepository,
        sender_repo: MockSenderRepository,
        tag_contact_index: MockTagContactIndex,
        outbound_queue: MockOutboundQueue,
        now: chrono::DateTime<Utc>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                message_repo: MockMessageRepository::new(),
                template_repo: MockTemplateRepository::new(),
                sender_repo: MockSenderRepository::new(),
                tag_contact_index: MockTagContactIndex::new(),
                outbound_queue: MockOutboundQueue::new(),
                now: Utc::now(),
            }
        }

        fn add_sender(&self) -> Sender {
            let sender = Sender::from_db(
                SenderId::new(),
                SenderName::new("配信チーム").unwrap(),
                EmailAddress::new("news@example.com").unwrap(),
                self.now,
                self.now,
            );
            self.sender_repo.add_sender(sender.clone());
            sender
        }

        fn add_template(&self, content: &str) -> Template {
            let template = Template::from_db(
                TemplateId::new(),
                TemplateTitle::new("お知らせ用").unwrap(),
                TemplateContent::new(content).unwrap(),
                self.now,
                self.now,
            );
            self.template_repo.add_template(template.clone());
            template
        }

        fn add_draft(
            &self,
            sender_id: SenderId,
            template_id: Option<TemplateId>,
            tag_ids: Vec<TagId>,
        ) -> Message {
            let message = Message::new(NewMessage {
                id: MessageId::new(),
                subject: Subject::new("今月のお知らせ").unwrap(),
                body: MessageBody::new("The long enough message body").unwrap(),
                sender_id,
                template_id,
                tag_ids,
                now: self.now,
            });
            self.message_repo.add_message(message.clone());
            message
        }

        fn sut(&self) -> MessageUseCaseImpl {
            MessageUseCaseImpl::new(
                Arc::new(self.message_repo.clone()),
                Arc::new(self.template_repo.clone()),
                Arc::new(self.sender_repo.clone()),
                Arc::new(self.tag_contact_index.clone()),
                Arc::new(self.outbound_queue.clone()),
                Arc::new(MockTransactionManager::new()),
                Arc::new(FixedClock::new(self.now)),
            )
        }
    }

    #[tokio::test]
    async fn test_send_message_テンプレートなしの正常系() {
        // Arrange
        let fixture = Fixture::new();
        let sender = fixture.add_sender();
        let tag = TagId::new();
        let contact = ContactId::new();
        fixture.tag_contact_index.add_membership(tag.clone(), contact.clone());
        let message = fixture.add_draft(sender.id().clone(), None, vec![tag]);

        // Act
        let result = fixture.sut().send_message(message.id().clone()).await;

        // Assert
        let sent = result.unwrap();
        assert_eq!(sent.status(), MessageStatus::Sent);
        assert_eq!(sent.sent_at(), Some(fixture.now));
        // テンプレートなしの場合、本文はそのまま
        assert_eq!(sent.body().as_str(), "The long enough message body");

        // 配信先 1 件につきジョブ 1 件
        let jobs = fixture.outbound_queue.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(&jobs[0].message_id, message.id());
        assert_eq!(jobs[0].contact_id, contact);
        assert_eq!(&jobs[0].sender_id, sender.id());
        assert_eq!(jobs[0].subject, "今月のお知らせ");
        assert_eq!(jobs[0].body, "The long enough message body");

        // リポジトリにも送信済みで保存されている
        let stored = &fixture.message_repo.messages()[0];
        assert!(stored.is_sent());
        assert_eq!(stored.recipients().len(), 1);
    }

    #[tokio::test]
    async fn test_send_message_テンプレートありで本文がレンダリングされる() {
        // Arrange
        let fixture = Fixture::new();
        let sender = fixture.add_sender();
        let template = fixture.add_template("Custom template with {{ message_content }} variable.");
        let tag = TagId::new();
        fixture
            .tag_contact_index
            .add_membership(tag.clone(), ContactId::new());
        let message = fixture.add_draft(
            sender.id().clone(),
            Some(template.id().clone()),
            vec![tag],
        );

        // Act
        let sent = fixture
            .sut()
            .send_message(message.id().clone())
            .await
            .unwrap();

        // Assert
        assert_eq!(
            sent.body().as_str(),
            "Custom template with The long enough message body variable."
        );
        let jobs = fixture.outbound_queue.jobs();
        assert_eq!(
            jobs[0].body,
            "Custom template with The long enough message body variable."
        );
    }

    #[tokio::test]
    async fn test_send_message_メッセージが見つからない場合はinvalid_message() {
        // Arrange
        let fixture = Fixture::new();
        fixture.add_sender();

        // Act
        let result = fixture.sut().send_message(MessageId::new()).await;

        // Assert
        assert!(matches!(result, Err(SendMessageError::InvalidMessage(_))));
        assert!(fixture.outbound_queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_send_message_差出人が見つからない場合はinvalid_sender() {
        // Arrange: 差出人をリポジトリに登録しない
        let fixture = Fixture::new();
        let message = fixture.add_draft(SenderId::new(), None, Vec::new());

        // Act
        let result = fixture.sut().send_message(message.id().clone()).await;

        // Assert
        assert!(matches!(result, Err(SendMessageError::InvalidSender(_))));
        // メッセージは下書きのまま
        assert!(!fixture.message_repo.messages()[0].is_sent());
        assert!(fixture.outbound_queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_send_message_テンプレートが見つからない場合はinvalid_template() {
        // Arrange: テンプレート ID を参照するがリポジトリに登録しない
        let fixture = Fixture::new();
        let sender = fixture.add_sender();
        let message = fixture.add_draft(
            sender.id().clone(),
            Some(TemplateId::new()),
            Vec::new(),
        );

        // Act
        let result = fixture.sut().send_message(message.id().clone()).await;

        // Assert
        assert!(matches!(result, Err(SendMessageError::InvalidTemplate(_))));
        assert!(!fixture.message_repo.messages()[0].is_sent());
        assert!(fixture.outbound_queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_send_message_レンダリング失敗時は送信されない() {
        // Arrange: プレースホルダのないテンプレート
        let fixture = Fixture::new();
        let sender = fixture.add_sender();
        let template = fixture.add_template("プレースホルダのないテンプレート");
        let message = fixture.add_draft(
            sender.id().clone(),
            Some(template.id().clone()),
            Vec::new(),
        );

        // Act
        let result = fixture.sut().send_message(message.id().clone()).await;

        // Assert
        assert!(matches!(
            result,
            Err(SendMessageError::Render(
                TemplateRenderError::PlaceholderMissing
            ))
        ));
        assert!(!fixture.message_repo.messages()[0].is_sent());
        assert!(fixture.outbound_queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_send_message_送信済みの場合はalready_sent() {
        // Arrange
        let fixture = Fixture::new();
        let sender = fixture.add_sender();
        let message = fixture.add_draft(sender.id().clone(), None, Vec::new());
        let sut = fixture.sut();

        // 1 回目の配信で送信済みにする
        sut.send_message(message.id().clone()).await.unwrap();

        // Act: 2 回目の配信
        let result = sut.send_message(message.id().clone()).await;

        // Assert
        assert!(matches!(
            result,
            Err(SendMessageError::MessageAlreadySent(_))
        ));
    }

    #[tokio::test]
    async fn test_send_message_2回呼んでもジョブは1回分しか投入されない() {
        // Arrange
        let fixture = Fixture::new();
        let sender = fixture.add_sender();
        let tag = TagId::new();
        fixture
            .tag_contact_index
            .add_membership(tag.clone(), ContactId::new());
        fixture
            .tag_contact_index
            .add_membership(tag.clone(), ContactId::new());
        let message = fixture.add_draft(sender.id().clone(), None, vec![tag]);
        let sut = fixture.sut();

        // Act
        sut.send_message(message.id().clone()).await.unwrap();
        let second = sut.send_message(message.id().clone()).await;

        // Assert
        assert!(second.is_err());
        assert_eq!(fixture.outbound_queue.jobs().len(), 2);
    }

    #[tokio::test]
    async fn test_send_message_複数タグを購読するコンタクトへのジョブは1件() {
        // Arrange
        let fixture = Fixture::new();
        let sender = fixture.add_sender();
        let tag_a = TagId::new();
        let tag_b = TagId::new();
        let shared_contact = ContactId::new();
        let other_contact = ContactId::new();
        fixture
            .tag_contact_index
            .add_membership(tag_a.clone(), shared_contact.clone());
        fixture
            .tag_contact_index
            .add_membership(tag_b.clone(), shared_contact.clone());
        fixture
            .tag_contact_index
            .add_membership(tag_b.clone(), other_contact.clone());
        let message = fixture.add_draft(sender.id().clone(), None, vec![tag_a, tag_b]);

        // Act
        let sent = fixture
            .sut()
            .send_message(message.id().clone())
            .await
            .unwrap();

        // Assert
        assert_eq!(sent.recipients().len(), 2);
        let jobs = fixture.outbound_queue.jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].contact_id, shared_contact);
        assert_eq!(jobs[1].contact_id, other_contact);
    }

    #[tokio::test]
    async fn test_send_message_購読者がいなくても送信済みになりジョブは0件() {
        // Arrange
        let fixture = Fixture::new();
        let sender = fixture.add_sender();
        let message = fixture.add_draft(sender.id().clone(), None, vec![TagId::new()]);

        // Act
        let sent = fixture
            .sut()
            .send_message(message.id().clone())
            .await
            .unwrap();

        // Assert
        assert!(sent.is_sent());
        assert!(sent.recipients().is_empty());
        assert!(fixture.outbound_queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_send_message_ジョブ投入失敗時も送信済みマークは確定する() {
        // Arrange
        let fixture = Fixture::new();
        let sender = fixture.add_sender();
        let tag = TagId::new();
        fixture
            .tag_contact_index
            .add_membership(tag.clone(), ContactId::new());
        let message = fixture.add_draft(sender.id().clone(), None, vec![tag]);
        fixture.outbound_queue.set_fail(true);

        // Act
        let result = fixture.sut().send_message(message.id().clone()).await;

        // Assert
        assert!(matches!(result, Err(SendMessageError::Dispatch(_))));
        // 送信済みマークは取り消されない
        assert!(fixture.message_repo.messages()[0].is_sent());
        assert!(fixture.outbound_queue.jobs().is_empty());
    }

    /// 事前チェックをすり抜けた並行実行をシミュレートするリポジトリ
    ///
    /// `find_by_id` は下書きを返すが、`mark_sent` は常に競合する
    /// （別の実行が先に compare-and-set に勝った状況）。
    #[derive(Clone)]
    struct RacingMessageRepository {
        inner: MockMessageRepository,
    }

    #[async_trait]
    impl MessageRepository for RacingMessageRepository {
        async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, InfraError> {
            self.inner.find_by_id(id).await
        }

        async fn insert(&self, tx: &mut TxContext, message: &Message) -> Result<(), InfraError> {
            self.inner.insert(tx, message).await
        }

        async fn mark_sent(&self, _tx: &mut TxContext, message: &Message) -> Result<(), InfraError> {
            Err(InfraError::Conflict {
                entity: "Message".to_string(),
                id:     message.id().as_uuid().to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_send_message_casで負けた側はalready_sentになりジョブを投入しない() {
        // Arrange
        let fixture = Fixture::new();
        let sender = fixture.add_sender();
        let tag = TagId::new();
        fixture
            .tag_contact_index
            .add_membership(tag.clone(), ContactId::new());
        let message = fixture.add_draft(sender.id().clone(), None, vec![tag]);

        let sut = MessageUseCaseImpl::new(
            Arc::new(RacingMessageRepository {
                inner: fixture.message_repo.clone(),
            }),
            Arc::new(fixture.template_repo.clone()),
            Arc::new(fixture.sender_repo.clone()),
            Arc::new(fixture.tag_contact_index.clone()),
            Arc::new(fixture.outbound_queue.clone()),
            Arc::new(MockTransactionManager::new()),
            Arc::new(FixedClock::new(fixture.now)),
        );

        // Act
        let result = sut.send_message(message.id().clone()).await;

        // Assert
        assert!(matches!(
            result,
            Err(SendMessageError::MessageAlreadySent(_))
        ));
        assert!(fixture.outbound_queue.jobs().is_empty());
    }
}
