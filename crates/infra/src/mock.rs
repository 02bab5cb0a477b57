//! # テスト用モック実装
//!
//! ユースケーステストで使用するインメモリのモックリポジトリとモックキュー。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! kawaraban-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{
   Arc,
   Mutex,
   atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use kawaraban_domain::{
   contact::ContactId,
   message::{Message, MessageId},
   sender::{Sender, SenderId},
   tag::TagId,
   template::{Template, TemplateId},
};

use crate::{
   db::{TransactionManager, TxContext},
   error::InfraError,
   queue::{OutboundEmailJob, OutboundQueue, QueueError},
   repository::{MessageRepository, SenderRepository, TagContactIndex, TemplateRepository},
};

// ===== MockMessageRepository =====

/// テスト用のモック MessageRepository
///
/// `mark_sent` は本物と同じ compare-and-set の意味論を持つ。
/// 格納済みメッセージが既に送信済みの場合は `InfraError::Conflict` を返す。
#[derive(Clone, Default)]
pub struct MockMessageRepository {
   messages: Arc<Mutex<Vec<Message>>>,
}

impl MockMessageRepository {
   pub fn new() -> Self {
      Self {
         messages: Arc::new(Mutex::new(Vec::new())),
      }
   }

   pub fn add_message(&self, message: Message) {
      self.messages.lock().unwrap().push(message);
   }

   /// 格納されている全メッセージのスナップショットを取得する
   pub fn messages(&self) -> Vec<Message> {
      self.messages.lock().unwrap().clone()
   }
}

#[async_trait]
impl MessageRepository for MockMessageRepository {
   async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, InfraError> {
      Ok(self
         .messages
         .lock()
         .unwrap()
         .iter()
         .find(|m| m.id() == id)
         .cloned())
   }

   async fn insert(&self, _tx: &mut TxContext, message: &Message) -> Result<(), InfraError> {
      let mut messages = self.messages.lock().unwrap();
      messages.push(message.clone());
      Ok(())
   }

   async fn mark_sent(&self, _tx: &mut TxContext, message: &Message) -> Result<(), InfraError> {
      let mut messages = self.messages.lock().unwrap();
      let Some(pos) = messages.iter().position(|m| m.id() == message.id()) else {
         return Err(InfraError::Unexpected(format!(
            "mark_sent 対象のメッセージが存在しません: {}",
            message.id()
         )));
      };
      if messages[pos].is_sent() {
         return Err(InfraError::Conflict {
            entity: "Message".to_string(),
            id:     message.id().as_uuid().to_string(),
         });
      }
      messages[pos] = message.clone();
      Ok(())
   }
}

// ===== MockTemplateRepository =====

#[derive(Clone, Default)]
pub struct MockTemplateRepository {
   templates: Arc<Mutex<Vec<Template>>>,
}

impl MockTemplateRepository {
   pub fn new() -> Self {
      Self {
         templates: Arc::new(Mutex::new(Vec::new())),
      }
   }

   pub fn add_template(&self, template: Template) {
      self.templates.lock().unwrap().push(template);
   }
}

#[async_trait]
impl TemplateRepository for MockTemplateRepository {
   async fn find_by_id(&self, id: &TemplateId) -> Result<Option<Template>, InfraError> {
      Ok(self
         .templates
         .lock()
         .unwrap()
         .iter()
         .find(|t| t.id() == id)
         .cloned())
   }
}

// ===== MockSenderRepository =====

#[derive(Clone, Default)]
pub struct MockSenderRepository {
   senders: Arc<Mutex<Vec<Sender>>>,
}

impl MockSenderRepository {
   pub fn new() -> Self {
      Self {
         senders: Arc::new(Mutex::new(Vec::new())),
      }
   }

   pub fn add_sender(&self, sender: Sender) {
      self.senders.lock().unwrap().push(sender);
   }
}

#[async_trait]
impl SenderRepository for MockSenderRepository {
   async fn find_by_id(&self, id: &SenderId) -> Result<Option<Sender>, InfraError> {
      Ok(self
         .senders
         .lock()
         .unwrap()
         .iter()
         .find(|s| s.id() == id)
         .cloned())
   }
}

// ===== MockTagContactIndex =====

/// テスト用のモック TagContactIndex
///
/// `add_membership` で登録した (タグ, コンタクト) の組を、登録順のまま返す。
#[derive(Clone, Default)]
pub struct MockTagContactIndex {
   memberships: Arc<Mutex<Vec<(TagId, ContactId)>>>,
}

impl MockTagContactIndex {
   pub fn new() -> Self {
      Self {
         memberships: Arc::new(Mutex::new(Vec::new())),
      }
   }

   pub fn add_membership(&self, tag_id: TagId, contact_id: ContactId) {
      self.memberships.lock().unwrap().push((tag_id, contact_id));
   }
}

#[async_trait]
impl TagContactIndex for MockTagContactIndex {
   async fn find_contact_ids_by_tag(&self, tag_id: &TagId) -> Result<Vec<ContactId>, InfraError> {
      Ok(self
         .memberships
         .lock()
         .unwrap()
         .iter()
         .filter(|(t, _)| t == tag_id)
         .map(|(_, c)| c.clone())
         .collect())
   }
}

// ===== MockOutboundQueue =====

/// テスト用のモック送信キュー
///
/// 投入されたジョブを記録する。`set_fail(true)` で以降の投入を失敗させ、
/// 「永続化後のキュー失敗」のテストに使用する。
#[derive(Clone, Default)]
pub struct MockOutboundQueue {
   jobs: Arc<Mutex<Vec<OutboundEmailJob>>>,
   fail: Arc<AtomicBool>,
}

impl MockOutboundQueue {
   pub fn new() -> Self {
      Self {
         jobs: Arc::new(Mutex::new(Vec::new())),
         fail: Arc::new(AtomicBool::new(false)),
      }
   }

   /// 以降の `enqueue` を失敗させるかどうかを設定する
   pub fn set_fail(&self, fail: bool) {
      self.fail.store(fail, Ordering::SeqCst);
   }

   /// 投入済みジョブのスナップショットを取得する
   pub fn jobs(&self) -> Vec<OutboundEmailJob> {
      self.jobs.lock().unwrap().clone()
   }
}

#[async_trait]
impl OutboundQueue for MockOutboundQueue {
   async fn enqueue(&self, job: &OutboundEmailJob) -> Result<(), QueueError> {
      if self.fail.load(Ordering::SeqCst) {
         return Err(QueueError::Redis(redis::RedisError::from((
            redis::ErrorKind::Io,
            "mock failure",
         ))));
      }
      self.jobs.lock().unwrap().push(job.clone());
      Ok(())
   }
}

// ===== MockTransactionManager =====

/// テスト用のモック TransactionManager
///
/// Mock リポジトリはインメモリ実装のため、モックの TxContext を返すだけ。
#[derive(Clone, Default)]
pub struct MockTransactionManager;

impl MockTransactionManager {
   pub fn new() -> Self {
      Self
   }
}

#[async_trait]
impl TransactionManager for MockTransactionManager {
   async fn begin(&self) -> Result<TxContext, InfraError> {
      Ok(TxContext::mock())
   }
}
