//! # メッセージ
//!
//! 一括配信の単位となるメッセージ集約。
//! 件名・本文とタグ・差出人・テンプレートへの参照を保持し、
//! 下書き → 送信済みのライフサイクルを持つ。
//!
//! 状態遷移は ADT（代数的データ型）で表現し、不正な状態を型レベルで防止する。
//! `sent_at` は高々一度だけ設定され、送信済みメッセージは配信に関して不変になる。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    contact::ContactId,
    sender::SenderId,
    tag::TagId,
    template::TemplateId,
};

define_uuid_id! {
    /// メッセージ ID
    pub struct MessageId;
}

define_validated_string! {
    /// 件名
    pub struct Subject {
        label: "件名",
        max_length: 200,
    }
}

define_validated_string! {
    /// メッセージ本文
    ///
    /// テンプレートレンダリング後は最終本文に置き換わる。
    pub struct MessageBody {
        label: "本文",
        max_length: 10_000,
    }
}

/// メッセージステータス
///
/// DTO・ログ出力用の文字列表現。実体は [`MessageState`] から導出される。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "snake_case")]
pub enum MessageStatus {
    /// 下書き（未配信）
    Draft,
    /// 送信済み
    Sent,
}

impl std::str::FromStr for MessageStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            _ => Err(DomainError::Validation(format!(
                "不正なメッセージステータス: {}",
                s
            ))),
        }
    }
}

/// 配信先
///
/// 配信時点で確定する (メッセージ, コンタクト) の組。
/// 独立したエンティティとしては永続化されず、送信済みメッセージに埋め込まれる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    message_id: MessageId,
    contact_id: ContactId,
}

impl Recipient {
    pub fn new(message_id: MessageId, contact_id: ContactId) -> Self {
        Self {
            message_id,
            contact_id,
        }
    }

    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    pub fn contact_id(&self) -> &ContactId {
        &self.contact_id
    }
}

/// メッセージの状態（ADT ベースステートマシン）
///
/// 送信済みの固有フィールド（`sent_at`、配信先リスト）を `Sent` バリアントに
/// 持たせることで、「下書きに配信先がある」「送信済みに `sent_at` がない」
/// といった不正な状態を型レベルで防止する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageState {
    /// 下書き（未配信）
    Draft,
    /// 送信済み
    Sent(SentState),
}

/// Sent 状態の固有フィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentState {
    /// 送信日時（高々一度だけ設定される）
    pub sent_at:    DateTime<Utc>,
    /// 配信時点で確定した配信先
    pub recipients: Vec<Recipient>,
}

/// メッセージエンティティ
///
/// 共通フィールドを外側に、状態固有フィールドを `state` enum に分離する。
/// 下書き状態の作成は上流のオーサリングフローが担い、
/// 送信済みへの遷移は配信ユースケースだけが [`Message::delivered`] で行う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    subject: Subject,
    body: MessageBody,
    sender_id: SenderId,
    template_id: Option<TemplateId>,
    tag_ids: Vec<TagId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    state: MessageState,
}

/// メッセージの新規作成パラメータ
pub struct NewMessage {
    pub id: MessageId,
    pub subject: Subject,
    pub body: MessageBody,
    pub sender_id: SenderId,
    pub template_id: Option<TemplateId>,
    pub tag_ids: Vec<TagId>,
    pub now: DateTime<Utc>,
}

/// メッセージの DB 復元パラメータ
///
/// DB スキーマのフラット構造を表現する。`from_db()` で不変条件を検証して
/// ADT に変換する。
pub struct MessageRecord {
    pub id: MessageId,
    pub subject: Subject,
    pub body: MessageBody,
    pub sender_id: SenderId,
    pub template_id: Option<TemplateId>,
    pub tag_ids: Vec<TagId>,
    pub sent_at: Option<DateTime<Utc>>,
    pub recipients: Vec<Recipient>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// 新しいメッセージを下書きとして作成する
    pub fn new(params: NewMessage) -> Self {
        Self {
            id: params.id,
            subject: params.subject,
            body: params.body,
            sender_id: params.sender_id,
            template_id: params.template_id,
            tag_ids: params.tag_ids,
            created_at: params.now,
            updated_at: params.now,
            state: MessageState::Draft,
        }
    }

    /// 既存のデータから復元する
    ///
    /// DB のフラット構造から ADT に変換し、不変条件を検証する。
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation`: 不変条件違反
    ///   （例: `sent_at` が NULL なのに配信先レコードが存在する）
    pub fn from_db(record: MessageRecord) -> Result<Self, DomainError> {
        let state = match record.sent_at {
            Some(sent_at) => MessageState::Sent(SentState {
                sent_at,
                recipients: record.recipients,
            }),
            None => {
                if !record.recipients.is_empty() {
                    return Err(DomainError::Validation(
                        "未送信メッセージに配信先レコードが存在します".to_string(),
                    ));
                }
                MessageState::Draft
            }
        };

        Ok(Self {
            id: record.id,
            subject: record.subject,
            body: record.body,
            sender_id: record.sender_id,
            template_id: record.template_id,
            tag_ids: record.tag_ids,
            created_at: record.created_at,
            updated_at: record.updated_at,
            state,
        })
    }

    /// 送信済み状態に遷移する
    ///
    /// レンダリング済みの最終本文と解決済みの配信先を確定し、
    /// `sent_at` を記録する。メッセージ状態の唯一の遷移メソッド。
    ///
    /// # Errors
    ///
    /// - `DomainError::Conflict`: 既に送信済みの場合
    pub fn delivered(
        self,
        final_body: MessageBody,
        recipient_contact_ids: Vec<ContactId>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if self.is_sent() {
            return Err(DomainError::Conflict(
                "メッセージは既に送信済みです".to_string(),
            ));
        }

        let recipients = recipient_contact_ids
            .into_iter()
            .map(|contact_id| Recipient::new(self.id.clone(), contact_id))
            .collect();

        Ok(Self {
            body: final_body,
            updated_at: now,
            state: MessageState::Sent(SentState {
                sent_at: now,
                recipients,
            }),
            ..self
        })
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    pub fn sender_id(&self) -> &SenderId {
        &self.sender_id
    }

    pub fn template_id(&self) -> Option<&TemplateId> {
        self.template_id.as_ref()
    }

    pub fn tag_ids(&self) -> &[TagId] {
        &self.tag_ids
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn state(&self) -> &MessageState {
        &self.state
    }

    /// ステータスの文字列表現を導出する
    pub fn status(&self) -> MessageStatus {
        match self.state {
            MessageState::Draft => MessageStatus::Draft,
            MessageState::Sent(_) => MessageStatus::Sent,
        }
    }

    /// 送信済みであるか
    pub fn is_sent(&self) -> bool {
        matches!(self.state, MessageState::Sent(_))
    }

    /// 送信日時（未送信の場合は None）
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            MessageState::Draft => None,
            MessageState::Sent(sent) => Some(sent.sent_at),
        }
    }

    /// 配信先（未送信の場合は空スライス）
    pub fn recipients(&self) -> &[Recipient] {
        match &self.state {
            MessageState::Draft => &[],
            MessageState::Sent(sent) => &sent.recipients,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;

    fn make_draft(now: DateTime<Utc>) -> Message {
        Message::new(NewMessage {
            id: MessageId::new(),
            subject: Subject::new("今月のお知らせ").unwrap(),
            body: MessageBody::new("The long enough message body").unwrap(),
            sender_id: SenderId::new(),
            template_id: None,
            tag_ids: vec![TagId::new()],
            now,
        })
    }

    #[test]
    fn test_newで下書き状態のメッセージが作成される() {
        let now = Utc::now();
        let message = make_draft(now);

        assert_eq!(message.status(), MessageStatus::Draft);
        assert!(!message.is_sent());
        assert_eq!(message.sent_at(), None);
        assert!(message.recipients().is_empty());
        assert_eq!(message.created_at(), now);
    }

    #[test]
    fn test_deliveredで送信済みに遷移し本文と配信先が確定する() {
        let now = Utc::now();
        let message = make_draft(now);
        let message_id = message.id().clone();
        let contact_id = ContactId::new();

        let final_body = MessageBody::new("レンダリング済み本文").unwrap();
        let sent = message
            .delivered(final_body.clone(), vec![contact_id.clone()], now)
            .unwrap();

        assert_eq!(sent.status(), MessageStatus::Sent);
        assert_eq!(sent.sent_at(), Some(now));
        assert_eq!(sent.body(), &final_body);
        assert_eq!(sent.recipients().len(), 1);
        assert_eq!(sent.recipients()[0].message_id(), &message_id);
        assert_eq!(sent.recipients()[0].contact_id(), &contact_id);
    }

    #[test]
    fn test_deliveredは配信先が空でも成功する() {
        let now = Utc::now();
        let message = make_draft(now);
        let body = message.body().clone();

        let sent = message.delivered(body, Vec::new(), now).unwrap();

        assert!(sent.is_sent());
        assert!(sent.recipients().is_empty());
    }

    #[test]
    fn test_送信済みメッセージへのdeliveredはconflictになる() {
        let now = Utc::now();
        let message = make_draft(now);
        let body = message.body().clone();

        let sent = message.delivered(body.clone(), vec![ContactId::new()], now).unwrap();
        let result = sent.delivered(body, vec![ContactId::new()], now);

        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[test]
    fn test_from_dbで送信済みメッセージを復元できる() {
        let now = Utc::now();
        let id = MessageId::new();
        let contact_id = ContactId::new();

        let message = Message::from_db(MessageRecord {
            id: id.clone(),
            subject: Subject::new("件名").unwrap(),
            body: MessageBody::new("本文").unwrap(),
            sender_id: SenderId::new(),
            template_id: Some(TemplateId::new()),
            tag_ids: vec![TagId::new()],
            sent_at: Some(now),
            recipients: vec![Recipient::new(id.clone(), contact_id)],
            created_at: now,
            updated_at: now,
        })
        .unwrap();

        assert!(message.is_sent());
        assert_eq!(message.sent_at(), Some(now));
        assert_eq!(message.recipients().len(), 1);
    }

    #[test]
    fn test_from_dbは未送信かつ配信先ありをバリデーションエラーにする() {
        let now = Utc::now();
        let id = MessageId::new();

        let result = Message::from_db(MessageRecord {
            id: id.clone(),
            subject: Subject::new("件名").unwrap(),
            body: MessageBody::new("本文").unwrap(),
            sender_id: SenderId::new(),
            template_id: None,
            tag_ids: Vec::new(),
            sent_at: None,
            recipients: vec![Recipient::new(id, ContactId::new())],
            created_at: now,
            updated_at: now,
        });

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_message_status_の文字列変換が正しい() {
        assert_eq!(MessageStatus::Draft.to_string(), "draft");
        assert_eq!(MessageStatus::Sent.to_string(), "sent");
        assert_eq!(
            MessageStatus::from_str("draft").unwrap(),
            MessageStatus::Draft
        );
        assert_eq!(MessageStatus::from_str("sent").unwrap(), MessageStatus::Sent);
        assert!(MessageStatus::from_str("archived").is_err());
    }

    #[test]
    fn test_subjectは空文字列を拒否する() {
        assert!(Subject::new("   ").is_err());
    }

    #[test]
    fn test_message_bodyは最大長を超える文字列を拒否する() {
        let too_long = "あ".repeat(10_001);
        assert!(MessageBody::new(too_long).is_err());
    }
}
