//! # テンプレート
//!
//! メッセージ本文を包む再利用可能なコンテンツ。
//! 内容には本文の置換点となるプレースホルダを 1 箇所だけ含める規約とし、
//! 置換点の検証はレンダリング時に行う（ユースケース層の責務）。
//! 作成後は本コアの関心において不変。

use chrono::{DateTime, Utc};

define_uuid_id! {
    /// テンプレート ID
    pub struct TemplateId;
}

/// テンプレート内容に埋め込む本文プレースホルダ
///
/// レンダリング時にこのトークン 1 箇所がメッセージ本文で置換される。
pub const MESSAGE_CONTENT_PLACEHOLDER: &str = "{{ message_content }}";

define_validated_string! {
    /// テンプレートタイトル
    pub struct TemplateTitle {
        label: "テンプレートタイトル",
        max_length: 200,
    }
}

define_validated_string! {
    /// テンプレート内容
    pub struct TemplateContent {
        label: "テンプレート内容",
        max_length: 10_000,
    }
}

/// テンプレートエンティティ
///
/// 配信コアからは ID による参照先としてのみ扱われる読み取り専用の集約。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    id: TemplateId,
    title: TemplateTitle,
    content: TemplateContent,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Template {
    /// 既存のデータから復元する
    pub fn from_db(
        id: TemplateId,
        title: TemplateTitle,
        content: TemplateContent,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            content,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &TemplateId {
        &self.id
    }

    pub fn title(&self) -> &TemplateTitle {
        &self.title
    }

    pub fn content(&self) -> &TemplateContent {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
