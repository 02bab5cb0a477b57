//! # タグ
//!
//! メッセージと購読者コンタクトを結びつけるラベル。
//! 配信コアではコンタクト解決の結合キーとしてのみ使用する。

use chrono::{DateTime, Utc};

define_uuid_id! {
    /// タグ ID
    pub struct TagId;
}

define_validated_string! {
    /// タグタイトル
    pub struct TagTitle {
        label: "タグタイトル",
        max_length: 100,
    }
}

/// タグエンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    id: TagId,
    title: TagTitle,
    created_at: DateTime<Utc>,
}

impl Tag {
    /// 既存のデータから復元する
    pub fn from_db(id: TagId, title: TagTitle, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            created_at,
        }
    }

    pub fn id(&self) -> &TagId {
        &self.id
    }

    pub fn title(&self) -> &TagTitle {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
