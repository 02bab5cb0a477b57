//! # コンタクト
//!
//! タグを購読する配信対象者の識別子。
//! コンタクト本体は上流の購読者管理が所有するため、
//! 配信コアはタグから解決されたコンタクト ID のみを扱う。

define_uuid_id! {
    /// コンタクト ID
    pub struct ContactId;
}
