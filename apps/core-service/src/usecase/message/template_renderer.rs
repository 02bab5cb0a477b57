//! # テンプレートレンダラー
//!
//! テンプレート内容のプレースホルダをメッセージ本文で置換し、最終本文を生成する。
//!
//! ## 設計方針
//!
//! - **置換点はちょうど 1 箇所**: 0 箇所（本文が落ちる）も複数箇所（本文が重複する）も
//!   配信前にエラーとして弾く
//! - **出力も本文の制約に従う**: 置換結果は [`MessageBody`] として再検証する

use kawaraban_domain::{
    message::MessageBody,
    template::{MESSAGE_CONTENT_PLACEHOLDER, Template},
};
use thiserror::Error;

/// テンプレートレンダリングの失敗理由
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateRenderError {
    /// テンプレートに置換点が含まれていない
    #[error("テンプレートにプレースホルダ {MESSAGE_CONTENT_PLACEHOLDER} が含まれていません")]
    PlaceholderMissing,

    /// テンプレートに置換点が複数含まれている
    #[error("テンプレートにプレースホルダ {MESSAGE_CONTENT_PLACEHOLDER} が複数含まれています")]
    PlaceholderAmbiguous,

    /// 置換結果が本文の制約を満たさない（最大長超過）
    #[error("レンダリング結果が本文の制約を満たしません: {0}")]
    InvalidOutput(String),
}

/// テンプレートにメッセージ本文を埋め込み、最終本文を生成する
pub(super) fn render(
    template: &Template,
    body: &MessageBody,
) -> Result<MessageBody, TemplateRenderError> {
    let content = template.content().as_str();

    match content.matches(MESSAGE_CONTENT_PLACEHOLDER).count() {
        0 => return Err(TemplateRenderError::PlaceholderMissing),
        1 => {}
        _ => return Err(TemplateRenderError::PlaceholderAmbiguous),
    }

    let rendered = content.replacen(MESSAGE_CONTENT_PLACEHOLDER, body.as_str(), 1);

    MessageBody::new(rendered).map_err(|e| TemplateRenderError::InvalidOutput(e.to_string()))
}
