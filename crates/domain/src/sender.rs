//! # 差出人
//!
//! メッセージの差出人となる送信元アカウント。
//! メッセージからは ID で参照される読み取り専用の集約だが、
//! 差出人は独立して変更・削除され得るため、配信時の存在チェックは必須となる。

use chrono::{DateTime, Utc};

use crate::DomainError;

define_uuid_id! {
    /// 差出人 ID
    pub struct SenderId;
}

define_validated_string! {
    /// 差出人名
    pub struct SenderName {
        label: "差出人名",
        max_length: 100,
    }
}

/// メールアドレス
///
/// `local@domain` 形式の検証済みメールアドレス。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `local@domain` の形式である（local / domain とも非空）
    /// - 最大 255 文字
    ///
    /// # エラー
    ///
    /// バリデーションに失敗した場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.chars().count() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは 255 文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 差出人エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    id: SenderId,
    name: SenderName,
    email: EmailAddress,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Sender {
    /// 既存のデータから復元する
    pub fn from_db(
        id: SenderId,
        name: SenderName,
        email: EmailAddress,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &SenderId {
        &self.id
    }

    pub fn name(&self) -> &SenderName {
        &self.name
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_addressは正しい形式を受け入れる() {
        let email = EmailAddress::new("taro@example.com").unwrap();
        assert_eq!(email.as_str(), "taro@example.com");
    }

    #[test]
    fn test_email_addressは空文字列を拒否する() {
        assert!(EmailAddress::new("").is_err());
    }

    #[test]
    fn test_email_addressはアットマークなしを拒否する() {
        assert!(EmailAddress::new("taro.example.com").is_err());
    }

    #[test]
    fn test_email_addressはローカル部なしを拒否する() {
        assert!(EmailAddress::new("@example.com").is_err());
    }

    #[test]
    fn test_email_addressはドメイン部なしを拒否する() {
        assert!(EmailAddress::new("taro@").is_err());
    }

    #[test]
    fn test_from_dbで差出人を復元できる() {
        let now = Utc::now();
        let id = SenderId::new();
        let sender = Sender::from_db(
            id.clone(),
            SenderName::new("配信チーム").unwrap(),
            EmailAddress::new("news@kawaraban.example.com").unwrap(),
            now,
            now,
        );

        assert_eq!(sender.id(), &id);
        assert_eq!(sender.email().as_str(), "news@kawaraban.example.com");
    }
}
