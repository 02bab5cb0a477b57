//! # インフラ層エラー定義
//!
//! データベースや送信キューとの通信で発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **エラーの変換**: sqlx::Error, redis::RedisError などをラップ
//! - **ドメインエラーとの分離**: インフラ固有のエラーを明示
//! - **競合の明示**: `sent_at` の compare-and-set 失敗を `Conflict` として表現し、
//!   ユースケース層が「既に送信済み」へ変換できるようにする

use thiserror::Error;

/// インフラ層で発生するエラー
///
/// データベースクエリ、Redis 操作などで発生するエラーの具体的な種別。
/// ユースケース層でこのエラー種別に応じて適切な失敗値に変換する。
#[derive(Debug, Error)]
pub enum InfraError {
   /// データベースエラー
   ///
   /// SQL クエリの実行失敗、接続エラー、制約違反など。
   #[error("データベースエラー: {0}")]
   Database(#[from] sqlx::Error),

   /// Redis エラー
   ///
   /// Redis への接続失敗、コマンド実行エラーなど。
   #[error("Redis エラー: {0}")]
   Redis(#[from] redis::RedisError),

   /// 競合（compare-and-set 失敗）
   ///
   /// UPDATE の条件（例: `sent_at IS NULL`）を満たす行が存在しなかった場合。
   /// ユースケース層で適切なエラーメッセージに変換して返す。
   #[error("競合が発生しました: {entity}(id={id})")]
   Conflict {
      /// エンティティ名（例: "Message"）
      entity: String,
      /// 対象の識別子
      id:     String,
   },

   /// 予期しないエラー
   ///
   /// DB 上のデータがドメインの不変条件を満たさない場合など。
   #[error("予期しないエラー: {0}")]
   Unexpected(String),
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_displayがconflictのメッセージを出力する() {
      let err = InfraError::Conflict {
         entity: "Message".to_string(),
         id:     "M-001".to_string(),
      };
      assert_eq!(format!("{err}"), "競合が発生しました: Message(id=M-001)");
   }

   #[test]
   fn test_sourceがラップしたエラーに委譲する() {
      use std::error::Error;

      let sqlx_err = sqlx::Error::RowNotFound;
      let err: InfraError = sqlx_err.into();

      assert!(err.source().is_some());
   }

   #[test]
   fn test_infra_errorはsendとsyncを実装している() {
      fn assert_send_sync<T: Send + Sync>() {}
      assert_send_sync::<InfraError>();
   }
}
