//! # Core Service 設定
//!
//! 環境変数から Core Service サーバーの設定を読み込む。

use std::env;

/// Core Service サーバーの設定
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// データベース接続 URL
    pub database_url: String,
    /// 送信キュー設定
    pub queue: QueueConfig,
}

/// 送信キューの設定
///
/// `QUEUE_BACKEND` 環境変数で投入バックエンドを切り替える:
/// - `redis`: Redis リストへ投入（本番・開発）
/// - `noop`: 投入しない（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// 投入バックエンド（"redis" | "noop"）
    pub backend:   String,
    /// Redis 接続 URL（backend=redis の場合に使用）
    pub redis_url: String,
    /// ジョブを積むリストのキー
    pub queue_key: String,
}

impl CoreConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            host: env::var("CORE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("CORE_PORT")
                .expect("CORE_PORT が設定されていません")
                .parse()
                .expect("CORE_PORT は有効なポート番号である必要があります"),
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL が設定されていません"),
            queue: QueueConfig::from_env(),
        })
    }
}

impl QueueConfig {
    /// 環境変数から送信キュー設定を読み込む
    fn from_env() -> Self {
        Self {
            backend:   env::var("QUEUE_BACKEND").unwrap_or_else(|_| "noop".to_string()),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            queue_key: env::var("OUTBOUND_QUEUE_KEY")
                .unwrap_or_else(|_| "kawaraban:outbound_emails".to_string()),
        }
    }
}
