//! # Core Service サーバー
//!
//! メッセージ配信のビジネスロジックを実行する内部サービス。
//!
//! ## 役割
//!
//! - **配信オーケストレーション**: メッセージの検証、テンプレートレンダリング、
//!   配信先解決、送信済みマークの確定
//! - **データ永続化**: PostgreSQL へのエンティティ保存
//! - **ジョブ投入**: 配信先ごとの配信ジョブを Redis キューへ投入
//!
//! メール送信そのもの（SMTP / API 配送）はキューの先の送信ワーカーの責務。
//!
//! ## アクセス制御
//!
//! Core Service は内部ネットワークからのみアクセス可能とする。
//! メッセージのオーサリング・購読者管理を行う上流サービスが呼び出す。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `CORE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `CORE_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `QUEUE_BACKEND` | No | 送信キューバックエンド（`redis` \| `noop`、デフォルト: `noop`） |
//! | `REDIS_URL` | No | Redis 接続 URL（デフォルト: `redis://localhost:6379`） |
//! | `OUTBOUND_QUEUE_KEY` | No | ジョブを積むリストのキー |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境
//! cargo run -p kawaraban-core-service
//!
//! # 本番環境
//! CORE_PORT=3001 DATABASE_URL=postgres://... QUEUE_BACKEND=redis \
//!     cargo run -p kawaraban-core-service --release
//! ```

mod config;
mod error;
mod handler;
mod usecase;

use std::{net::SocketAddr, sync::Arc};

use axum::{
   Router,
   routing::{get, post},
};
use config::CoreConfig;
use handler::{MessageState, get_message, health_check, send_message};
use kawaraban_domain::clock::SystemClock;
use kawaraban_infra::{
   db::{self, PgTransactionManager},
   queue::{NoopOutboundQueue, OutboundQueue, RedisOutboundQueue},
   repository::{
      PostgresMessageRepository,
      PostgresSenderRepository,
      PostgresTagContactIndex,
      PostgresTemplateRepository,
   },
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use usecase::MessageUseCaseImpl;

/// Core Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
   // .env ファイルを読み込む（存在する場合）
   dotenvy::dotenv().ok();

   // トレーシング初期化
   tracing_subscriber::registry()
      .with(
         tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,kawaraban=debug".into()),
      )
      .with(tracing_subscriber::fmt::layer())
      .init();

   // 設定読み込み
   let config = CoreConfig::from_env().expect("設定の読み込みに失敗しました");

   tracing::info!(
      "Core Service サーバーを起動します: {}:{}",
      config.host,
      config.port
   );

   // データベース接続プールを作成
   let pool = db::create_pool(&config.database_url)
      .await
      .expect("データベース接続に失敗しました");
   tracing::info!("データベースに接続しました");

   // マイグレーションを適用
   db::run_migrations(&pool)
      .await
      .expect("マイグレーションの適用に失敗しました");

   // 送信キューバックエンドを選択
   let outbound_queue: Arc<dyn OutboundQueue> = match config.queue.backend.as_str() {
      "redis" => {
         let queue =
            RedisOutboundQueue::connect(&config.queue.redis_url, config.queue.queue_key.clone())
               .await
               .expect("Redis 接続に失敗しました");
         tracing::info!(queue_key = %config.queue.queue_key, "Redis 送信キューに接続しました");
         Arc::new(queue)
      }
      _ => {
         tracing::warn!("noop 送信キューを使用します（配信ジョブは投入されません）");
         Arc::new(NoopOutboundQueue::new())
      }
   };

   // 依存コンポーネントを初期化
   let usecase = MessageUseCaseImpl::new(
      Arc::new(PostgresMessageRepository::new(pool.clone())),
      Arc::new(PostgresTemplateRepository::new(pool.clone())),
      Arc::new(PostgresSenderRepository::new(pool.clone())),
      Arc::new(PostgresTagContactIndex::new(pool.clone())),
      outbound_queue,
      Arc::new(PgTransactionManager::new(pool)),
      Arc::new(SystemClock),
   );
   let message_state = Arc::new(MessageState { usecase });

   // ルーター構築
   let app = Router::new()
      .route("/health", get(health_check))
      .route("/internal/messages/{id}", get(get_message))
      .route("/internal/messages/{id}/send", post(send_message))
      .with_state(message_state)
      .layer(TraceLayer::new_for_http());

   // サーバー起動
   let addr: SocketAddr = format!("{}:{}", config.host, config.port)
      .parse()
      .expect("アドレスのパースに失敗しました");

   let listener = TcpListener::bind(addr).await?;
   tracing::info!("Core Service サーバーが起動しました: {}", addr);

   axum::serve(listener, app).await?;

   Ok(())
}
