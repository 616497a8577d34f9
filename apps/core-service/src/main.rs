//! # Core Service サーバー
//!
//! 申請・承認ワークフローのビジネスロジックを実行する内部サービス。
//!
//! ## 役割
//!
//! - **ビジネスロジック**: 申請作成、承認・却下の遷移、承認者解決
//! - **データ永続化**: PostgreSQL へのエンティティ保存
//! - **通知**: 承認依頼・完了・期日リマインダーの通知行の作成
//!
//! ## アクセス制御
//!
//! Core Service は内部ネットワークからのみアクセス可能とする。
//! 認証・セッション管理は前段のゲートウェイの責務であり、各エンドポイントは
//! 操作ユーザーをリクエストで明示的に受け取る。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `CORE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `CORE_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//!
//! ## 起動方法
//!
//! ```bash
//! CORE_PORT=3001 DATABASE_URL=postgres://... cargo run -p shinseiflow-core-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use shinseiflow_core_service::{
    config::CoreConfig,
    handler::{
        ReminderApiState,
        RequestApiState,
        approve_step,
        cancel_request,
        create_request,
        get_request,
        health_check,
        list_my_requests,
        list_pending_approvals,
        reject_step,
        run_reminders,
    },
    usecase::{
        ReminderUseCaseDeps,
        ReminderUseCaseImpl,
        RequestUseCaseDeps,
        RequestUseCaseImpl,
    },
};
use shinseiflow_domain::clock::SystemClock;
use shinseiflow_infra::{
    PgTransactionManager,
    db,
    repository::{
        PostgresApprovalRepository,
        PostgresNotificationRepository,
        PostgresRequestRepository,
        PostgresRequestTypeRepository,
        PostgresRoleRepository,
        PostgresWorkflowRepository,
    },
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Core Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shinseiflow=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 設定読み込み
    let config = CoreConfig::from_env();

    tracing::info!(
        "Core Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // データベース接続プールを作成
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("データベース接続に失敗しました");
    db::run_migrations(&pool)
        .await
        .expect("マイグレーションの適用に失敗しました");
    tracing::info!("データベースに接続しました");

    // 申請ユースケースの依存コンポーネント
    let request_usecase = RequestUseCaseImpl::new(RequestUseCaseDeps {
        request_repo:      Arc::new(PostgresRequestRepository::new(pool.clone())),
        request_type_repo: Arc::new(PostgresRequestTypeRepository::new(pool.clone())),
        workflow_repo:     Arc::new(PostgresWorkflowRepository::new(pool.clone())),
        approval_repo:     Arc::new(PostgresApprovalRepository::new(pool.clone())),
        role_repo:         Arc::new(PostgresRoleRepository::new(pool.clone())),
        notification_repo: Arc::new(PostgresNotificationRepository::new(pool.clone())),
        clock:             Arc::new(SystemClock),
        tx_manager:        Arc::new(PgTransactionManager::new(pool.clone())),
    });
    let request_state = Arc::new(RequestApiState {
        usecase: request_usecase,
    });

    // リマインダーユースケースの依存コンポーネント
    let reminder_usecase = ReminderUseCaseImpl::new(ReminderUseCaseDeps {
        request_repo:      Arc::new(PostgresRequestRepository::new(pool.clone())),
        approval_repo:     Arc::new(PostgresApprovalRepository::new(pool.clone())),
        notification_repo: Arc::new(PostgresNotificationRepository::new(pool.clone())),
        clock:             Arc::new(SystemClock),
        tx_manager:        Arc::new(PgTransactionManager::new(pool.clone())),
    });
    let reminder_state = Arc::new(ReminderApiState {
        usecase: reminder_usecase,
    });

    // ルーター構築
    let app = Router::new()
        .route("/health", get(health_check))
        // 申請 API
        .route(
            "/internal/requests",
            get(list_my_requests).post(create_request),
        )
        .route("/internal/requests/{id}", get(get_request))
        .route(
            "/internal/requests/{id}/steps/{step_id}/approve",
            post(approve_step),
        )
        .route(
            "/internal/requests/{id}/steps/{step_id}/reject",
            post(reject_step),
        )
        .route("/internal/requests/{id}/cancel", post(cancel_request))
        // 承認待ち一覧（受信箱）API
        .route("/internal/approvals/my", get(list_pending_approvals))
        .with_state(request_state)
        // リマインダー API
        .route("/internal/reminders/run", post(run_reminders))
        .with_state(reminder_state)
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
