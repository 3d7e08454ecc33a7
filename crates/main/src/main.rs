//! 主应用程序入口
//!
//! 启动 Fixitnow 撮合服务：HTTP API + 实时通道。

use std::sync::Arc;

use application::{
    EventRouter, MatchingService, MatchingServiceDependencies, PresenceRegistry, SystemClock,
    TimeoutPolicy,
};
use config::AppConfig;
use infrastructure::{create_pg_pool, PgServiceRequestRepository, PgUserRepository};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 读取环境变量配置（DATABASE_URL / JWT_SECRET 必须显式提供）
    let app_config = AppConfig::from_env();
    app_config.validate()?;

    tracing::info!(
        "连接数据库: {}",
        app_config
            .database
            .url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );

    let pg_pool = create_pg_pool(
        &app_config.database.url,
        app_config.database.max_connections,
    )
    .await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    // 仓储
    let request_repository = Arc::new(PgServiceRequestRepository::new(pg_pool.clone()));
    let user_repository = Arc::new(PgUserRepository::new(pg_pool));

    // 在线表与事件路由器
    let registry = Arc::new(PresenceRegistry::new());
    let event_router = Arc::new(EventRouter::new(registry));

    // 撮合服务
    let matching_service = Arc::new(MatchingService::new(MatchingServiceDependencies {
        request_repository,
        user_repository: user_repository.clone(),
        router: event_router.clone(),
        clock: Arc::new(SystemClock),
        timeout: TimeoutPolicy::from_secs(app_config.matching.response_timeout_secs),
    }));

    // JWT 服务
    let jwt_service = Arc::new(JwtService::new(app_config.jwt.clone()));

    let state = AppState::new(matching_service, event_router, user_repository, jwt_service);

    // 启动 Web 服务器
    let app = router(state);
    let bind_addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("撮合服务器启动在 http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
