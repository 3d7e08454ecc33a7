use std::{net::SocketAddr, sync::Arc, time::Duration};

use application::{
    EventRouter, MatchingService, MatchingServiceDependencies, PresenceRegistry, SystemClock,
    TimeoutPolicy,
};
use domain::{UserAccount, UserId, UserRepository, UserRole};
use tokio::{net::TcpListener, sync::oneshot, time::sleep};
use uuid::Uuid;
use web_api::{router, AppState, JwtConfig, JwtService};

use infrastructure::{MemoryServiceRequestRepository, MemoryUserRepository};

/// 跑在随机端口上的完整测试应用（内存仓储）
pub struct TestApp {
    pub addr: SocketAddr,
    pub jwt_service: Arc<JwtService>,
    pub requester: UserAccount,
    pub provider: UserAccount,
    pub requests: Arc<MemoryServiceRequestRepository>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestApp {
    /// 默认 30 秒响应窗口
    pub async fn spawn() -> Self {
        Self::spawn_with_timeout(TimeoutPolicy::from_secs(30)).await
    }

    pub async fn spawn_with_timeout(timeout: TimeoutPolicy) -> Self {
        let request_repository = Arc::new(MemoryServiceRequestRepository::new());
        let user_repository = Arc::new(MemoryUserRepository::new());

        let requester = UserAccount::new(
            UserId::from(Uuid::new_v4()),
            "alice",
            UserRole::Taker,
        );
        let provider = UserAccount::new(
            UserId::from(Uuid::new_v4()),
            "bob",
            UserRole::Provider,
        );
        user_repository
            .create(requester.clone())
            .await
            .expect("seed requester");
        user_repository
            .create(provider.clone())
            .await
            .expect("seed provider");

        let registry = Arc::new(PresenceRegistry::new());
        let event_router = Arc::new(EventRouter::new(registry));

        let matching_service = Arc::new(MatchingService::new(MatchingServiceDependencies {
            request_repository: request_repository.clone(),
            user_repository: user_repository.clone(),
            router: event_router.clone(),
            clock: Arc::new(SystemClock),
            timeout,
        }));

        let jwt_service = Arc::new(JwtService::new(JwtConfig {
            secret: "integration-test-secret-0123456789ab".to_string(),
            expiration_hours: 24,
        }));

        let state = AppState::new(
            matching_service,
            event_router,
            user_repository,
            jwt_service.clone(),
        );

        let app = router(state);
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // allow server to start
        sleep(Duration::from_millis(100)).await;

        Self {
            addr,
            jwt_service,
            requester,
            provider,
            requests: request_repository,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn http_base(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn token_for(&self, user: &UserAccount) -> String {
        self.jwt_service
            .generate_token(user.id.0)
            .expect("generate token")
    }

    pub fn ws_url_for(&self, user: &UserAccount) -> String {
        format!(
            "ws://{}/api/v1/ws?token={}",
            self.addr,
            self.token_for(user)
        )
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
