use std::sync::Arc;

use application::{EventRouter, MatchingService, PresenceRegistry};
use domain::UserRepository;

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub matching_service: Arc<MatchingService>,
    pub event_router: Arc<EventRouter>,
    pub user_repository: Arc<dyn UserRepository>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        matching_service: Arc<MatchingService>,
        event_router: Arc<EventRouter>,
        user_repository: Arc<dyn UserRepository>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            matching_service,
            event_router,
            user_repository,
            jwt_service,
        }
    }

    /// 在线连接表（由路由器独占持有）
    pub fn registry(&self) -> &Arc<PresenceRegistry> {
        self.event_router.registry()
    }
}
