//! 内存仓储实现（用于测试和本地部署）

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use domain::{
    RepositoryError, RequestId, ServiceRequest, ServiceRequestRepository, UserAccount, UserId,
    UserRepository, VerificationCode,
};

/// 内存服务请求仓储
#[derive(Default)]
pub struct MemoryServiceRequestRepository {
    records: RwLock<HashMap<RequestId, ServiceRequest>>,
}

impl MemoryServiceRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全量读取当前存储的记录（测试断言用）
    pub async fn all(&self) -> Vec<ServiceRequest> {
        self.records.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl ServiceRequestRepository for MemoryServiceRequestRepository {
    async fn create(&self, request: ServiceRequest) -> Result<ServiceRequest, RepositoryError> {
        let mut records = self.records.write().await;
        if records.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: RequestId) -> Result<Option<ServiceRequest>, RepositoryError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_by_id_and_code(
        &self,
        id: RequestId,
        code: &VerificationCode,
    ) -> Result<Option<ServiceRequest>, RepositoryError> {
        Ok(self
            .records
            .read()
            .await
            .get(&id)
            .filter(|record| &record.verification_code == code)
            .cloned())
    }

    async fn update(&self, request: ServiceRequest) -> Result<ServiceRequest, RepositoryError> {
        let mut records = self.records.write().await;
        if !records.contains_key(&request.id) {
            return Err(RepositoryError::NotFound);
        }
        records.insert(request.id, request.clone());
        Ok(request)
    }
}

/// 内存用户仓储
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<UserId, UserAccount>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, user: UserAccount) -> Result<UserAccount, RepositoryError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }
}
