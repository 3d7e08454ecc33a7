use async_trait::async_trait;

use crate::entities::service_request::ServiceRequest;
use crate::repositories::RepositoryError;
use crate::value_objects::{RequestId, VerificationCode};

/// 服务请求记录仓储接口
#[async_trait]
pub trait ServiceRequestRepository: Send + Sync {
    /// 写入一条新的请求记录，返回落库后的记录。
    async fn create(&self, request: ServiceRequest) -> Result<ServiceRequest, RepositoryError>;

    /// 按 id 查询。
    async fn find_by_id(&self, id: RequestId) -> Result<Option<ServiceRequest>, RepositoryError>;

    /// 按 id + 确认码查询，用于核对确认码的步骤。
    async fn find_by_id_and_code(
        &self,
        id: RequestId,
        code: &VerificationCode,
    ) -> Result<Option<ServiceRequest>, RepositoryError>;

    /// 整体更新一条记录。记录不存在时返回 `NotFound`。
    async fn update(&self, request: ServiceRequest) -> Result<ServiceRequest, RepositoryError>;
}
