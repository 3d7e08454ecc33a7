use async_trait::async_trait;

use crate::entities::user::UserAccount;
use crate::repositories::RepositoryError;
use crate::value_objects::UserId;

/// 用户账户仓储接口
///
/// 守门人在握手时用 `find_by_id` 确认 token 指向的身份存在。
/// 账户的创建/维护由外部系统负责，这里的 `create` 只服务于
/// 测试和本地部署的种子数据。
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserAccount>, RepositoryError>;

    async fn create(&self, user: UserAccount) -> Result<UserAccount, RepositoryError>;
}
