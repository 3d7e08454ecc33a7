use domain::{DomainError, RepositoryError, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    /// 提交的确认码与记录不符，请求状态保持不变
    #[error("verification code mismatch")]
    CodeMismatch,
    /// 没有待响应的请求，或响应窗口已过期
    #[error("no pending request, or the response window has expired")]
    RequestExpired,
    /// token 指向的用户在用户库中不存在
    #[error("unknown user: {0}")]
    UnknownUser(UserId),
}
