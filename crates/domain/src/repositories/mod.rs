//! 仓储接口定义
//!
//! 持久化存储是外部协作方，核心只通过这些接口按键读写。

pub mod service_request_repository;
pub mod user_repository;

pub use service_request_repository::*;
pub use user_repository::*;

use thiserror::Error;

/// 仓储层错误类型
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("requested record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
