//! 领域模型错误定义

use thiserror::Error;

use crate::entities::service_request::RequestStatus;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 字段校验错误
    #[error("验证失败: {field}: {message}")]
    ValidationError { field: String, message: String },

    /// 服务确认码格式错误
    #[error("确认码无效: {reason}")]
    InvalidVerificationCode { reason: String },

    /// 请求状态只允许单向推进，不允许回退
    #[error("非法状态流转: {from:?} -> {to:?}")]
    InvalidStatusTransition {
        from: RequestStatus,
        to: RequestStatus,
    },
}

impl DomainError {
    /// 创建校验错误
    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 创建确认码错误
    pub fn invalid_verification_code(reason: impl Into<String>) -> Self {
        Self::InvalidVerificationCode {
            reason: reason.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
