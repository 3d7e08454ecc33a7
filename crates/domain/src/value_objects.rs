use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// 统一的时间戳类型。
pub type Timestamp = DateTime<Utc>;

/// 用户唯一标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<UserId> for Uuid {
    fn from(value: UserId) -> Self {
        value.0
    }
}

/// 服务请求唯一标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<RequestId> for Uuid {
    fn from(value: RequestId) -> Self {
        value.0
    }
}

/// 确认码字符集，`[A-Z0-9]`
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 确认码固定长度
const CODE_LENGTH: usize = 8;

/// 服务确认码
///
/// 8 位大写字母/数字组成的共享口令，服务上门时由接单方
/// 向请求方当面核对。不是加密令牌，只要求在 36^8 空间内
/// 不可预测。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VerificationCode(String);

impl VerificationCode {
    /// 解析确认码：先统一转为大写，再校验长度和字符集。
    pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
        let normalized = raw.into().trim().to_uppercase();

        if normalized.len() != CODE_LENGTH {
            return Err(DomainError::invalid_verification_code(format!(
                "expected {} characters, got {}",
                CODE_LENGTH,
                normalized.len()
            )));
        }

        if !normalized
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(DomainError::invalid_verification_code(
                "only [A-Z0-9] characters are allowed",
            ));
        }

        Ok(Self(normalized))
    }

    /// 随机生成一个确认码。
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code: String = (0..CODE_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..CODE_CHARSET.len());
                CODE_CHARSET[idx] as char
            })
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 与用户提交的字符串比对（大小写不敏感，内部统一大写后精确相等）。
    pub fn matches(&self, submitted: &str) -> bool {
        self.0 == submitted.trim().to_uppercase()
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for VerificationCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<VerificationCode> for String {
    fn from(value: VerificationCode) -> Self {
        value.0
    }
}
