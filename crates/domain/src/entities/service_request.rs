//! 服务请求实体定义
//!
//! 一次上门服务请求从创建、接受/拒绝到完成的持久化记录。
//! 状态集合统一为 `Pending | Accepted | Completed | Canceled`，
//! 状态只允许单向推进。

use serde::{Deserialize, Serialize};

use crate::entities::user::PartyProfile;
use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{RequestId, Timestamp, VerificationCode};

/// 请求状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// 已提交，等待接单方响应
    Pending,
    /// 接单方已接受
    Accepted,
    /// 服务已完成
    Completed,
    /// 已取消 / 已拒绝
    Canceled,
}

impl RequestStatus {
    /// 状态流转是否合法。一旦离开 `Pending` 不允许回退。
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted) | (Pending, Canceled) | (Accepted, Completed) | (Accepted, Canceled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Canceled)
    }
}

/// 客户端提交的请求明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    pub service_type: String,
    pub location: String,
    pub price: f64,
    /// 请求方身份快照，转发给接单方用于展示
    pub requester: PartyProfile,
}

impl RequestDetails {
    /// 校验必填字段。空字段按 ValidationFailure 处理，事件整体丢弃。
    pub fn validate(&self) -> DomainResult<()> {
        if self.service_type.trim().is_empty() {
            return Err(DomainError::validation_error(
                "serviceType",
                "must not be empty",
            ));
        }
        if self.location.trim().is_empty() {
            return Err(DomainError::validation_error(
                "location",
                "must not be empty",
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(DomainError::validation_error(
                "price",
                "must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// 服务请求记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: RequestId,
    pub requester: PartyProfile,
    pub provider: PartyProfile,
    pub service_type: String,
    pub location: String,
    pub price: f64,
    pub status: RequestStatus,
    pub verification_code: VerificationCode,
    /// 服务耗时（秒），完成后记录
    pub duration_secs: Option<i64>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl ServiceRequest {
    /// 创建一条已接受的请求记录。
    ///
    /// 请求记录只在接单方接受时才落库，所以初始状态就是
    /// `Accepted`，而不是 `Pending`。
    pub fn accepted(
        id: RequestId,
        details: RequestDetails,
        provider: PartyProfile,
        verification_code: VerificationCode,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            requester: details.requester,
            provider,
            service_type: details.service_type,
            location: details.location,
            price: details.price,
            status: RequestStatus::Accepted,
            verification_code,
            duration_secs: None,
            created_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    fn transition_to(&mut self, next: RequestStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// 确认码核对通过，服务开始计时。
    pub fn start(&mut self, now: Timestamp) -> DomainResult<()> {
        if self.status != RequestStatus::Accepted {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to: RequestStatus::Accepted,
            });
        }
        self.started_at = Some(now);
        Ok(())
    }

    /// 服务完成，记录耗时。
    pub fn complete(&mut self, duration_secs: i64, now: Timestamp) -> DomainResult<()> {
        self.transition_to(RequestStatus::Completed)?;
        self.duration_secs = Some(duration_secs);
        self.completed_at = Some(now);
        Ok(())
    }

    /// 任一方取消。
    pub fn cancel(&mut self) -> DomainResult<()> {
        self.transition_to(RequestStatus::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::UserId;
    use chrono::Utc;
    use uuid::Uuid;

    fn profile(name: &str) -> PartyProfile {
        PartyProfile {
            id: UserId::from(Uuid::new_v4()),
            name: name.to_string(),
            avatar_url: None,
        }
    }

    fn details() -> RequestDetails {
        RequestDetails {
            service_type: "plumbing".to_string(),
            location: "12 Canal St".to_string(),
            price: 80.0,
            requester: profile("alice"),
        }
    }

    fn accepted_request() -> ServiceRequest {
        ServiceRequest::accepted(
            RequestId::from(Uuid::new_v4()),
            details(),
            profile("bob"),
            VerificationCode::parse("AB12CD34").unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn status_transitions_are_monotonic() {
        use RequestStatus::*;
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Canceled));
        assert!(Accepted.can_transition_to(Completed));
        assert!(Accepted.can_transition_to(Canceled));

        // 不允许回退到 Pending
        assert!(!Accepted.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Canceled.can_transition_to(Accepted));
        assert!(!Completed.can_transition_to(Accepted));
    }

    #[test]
    fn complete_records_duration_and_timestamp() {
        let mut request = accepted_request();
        request.start(Utc::now()).unwrap();
        request.complete(3600, Utc::now()).unwrap();

        assert_eq!(request.status, RequestStatus::Completed);
        assert_eq!(request.duration_secs, Some(3600));
        assert!(request.completed_at.is_some());
    }

    #[test]
    fn completed_request_cannot_be_canceled() {
        let mut request = accepted_request();
        request.complete(60, Utc::now()).unwrap();
        assert!(request.cancel().is_err());
    }

    #[test]
    fn details_validation_rejects_empty_fields() {
        let mut bad = details();
        bad.service_type = "  ".to_string();
        assert!(bad.validate().is_err());

        let mut bad = details();
        bad.location = String::new();
        assert!(bad.validate().is_err());

        let mut bad = details();
        bad.price = -1.0;
        assert!(bad.validate().is_err());

        assert!(details().validate().is_ok());
    }
}
