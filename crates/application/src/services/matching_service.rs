//! 请求生命周期协调器
//!
//! 管理一条服务请求从发出、接受/拒绝/超时到完成的状态机。
//! 请求在接单方响应前只存在于内存里的待响应表中，
//! 接受时才写入持久化记录（先落库、后通知），拒绝不落库。
//!
//! 响应窗口在服务端强制：窗口过后待响应条目被清扫，
//! 迟到的接受会得到 `RequestExpired`，不会产生请求方
//! 已经放弃等待的"孤儿接受"。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use domain::{
    PartyProfile, RequestDetails, RequestId, ResponseStatus, ServiceRequest,
    ServiceRequestRepository, Timestamp, UserId, UserRepository, VerificationCode,
};

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::router::EventRouter;
use crate::timeout::TimeoutPolicy;

/// 待响应的请求，键为（请求方，接单方）
#[derive(Debug, Clone)]
struct PendingRequest {
    /// 区分同一对用户先后两次请求，防止过期清扫误删新请求
    token: Uuid,
    details: RequestDetails,
    sent_at: Timestamp,
}

type PendingMap = HashMap<(UserId, UserId), PendingRequest>;

pub struct MatchingServiceDependencies {
    pub request_repository: Arc<dyn ServiceRequestRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub router: Arc<EventRouter>,
    pub clock: Arc<dyn Clock>,
    pub timeout: TimeoutPolicy,
}

pub struct MatchingService {
    deps: MatchingServiceDependencies,
    pending: Arc<RwLock<PendingMap>>,
}

impl MatchingService {
    pub fn new(deps: MatchingServiceDependencies) -> Self {
        Self {
            deps,
            pending: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 请求方向指定接单方发出服务请求。
    ///
    /// 接单方的资格由调用方事先过滤，这里不再复查。
    /// 接单方离线时事件被丢弃（fire-and-forget），请求方
    /// 依赖自己的倒计时放弃等待。
    pub async fn submit_request(
        &self,
        from: UserId,
        to: UserId,
        details: RequestDetails,
    ) -> Result<(), ApplicationError> {
        details.validate()?;
        if details.requester.id != from {
            return Err(ApplicationError::Domain(domain::DomainError::validation_error(
                "requester.id",
                "must match the sending user",
            )));
        }

        let token = Uuid::new_v4();
        let sent_at = self.deps.clock.now();
        {
            let mut pending = self.pending.write().await;
            pending.insert(
                (from, to),
                PendingRequest {
                    token,
                    details: details.clone(),
                    sent_at,
                },
            );
        }

        self.deps.router.relay_service_request(from, to, details).await;
        self.arm_expiry_sweep(from, to, token);

        tracing::info!(requester = %from, provider = %to, "service request submitted");
        Ok(())
    }

    /// 窗口到期后清扫待响应条目。
    ///
    /// 只清扫 token 仍然一致的条目：同一对用户期间重新发起的
    /// 请求有新 token，不受旧清扫任务影响。
    fn arm_expiry_sweep(&self, from: UserId, to: UserId, token: Uuid) {
        let pending = Arc::clone(&self.pending);
        let window = self.deps.timeout.window();
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let mut map = pending.write().await;
            if map
                .get(&(from, to))
                .is_some_and(|entry| entry.token == token)
            {
                map.remove(&(from, to));
                tracing::info!(
                    requester = %from,
                    provider = %to,
                    "service request expired without a response"
                );
            }
        });
    }

    /// 接单方对请求作出响应。
    ///
    /// 接受：生成/采用确认码，写入状态为 `Accepted` 的持久化
    /// 记录，落库成功后才通知请求方（落库失败时请求方收不到
    /// 接受通知，接单方得到可重试的错误）。
    /// 拒绝：只转发结论，不写持久化记录。
    pub async fn respond_to_request(
        &self,
        provider_id: UserId,
        requester_id: UserId,
        status: ResponseStatus,
        verification_code: Option<VerificationCode>,
    ) -> Result<Option<ServiceRequest>, ApplicationError> {
        let key = (requester_id, provider_id);
        let now = self.deps.clock.now();

        let entry = {
            let pending = self.pending.read().await;
            pending.get(&key).cloned()
        };
        let entry = entry.ok_or(ApplicationError::RequestExpired)?;

        if self.deps.timeout.expired(entry.sent_at, now) {
            self.remove_pending(key, entry.token).await;
            return Err(ApplicationError::RequestExpired);
        }

        match status {
            ResponseStatus::Declined => {
                self.remove_pending(key, entry.token).await;
                self.deps
                    .router
                    .relay_response(requester_id, provider_id, ResponseStatus::Declined, None)
                    .await;
                tracing::info!(requester = %requester_id, provider = %provider_id, "service request declined");
                Ok(None)
            }
            ResponseStatus::Accepted => {
                let provider = self.provider_profile(provider_id).await?;
                let code = match verification_code {
                    Some(code) => code,
                    None => VerificationCode::generate(&mut rand::rng()),
                };

                let record = ServiceRequest::accepted(
                    RequestId::from(Uuid::new_v4()),
                    entry.details.clone(),
                    provider,
                    code.clone(),
                    now,
                );

                // 先落库。失败时保留待响应条目，接单方可以重试。
                let persisted = self.deps.request_repository.create(record).await?;

                self.remove_pending(key, entry.token).await;
                self.deps
                    .router
                    .relay_response(
                        requester_id,
                        provider_id,
                        ResponseStatus::Accepted,
                        Some(code),
                    )
                    .await;

                tracing::info!(
                    requester = %requester_id,
                    provider = %provider_id,
                    request_id = %persisted.id,
                    "service request accepted"
                );
                Ok(Some(persisted))
            }
        }
    }

    /// 核对确认码。
    ///
    /// 大写归一后必须与记录完全一致；任何一个字符不符都返回
    /// `CodeMismatch`，请求状态保持不变。核对通过后记录开工
    /// 时间，计时器和聊天功能由此解锁。
    pub async fn verify_code(
        &self,
        request_id: RequestId,
        submitted: &str,
    ) -> Result<ServiceRequest, ApplicationError> {
        let mut record = self
            .deps
            .request_repository
            .find_by_id(request_id)
            .await?
            .ok_or(ApplicationError::Repository(
                domain::RepositoryError::NotFound,
            ))?;

        if !record.verification_code.matches(submitted) {
            tracing::warn!(request_id = %request_id, "verification code mismatch");
            return Err(ApplicationError::CodeMismatch);
        }

        record.start(self.deps.clock.now())?;
        let updated = self.deps.request_repository.update(record).await?;
        tracing::info!(request_id = %request_id, "verification code accepted, work started");
        Ok(updated)
    }

    /// 服务完成，记录耗时并终结请求。
    pub async fn complete_request(
        &self,
        request_id: RequestId,
        duration_secs: i64,
    ) -> Result<ServiceRequest, ApplicationError> {
        let mut record = self
            .deps
            .request_repository
            .find_by_id(request_id)
            .await?
            .ok_or(ApplicationError::Repository(
                domain::RepositoryError::NotFound,
            ))?;

        record.complete(duration_secs, self.deps.clock.now())?;
        let updated = self.deps.request_repository.update(record).await?;
        tracing::info!(request_id = %request_id, duration_secs, "service request completed");
        Ok(updated)
    }

    /// HTTP 边界：直接创建一条请求记录（状态 `Accepted`）。
    pub async fn create_record(
        &self,
        details: RequestDetails,
        provider_id: UserId,
        verification_code: Option<VerificationCode>,
    ) -> Result<ServiceRequest, ApplicationError> {
        details.validate()?;
        let provider = self.provider_profile(provider_id).await?;
        let code = match verification_code {
            Some(code) => code,
            None => VerificationCode::generate(&mut rand::rng()),
        };

        let record = ServiceRequest::accepted(
            RequestId::from(Uuid::new_v4()),
            details,
            provider,
            code,
            self.deps.clock.now(),
        );
        Ok(self.deps.request_repository.create(record).await?)
    }

    /// HTTP 边界：按 id + 确认码取一条请求记录。
    pub async fn fetch_record(
        &self,
        request_id: RequestId,
        code: &VerificationCode,
    ) -> Result<ServiceRequest, ApplicationError> {
        self.deps
            .request_repository
            .find_by_id_and_code(request_id, code)
            .await?
            .ok_or(ApplicationError::Repository(
                domain::RepositoryError::NotFound,
            ))
    }

    async fn provider_profile(
        &self,
        provider_id: UserId,
    ) -> Result<PartyProfile, ApplicationError> {
        let account = self
            .deps
            .user_repository
            .find_by_id(provider_id)
            .await?
            .ok_or(ApplicationError::UnknownUser(provider_id))?;
        Ok(account.profile())
    }

    /// 只在 token 一致时移除待响应条目。
    async fn remove_pending(&self, key: (UserId, UserId), token: Uuid) {
        let mut pending = self.pending.write().await;
        if pending.get(&key).is_some_and(|entry| entry.token == token) {
            pending.remove(&key);
        }
    }
}
