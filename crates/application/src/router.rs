//! 事件路由器
//!
//! 把入站领域事件按目标用户经在线连接表转发给对应连接。
//! 无状态，at-most-once：收件人不在线就丢弃并打日志，
//! 不排队、不重试、不存储转发。

use std::sync::Arc;

use domain::{RequestDetails, ResponseStatus, ServerEvent, ToggleAction, UserId, VerificationCode};

use crate::presence::PresenceRegistry;

/// 单次投递的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 已写入收件人连接的发送队列
    Delivered,
    /// 收件人不在线，事件已丢弃
    Offline,
}

/// 事件路由器
pub struct EventRouter {
    registry: Arc<PresenceRegistry>,
}

impl EventRouter {
    pub fn new(registry: Arc<PresenceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<PresenceRegistry> {
        &self.registry
    }

    /// 把事件投递给指定用户。发送方永远不会因为收件人离线而报错。
    pub async fn deliver(&self, to: UserId, event: ServerEvent) -> DeliveryOutcome {
        match self.registry.resolve(to).await {
            Some(handle) => {
                if handle.send(event) {
                    DeliveryOutcome::Delivered
                } else {
                    // 连接已关闭但还没来得及注销，按离线处理
                    tracing::warn!(to = %to, "recipient connection already closed, event dropped");
                    DeliveryOutcome::Offline
                }
            }
            None => {
                tracing::warn!(to = %to, "recipient offline, event dropped");
                DeliveryOutcome::Offline
            }
        }
    }

    /// 服务请求 -> 接单方
    pub async fn relay_service_request(
        &self,
        from: UserId,
        to: UserId,
        request_data: RequestDetails,
    ) -> DeliveryOutcome {
        self.deliver(
            to,
            ServerEvent::ServiceRequest {
                from_user_id: from,
                request_data,
            },
        )
        .await
    }

    /// 接受/拒绝结论 -> 原请求方
    pub async fn relay_response(
        &self,
        to: UserId,
        from: UserId,
        status: ResponseStatus,
        verification_code: Option<VerificationCode>,
    ) -> DeliveryOutcome {
        self.deliver(
            to,
            ServerEvent::ServiceRequestResponse {
                from_user_id: from,
                status,
                verification_code,
            },
        )
        .await
    }

    /// 聊天消息 -> 收件人
    pub async fn relay_chat_message(
        &self,
        from: UserId,
        to: UserId,
        message: String,
    ) -> DeliveryOutcome {
        self.deliver(
            to,
            ServerEvent::ReceiveMessage {
                from_user_id: from,
                message,
            },
        )
        .await
    }

    /// 输入状态提示 -> 收件人（不带消息体）
    pub async fn relay_typing(&self, from: UserId, to: UserId, typing: bool) -> DeliveryOutcome {
        let event = if typing {
            ServerEvent::Typing { from_user_id: from }
        } else {
            ServerEvent::StopTyping { from_user_id: from }
        };
        self.deliver(to, event).await
    }

    /// 计时器开关 -> 收件人
    pub async fn relay_timer_toggle(
        &self,
        from: UserId,
        to: UserId,
        action: ToggleAction,
    ) -> DeliveryOutcome {
        self.deliver(
            to,
            ServerEvent::TimerToggled {
                from_user_id: from,
                action,
            },
        )
        .await
    }
}
