//! 实时通道事件目录
//!
//! 客户端与服务端之间的全部实时事件都在这里定义，
//! `type` 字段做标签。线格式沿用既有客户端的事件名，
//! 包括历史拼写 `toggleTimmerComponent` / `TimmerComponentToggled`，
//! 改名会破坏已发布的客户端。

use serde::{Deserialize, Serialize};

use crate::entities::service_request::RequestDetails;
use crate::value_objects::{UserId, VerificationCode};

/// 接单方对请求的响应结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Accepted,
    Declined,
}

/// 计时器开关动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Open,
    Close,
}

/// 客户端 -> 服务端事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// 连接注册：把 userId 绑定到当前连接
    #[serde(rename = "register", rename_all = "camelCase")]
    Register { user_id: UserId },

    /// 向指定接单方发起服务请求
    #[serde(rename = "serviceRequest", rename_all = "camelCase")]
    ServiceRequest {
        from_user_id: UserId,
        to_user_id: UserId,
        request_data: RequestDetails,
    },

    /// 接单方对请求的接受/拒绝
    #[serde(rename = "serviceRequestResponse", rename_all = "camelCase")]
    ServiceRequestResponse {
        to_user_id: UserId,
        from_user_id: UserId,
        status: ResponseStatus,
        verification_code: Option<VerificationCode>,
    },

    /// 聊天消息
    #[serde(rename = "sendMessage", rename_all = "camelCase")]
    SendMessage {
        from_user_id: UserId,
        to_user_id: UserId,
        message: String,
    },

    /// 正在输入提示
    #[serde(rename = "typing", rename_all = "camelCase")]
    Typing {
        from_user_id: UserId,
        to_user_id: UserId,
    },

    /// 停止输入提示
    #[serde(rename = "stopTyping", rename_all = "camelCase")]
    StopTyping {
        from_user_id: UserId,
        to_user_id: UserId,
    },

    /// 计时器组件开关
    #[serde(rename = "toggleTimmerComponent", rename_all = "camelCase")]
    ToggleTimer {
        from_user_id: UserId,
        to_user_id: UserId,
        action: ToggleAction,
    },
}

/// 服务端 -> 客户端事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// 转发给接单方的服务请求
    #[serde(rename = "serviceRequest", rename_all = "camelCase")]
    ServiceRequest {
        from_user_id: UserId,
        request_data: RequestDetails,
    },

    /// 转发给请求方的接受/拒绝结论
    #[serde(rename = "serviceRequestResponse", rename_all = "camelCase")]
    ServiceRequestResponse {
        from_user_id: UserId,
        status: ResponseStatus,
        verification_code: Option<VerificationCode>,
    },

    /// 转发聊天消息
    #[serde(rename = "receiveMessage", rename_all = "camelCase")]
    ReceiveMessage { from_user_id: UserId, message: String },

    /// 对方正在输入
    #[serde(rename = "typing", rename_all = "camelCase")]
    Typing { from_user_id: UserId },

    /// 对方停止输入
    #[serde(rename = "stopTyping", rename_all = "camelCase")]
    StopTyping { from_user_id: UserId },

    /// 计时器组件开关已切换
    #[serde(rename = "TimmerComponentToggled", rename_all = "camelCase")]
    TimerToggled {
        from_user_id: UserId,
        action: ToggleAction,
    },

    /// 业务失败回执（例如响应落库失败，接单方需要重试）
    #[serde(rename = "error", rename_all = "camelCase")]
    Error { code: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::PartyProfile;
    use uuid::Uuid;

    #[test]
    fn client_events_use_legacy_wire_names() {
        let event = ClientEvent::ToggleTimer {
            from_user_id: UserId::from(Uuid::new_v4()),
            to_user_id: UserId::from(Uuid::new_v4()),
            action: ToggleAction::Open,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "toggleTimmerComponent");
        assert_eq!(json["action"], "open");

        let event = ServerEvent::TimerToggled {
            from_user_id: UserId::from(Uuid::new_v4()),
            action: ToggleAction::Close,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TimmerComponentToggled");
    }

    #[test]
    fn register_round_trips() {
        let user_id = UserId::from(Uuid::new_v4());
        let json = format!(r#"{{"type":"register","userId":"{}"}}"#, user_id);
        let parsed: ClientEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ClientEvent::Register { user_id });
    }

    #[test]
    fn service_request_payload_shape() {
        let from = UserId::from(Uuid::new_v4());
        let to = UserId::from(Uuid::new_v4());
        let event = ClientEvent::ServiceRequest {
            from_user_id: from,
            to_user_id: to,
            request_data: RequestDetails {
                service_type: "electrical".to_string(),
                location: "5 Main St".to_string(),
                price: 120.0,
                requester: PartyProfile {
                    id: from,
                    name: "alice".to_string(),
                    avatar_url: None,
                },
            },
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "serviceRequest");
        assert_eq!(json["requestData"]["serviceType"], "electrical");

        let back: ClientEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn malformed_payload_fails_to_parse() {
        // 缺少必填字段 toUserId
        let json = r#"{"type":"sendMessage","fromUserId":"0b8f8f54-3f06-4e8a-9d7a-0a5f8c1d2e3f"}"#;
        assert!(serde_json::from_str::<ClientEvent>(json).is_err());
    }
}
