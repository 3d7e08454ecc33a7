use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use application::{ApplicationError, ConnectionHandle};
use domain::{ClientEvent, ServerEvent, UserAccount, UserId};

use crate::state::AppState;

/// WebSocket 连接管理器
///
/// 封装单个已认证连接的全部状态和逻辑，包括：
/// - 入站事件解析与分发
/// - 出站事件序列化与发送
/// - 在线表注册与断开清理
pub struct WebSocketConnection {
    socket: Option<WebSocket>,
    state: AppState,
    account: UserAccount,
    connection_id: Uuid,
}

impl WebSocketConnection {
    /// 创建新的 WebSocket 连接。身份已在握手阶段校验完毕。
    pub fn new(socket: WebSocket, state: AppState, account: UserAccount) -> Self {
        Self {
            socket: Some(socket),
            state,
            account,
            connection_id: Uuid::new_v4(),
        }
    }

    /// 运行 WebSocket 连接的主循环
    ///
    /// 这是连接的核心逻辑，处理：
    /// - 客户端事件接收与分发
    /// - 路由器投递过来的服务端事件转发
    /// - 连接生命周期管理
    pub async fn run(mut self) {
        let socket = self.socket.take().expect("Socket should be available");
        let (mut sender, mut incoming) = socket.split();

        tracing::info!(
            user_id = %self.account.id,
            connection_id = %self.connection_id,
            "WebSocket 连接已建立"
        );

        // 出站通道：路由器和本连接自身都往这里写
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();

        // 发送任务：统一处理所有对 WebSocket sender 的写操作
        let send_task = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                let payload = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to serialize websocket payload");
                        continue;
                    }
                };
                if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                    tracing::warn!("Failed to send text message");
                    break;
                }
            }
            tracing::info!("WebSocket发送任务结束");
        });

        // 接收任务：处理来自客户端的事件
        let recv_task = {
            let state = self.state.clone();
            let account = self.account.clone();
            let connection_id = self.connection_id;
            let event_tx = event_tx.clone();

            tokio::spawn(async move {
                while let Some(Ok(message)) = incoming.next().await {
                    let handled =
                        Self::handle_incoming(&state, &account, connection_id, &event_tx, message)
                            .await;
                    if handled.is_err() {
                        break;
                    }
                }
                tracing::info!("WebSocket接收任务结束");
            })
        };

        // 等待任意一个任务完成（连接断开）
        tokio::select! {
            _ = send_task => {
                tracing::info!("WebSocket发送任务完成");
            }
            _ = recv_task => {
                tracing::info!("WebSocket接收任务完成");
            }
        }

        // 按连接号注销：若用户已在新连接上重新注册，在线表保持不动
        match self.state.registry().unregister(self.connection_id).await {
            Some(user_id) => {
                tracing::info!(user_id = %user_id, "WebSocket连接已断开，在线状态已清理");
            }
            None => {
                tracing::debug!(
                    connection_id = %self.connection_id,
                    "WebSocket连接已断开，无在线状态需要清理"
                );
            }
        }
    }

    /// 处理来自客户端的单条消息
    ///
    /// 畸形帧只告警不断连；返回 Err 仅表示客户端请求关闭。
    async fn handle_incoming(
        state: &AppState,
        account: &UserAccount,
        connection_id: Uuid,
        event_tx: &mpsc::UnboundedSender<ServerEvent>,
        message: WsMessage,
    ) -> Result<(), ()> {
        match message {
            WsMessage::Close(_) => {
                tracing::info!("WebSocket收到关闭消息");
                return Err(());
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) => {
                tracing::debug!("收到心跳消息");
            }
            WsMessage::Binary(_) => {
                tracing::warn!(user_id = %account.id, "Unexpected binary frame dropped");
            }
            WsMessage::Text(text) => {
                let event = match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(
                            user_id = %account.id,
                            error = %err,
                            "Malformed client event dropped"
                        );
                        return Ok(());
                    }
                };
                Self::dispatch(state, account, connection_id, event_tx, event).await;
            }
        }
        Ok(())
    }

    /// 事件分发。投递语义为 fire-and-forget：收件人离线时事件静默丢弃，
    /// 发送方不会收到失败回执。唯一的例外是响应落库失败，接单方会收到
    /// 一条 error 回执以便重试。
    async fn dispatch(
        state: &AppState,
        account: &UserAccount,
        connection_id: Uuid,
        event_tx: &mpsc::UnboundedSender<ServerEvent>,
        event: ClientEvent,
    ) {
        match event {
            ClientEvent::Register { user_id } => {
                // 事件里的身份必须与握手认证的身份一致
                if user_id != account.id {
                    tracing::warn!(
                        claimed = %user_id,
                        authenticated = %account.id,
                        "Register event with mismatched identity dropped"
                    );
                    return;
                }
                let handle = ConnectionHandle::new(connection_id, event_tx.clone());
                state.registry().register(user_id, handle).await;
                tracing::info!(user_id = %user_id, "User registered on connection");
            }
            ClientEvent::ServiceRequest {
                from_user_id,
                to_user_id,
                request_data,
            } => {
                if !Self::identity_matches(account, from_user_id) {
                    return;
                }
                if let Err(err) = state
                    .matching_service
                    .submit_request(from_user_id, to_user_id, request_data)
                    .await
                {
                    tracing::warn!(
                        from = %from_user_id,
                        to = %to_user_id,
                        error = %err,
                        "Service request rejected"
                    );
                }
            }
            ClientEvent::ServiceRequestResponse {
                to_user_id,
                from_user_id,
                status,
                verification_code,
            } => {
                if !Self::identity_matches(account, from_user_id) {
                    return;
                }
                if let Err(err) = state
                    .matching_service
                    .respond_to_request(from_user_id, to_user_id, status, verification_code)
                    .await
                {
                    tracing::warn!(
                        provider = %from_user_id,
                        requester = %to_user_id,
                        error = %err,
                        "Service request response failed"
                    );
                    // 落库失败可重试，其余失败也回执给接单方
                    let _ = event_tx.send(Self::failure_receipt(&err));
                }
            }
            ClientEvent::SendMessage {
                from_user_id,
                to_user_id,
                message,
            } => {
                if !Self::identity_matches(account, from_user_id) {
                    return;
                }
                state
                    .event_router
                    .relay_chat_message(from_user_id, to_user_id, message)
                    .await;
            }
            ClientEvent::Typing {
                from_user_id,
                to_user_id,
            } => {
                if !Self::identity_matches(account, from_user_id) {
                    return;
                }
                state
                    .event_router
                    .relay_typing(from_user_id, to_user_id, true)
                    .await;
            }
            ClientEvent::StopTyping {
                from_user_id,
                to_user_id,
            } => {
                if !Self::identity_matches(account, from_user_id) {
                    return;
                }
                state
                    .event_router
                    .relay_typing(from_user_id, to_user_id, false)
                    .await;
            }
            ClientEvent::ToggleTimer {
                from_user_id,
                to_user_id,
                action,
            } => {
                if !Self::identity_matches(account, from_user_id) {
                    return;
                }
                state
                    .event_router
                    .relay_timer_toggle(from_user_id, to_user_id, action)
                    .await;
            }
        }
    }

    fn identity_matches(account: &UserAccount, claimed: UserId) -> bool {
        if claimed != account.id {
            tracing::warn!(
                claimed = %claimed,
                authenticated = %account.id,
                "Client event with mismatched identity dropped"
            );
            return false;
        }
        true
    }

    fn failure_receipt(err: &ApplicationError) -> ServerEvent {
        let code = match err {
            ApplicationError::Repository(_) => "PERSISTENCE_FAILURE",
            ApplicationError::RequestExpired => "REQUEST_EXPIRED",
            ApplicationError::UnknownUser(_) => "USER_NOT_FOUND",
            _ => "RESPONSE_REJECTED",
        };
        ServerEvent::Error {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        tracing::debug!(
            user_id = %self.account.id,
            connection_id = %self.connection_id,
            "WebSocketConnection 被销毁"
        );
    }
}
