//! 在线连接表
//!
//! 维护逻辑用户 id 到当前活跃连接句柄的映射。整个核心里
//! 唯一的共享可变状态，由一把 `RwLock` 保护，只允许
//! 事件路由器和连接守门人访问。

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use domain::{ServerEvent, UserId};

/// 活跃连接句柄
///
/// `connection_id` 标识一条具体的 socket 连接；`sender` 是
/// 往该连接写事件的通道。句柄随 socket 关闭而失效。
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    connection_id: Uuid,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(connection_id: Uuid, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            connection_id,
            sender,
        }
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// 投递事件。返回 false 表示对端已经关闭。
    pub fn send(&self, event: ServerEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// 在线连接表
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    connections: RwLock<HashMap<UserId, ConnectionHandle>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册连接。同一用户重复注册时直接覆盖旧映射
    /// （last-register-wins，不做多连接扇出）。
    pub async fn register(&self, user_id: UserId, handle: ConnectionHandle) {
        let mut connections = self.connections.write().await;
        if let Some(previous) = connections.insert(user_id, handle) {
            tracing::debug!(
                user_id = %user_id,
                superseded = %previous.connection_id(),
                "presence mapping replaced by newer connection"
            );
        }
    }

    /// 查询某个用户当前的连接。不在线是正常结果，不是错误。
    pub async fn resolve(&self, user_id: UserId) -> Option<ConnectionHandle> {
        self.connections.read().await.get(&user_id).cloned()
    }

    /// 按连接句柄反向扫描并移除映射。
    ///
    /// 只删除 connection_id 完全一致的条目：旧连接断开时不能
    /// 误删同一用户更新的连接。找不到时是 no-op。
    pub async fn unregister(&self, connection_id: Uuid) -> Option<UserId> {
        let mut connections = self.connections.write().await;
        let target = connections
            .iter()
            .find(|(_, handle)| handle.connection_id() == connection_id)
            .map(|(user_id, _)| *user_id);

        if let Some(user_id) = target {
            connections.remove(&user_id);
            tracing::debug!(user_id = %user_id, connection_id = %connection_id, "presence mapping removed");
        }
        target
    }

    pub async fn is_online(&self, user_id: UserId) -> bool {
        self.connections.read().await.contains_key(&user_id)
    }

    pub async fn online_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (ConnectionHandle, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConnectionHandle::new(Uuid::new_v4(), tx), rx)
    }

    #[tokio::test]
    async fn register_then_resolve() {
        let registry = PresenceRegistry::new();
        let user = UserId::from(Uuid::new_v4());
        let (h, _rx) = handle();
        let connection_id = h.connection_id();

        registry.register(user, h).await;
        let resolved = registry.resolve(user).await.unwrap();
        assert_eq!(resolved.connection_id(), connection_id);
    }

    #[tokio::test]
    async fn resolve_unknown_user_is_absent() {
        let registry = PresenceRegistry::new();
        assert!(registry.resolve(UserId::from(Uuid::new_v4())).await.is_none());
    }

    #[tokio::test]
    async fn last_register_wins() {
        let registry = PresenceRegistry::new();
        let user = UserId::from(Uuid::new_v4());
        let (h1, _rx1) = handle();
        let (h2, _rx2) = handle();
        let second_id = h2.connection_id();

        registry.register(user, h1).await;
        registry.register(user, h2).await;

        let resolved = registry.resolve(user).await.unwrap();
        assert_eq!(resolved.connection_id(), second_id);
        assert_eq!(registry.online_count().await, 1);
    }

    #[tokio::test]
    async fn unregister_removes_mapping() {
        let registry = PresenceRegistry::new();
        let user = UserId::from(Uuid::new_v4());
        let (h, _rx) = handle();
        let connection_id = h.connection_id();

        registry.register(user, h).await;
        let removed = registry.unregister(connection_id).await;
        assert_eq!(removed, Some(user));
        assert!(registry.resolve(user).await.is_none());
    }

    #[tokio::test]
    async fn stale_unregister_keeps_newer_mapping() {
        let registry = PresenceRegistry::new();
        let user = UserId::from(Uuid::new_v4());
        let (h1, _rx1) = handle();
        let (h2, _rx2) = handle();
        let stale_id = h1.connection_id();
        let newer_id = h2.connection_id();

        registry.register(user, h1).await;
        registry.register(user, h2).await;

        // 旧连接断开，不能影响新的映射
        let removed = registry.unregister(stale_id).await;
        assert_eq!(removed, None);

        let resolved = registry.resolve(user).await.unwrap();
        assert_eq!(resolved.connection_id(), newer_id);
    }

    #[tokio::test]
    async fn unregister_twice_is_a_noop() {
        let registry = PresenceRegistry::new();
        let user = UserId::from(Uuid::new_v4());
        let (h, _rx) = handle();
        let connection_id = h.connection_id();

        registry.register(user, h).await;
        assert_eq!(registry.unregister(connection_id).await, Some(user));
        assert_eq!(registry.unregister(connection_id).await, None);
    }
}
