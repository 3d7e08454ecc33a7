//! 用户实体定义
//!
//! 撮合核心只引用用户的最小信息：身份、展示名、头像和角色。
//! 注册、登录、资料编辑等属于外部协作方，不在本仓库范围内。

use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

/// 用户角色枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// 服务请求方
    Taker,
    /// 服务提供方
    Provider,
}

/// 用户账户
///
/// 连接守门人在握手时用它确认 token 指向的身份确实存在。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
}

impl UserAccount {
    pub fn new(id: UserId, name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id,
            name: name.into(),
            avatar_url: None,
            role,
        }
    }

    pub fn with_avatar(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// 转为请求记录里携带的身份快照。
    pub fn profile(&self) -> PartyProfile {
        PartyProfile {
            id: self.id,
            name: self.name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// 请求双方的身份快照（id + 展示名 + 头像）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyProfile {
    pub id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
}
