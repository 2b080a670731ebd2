//! 通知记录 - 分发引擎的输出单元

use serde::{Deserialize, Serialize};

/// 一条待投递的聊天消息
///
/// 去重之前一条记录要么只有 `to_users`（私信），要么只有 `to_channels`（频道广播）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// 发送者（评论者）用户名
    pub from: String,
    /// 已渲染的消息文本
    pub message: String,
    /// 私信接收者
    #[serde(default)]
    pub to_users: Vec<String>,
    /// 目标频道 ID
    #[serde(default)]
    pub to_channels: Vec<String>,
}

impl NotificationRecord {
    /// 私信记录
    pub fn direct(
        from: impl Into<String>,
        message: impl Into<String>,
        to_users: Vec<String>,
    ) -> Self {
        Self {
            from: from.into(),
            message: message.into(),
            to_users,
            to_channels: Vec::new(),
        }
    }

    /// 频道广播记录
    pub fn channel(
        from: impl Into<String>,
        message: impl Into<String>,
        to_channels: Vec<String>,
    ) -> Self {
        Self {
            from: from.into(),
            message: message.into(),
            to_users: Vec::new(),
            to_channels,
        }
    }

    pub fn is_direct(&self) -> bool {
        !self.to_users.is_empty() && self.to_channels.is_empty()
    }

    pub fn is_channel(&self) -> bool {
        self.to_users.is_empty() && !self.to_channels.is_empty()
    }

    /// 没有任何接收者
    pub fn is_empty(&self) -> bool {
        self.to_users.is_empty() && self.to_channels.is_empty()
    }
}

/// 非致命的订阅配置问题
pub type Warning = String;

/// 一次分发的结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub records: Vec<NotificationRecord>,
    pub warnings: Vec<Warning>,
}
