//! 订阅存储 - 查询订阅了某个项目的频道

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::notification::subscription::Subscription;

/// 订阅存储
///
/// 返回顺序决定频道广播的顺序。查询可能涉及 I/O，
/// 调用方通过丢弃 future 或 `tokio::time::timeout` 控制等待时间。
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn get_subscribed_channels_for_project(
        &self,
        namespace: &str,
        project: &str,
        is_public: bool,
    ) -> Result<Vec<Subscription>>;
}

/// 拆分 `group/subgroup/project` 为 (`group/subgroup`, `project`)
pub fn normalize_namespaced_project(path_with_namespace: &str) -> (String, String) {
    match path_with_namespace.rsplit_once('/') {
        Some((namespace, project)) => (namespace.to_string(), project.to_string()),
        None => (String::new(), path_with_namespace.to_string()),
    }
}

/// 基于配置的静态订阅存储
///
/// 先返回项目级订阅，再返回命名空间级订阅。私有项目只返回
/// 创建者在 `members` 中有该项目权限的订阅。
#[derive(Debug, Clone, Default)]
pub struct StaticSubscriptionStore {
    subscriptions: Vec<Subscription>,
    members: HashMap<String, Vec<String>>,
}

impl StaticSubscriptionStore {
    pub fn new(subscriptions: Vec<Subscription>) -> Self {
        Self {
            subscriptions,
            members: HashMap::new(),
        }
    }

    /// 设置私有项目成员（`namespace/project` -> 创建者 ID 列表）
    pub fn with_members(mut self, members: HashMap<String, Vec<String>>) -> Self {
        self.members = members;
        self
    }

    fn can_see(&self, creator_id: &str, full_path: &str) -> bool {
        self.members
            .get(full_path)
            .map(|ids| ids.iter().any(|id| id == creator_id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl SubscriptionStore for StaticSubscriptionStore {
    async fn get_subscribed_channels_for_project(
        &self,
        namespace: &str,
        project: &str,
        is_public: bool,
    ) -> Result<Vec<Subscription>> {
        let full_path = if namespace.is_empty() {
            project.to_string()
        } else {
            format!("{}/{}", namespace, project)
        };

        let project_level = self.subscriptions.iter().filter(|s| s.repository == full_path);
        let namespace_level = self
            .subscriptions
            .iter()
            .filter(|s| !namespace.is_empty() && s.repository == namespace);

        let subs: Vec<Subscription> = project_level
            .chain(namespace_level)
            .filter(|s| is_public || self.can_see(&s.creator_id, &full_path))
            .cloned()
            .collect();

        debug!(
            project = %full_path,
            is_public,
            count = subs.len(),
            "Loaded subscriptions for project"
        );
        Ok(subs)
    }
}
