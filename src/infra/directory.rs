//! 用户目录 - GitLab 用户 ID 到用户名 / 主页链接的解析

use std::collections::HashMap;

/// 用户目录
///
/// 约定为全函数：未知 ID 返回空字符串，不报错
pub trait UserDirectory: Send + Sync {
    fn get_username_by_id(&self, id: i64) -> String;

    /// 用户主页链接
    fn get_user_url(&self, username: &str) -> String;
}

/// 基于配置的静态用户目录
#[derive(Debug, Clone, Default)]
pub struct StaticUserDirectory {
    gitlab_url: String,
    users: HashMap<i64, String>,
}

impl StaticUserDirectory {
    pub fn new(gitlab_url: impl Into<String>) -> Self {
        Self {
            gitlab_url: gitlab_url.into(),
            users: HashMap::new(),
        }
    }

    pub fn with_user(mut self, id: i64, username: impl Into<String>) -> Self {
        self.users.insert(id, username.into());
        self
    }

    pub fn with_users(mut self, users: HashMap<i64, String>) -> Self {
        self.users.extend(users);
        self
    }
}

impl UserDirectory for StaticUserDirectory {
    fn get_username_by_id(&self, id: i64) -> String {
        self.users.get(&id).cloned().unwrap_or_default()
    }

    fn get_user_url(&self, username: &str) -> String {
        format!("{}/{}", self.gitlab_url.trim_end_matches('/'), username)
    }
}
