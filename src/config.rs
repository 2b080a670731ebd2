//! 配置加载
//!
//! 默认路径 `~/.config/comment-notify/config.json`，文件不存在时使用默认配置。
//!
//! ```json
//! {
//!   "gitlab_url": "https://gitlab.example.com",
//!   "users": { "1": "root", "2": "manland" },
//!   "subscriptions": [
//!     { "channel_id": "channel1", "creator_id": "1", "features": "issue_comments,label:\"bug\"", "repository": "manland/webhook" }
//!   ],
//!   "members": { "manland/webhook": ["1"] }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::infra::{StaticSubscriptionStore, StaticUserDirectory};
use crate::notification::{CommentDispatcher, Subscription};

const DEFAULT_GITLAB_URL: &str = "https://gitlab.com";

fn default_gitlab_url() -> String {
    DEFAULT_GITLAB_URL.to_string()
}

/// 运行配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// 用于拼接用户主页链接
    #[serde(default = "default_gitlab_url")]
    pub gitlab_url: String,
    /// 用户 ID -> 用户名
    #[serde(default)]
    pub users: HashMap<i64, String>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    /// 私有项目 -> 有权限的订阅创建者
    #[serde(default)]
    pub members: HashMap<String, Vec<String>>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            gitlab_url: default_gitlab_url(),
            users: HashMap::new(),
            subscriptions: Vec::new(),
            members: HashMap::new(),
        }
    }
}

impl NotifyConfig {
    /// 默认配置文件路径
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?;
        Ok(home.join(".config/comment-notify/config.json"))
    }

    /// 从指定路径加载，文件不存在时返回默认配置
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: NotifyConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;

        info!(
            path = %path.display(),
            users = config.users.len(),
            subscriptions = config.subscriptions.len(),
            "Loaded config"
        );
        Ok(config)
    }

    /// 加载配置：显式路径优先，否则使用默认路径
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Self::load_from(&Self::default_path()?),
        }
    }

    /// 用配置构造分发器
    pub fn build_dispatcher(&self) -> CommentDispatcher {
        let directory = StaticUserDirectory::new(self.gitlab_url.clone()).with_users(self.users.clone());
        let store = StaticSubscriptionStore::new(self.subscriptions.clone())
            .with_members(self.members.clone());
        CommentDispatcher::new(Arc::new(directory), Arc::new(store))
    }
}
