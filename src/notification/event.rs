//! 评论事件结构
//!
//! GitLab note webhook 有两种我们关心的载荷：issue 评论和 merge request 评论。
//! 两者字段几乎一致，通过 `CommentEvent` trait 暴露统一视图，分发逻辑只写一次。

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use super::subscription::features;

/// GitLab `visibility_level` 中表示公开项目的值
pub const PUBLIC_VISIBILITY_LEVEL: i64 = 20;

/// 被评论对象的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    Issue,
    MergeRequest,
}

impl CommentKind {
    /// 订阅 feature 中对应的能力标记
    pub fn feature(&self) -> &'static str {
        match self {
            CommentKind::Issue => features::ISSUE_COMMENTS,
            CommentKind::MergeRequest => features::MERGE_REQUEST_COMMENTS,
        }
    }

    /// 通知文本中的名称
    pub fn noun(&self) -> &'static str {
        match self {
            CommentKind::Issue => "issue",
            CommentKind::MergeRequest => "merge request",
        }
    }
}

/// 评论者
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUser {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
}

/// 事件所属项目
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventProject {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub web_url: String,
    /// 如 `group/subgroup/project`
    #[serde(default)]
    pub path_with_namespace: String,
    /// `public` | `internal` | `private`
    #[serde(default)]
    pub visibility: Option<String>,
    /// 0 / 10 / 20，老版本载荷只有这个字段
    #[serde(default)]
    pub visibility_level: Option<i64>,
}

impl EventProject {
    /// 是否为公开项目
    pub fn is_public(&self) -> bool {
        self.visibility.as_deref() == Some("public")
            || self.visibility_level == Some(PUBLIC_VISIBILITY_LEVEL)
    }
}

/// 标签
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLabel {
    #[serde(default)]
    pub id: i64,
    pub title: String,
}

/// 评论本身（`object_attributes`）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteAttributes {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub noteable_type: String,
    #[serde(default)]
    pub description: String,
    /// 评论的永久链接
    #[serde(default)]
    pub url: String,
}

impl NoteAttributes {
    /// 评论正文，`description` 为空时回退到 `note`
    pub fn body(&self) -> &str {
        if self.description.is_empty() {
            &self.note
        } else {
            &self.description
        }
    }
}

/// 被评论的 issue
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueAttributes {
    #[serde(default)]
    pub id: i64,
    pub iid: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author_id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub assignee_ids: Vec<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: Vec<EventLabel>,
}

/// 被评论的 merge request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeRequestAttributes {
    #[serde(default)]
    pub id: i64,
    pub iid: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author_id: i64,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: Vec<EventLabel>,
}

/// issue 评论事件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    #[serde(default)]
    pub object_kind: String,
    pub user: EventUser,
    pub project: EventProject,
    pub object_attributes: NoteAttributes,
    pub issue: IssueAttributes,
}

/// merge request 评论事件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeCommentEvent {
    #[serde(default)]
    pub object_kind: String,
    pub user: EventUser,
    pub project: EventProject,
    pub object_attributes: NoteAttributes,
    pub merge_request: MergeRequestAttributes,
}

/// 评论事件的统一视图
pub trait CommentEvent: Send + Sync {
    fn kind(&self) -> CommentKind;

    /// 评论者用户名
    fn sender_username(&self) -> &str;

    fn project(&self) -> &EventProject;

    /// 项目内编号（IID）
    fn iid(&self) -> i64;

    fn title(&self) -> &str;

    /// 被评论对象上的标签名
    fn labels(&self) -> Vec<&str>;

    /// 指派人 ID，保持原顺序
    fn assignee_ids(&self) -> Vec<i64>;

    fn author_id(&self) -> i64;

    fn body(&self) -> &str;

    /// 评论链接
    fn url(&self) -> &str;
}

impl CommentEvent for IssueCommentEvent {
    fn kind(&self) -> CommentKind {
        CommentKind::Issue
    }

    fn sender_username(&self) -> &str {
        &self.user.username
    }

    fn project(&self) -> &EventProject {
        &self.project
    }

    fn iid(&self) -> i64 {
        self.issue.iid
    }

    fn title(&self) -> &str {
        &self.issue.title
    }

    fn labels(&self) -> Vec<&str> {
        self.issue.labels.iter().map(|l| l.title.as_str()).collect()
    }

    fn assignee_ids(&self) -> Vec<i64> {
        self.issue.assignee_ids.clone()
    }

    fn author_id(&self) -> i64 {
        self.issue.author_id
    }

    fn body(&self) -> &str {
        self.object_attributes.body()
    }

    fn url(&self) -> &str {
        &self.object_attributes.url
    }
}

impl CommentEvent for MergeCommentEvent {
    fn kind(&self) -> CommentKind {
        CommentKind::MergeRequest
    }

    fn sender_username(&self) -> &str {
        &self.user.username
    }

    fn project(&self) -> &EventProject {
        &self.project
    }

    fn iid(&self) -> i64 {
        self.merge_request.iid
    }

    fn title(&self) -> &str {
        &self.merge_request.title
    }

    fn labels(&self) -> Vec<&str> {
        self.merge_request
            .labels
            .iter()
            .map(|l| l.title.as_str())
            .collect()
    }

    fn assignee_ids(&self) -> Vec<i64> {
        self.merge_request.assignee_id.into_iter().collect()
    }

    fn author_id(&self) -> i64 {
        self.merge_request.author_id
    }

    fn body(&self) -> &str {
        self.object_attributes.body()
    }

    fn url(&self) -> &str {
        &self.object_attributes.url
    }
}

/// 解析后的 note webhook
#[derive(Debug, Clone)]
pub enum NoteEvent {
    Issue(IssueCommentEvent),
    MergeRequest(MergeCommentEvent),
}

impl NoteEvent {
    /// 从 webhook JSON 解析，根据 `noteable_type` 选择载荷类型
    ///
    /// commit / snippet 上的评论不在处理范围内，返回错误
    pub fn parse(payload: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(payload).context("Invalid webhook JSON")?;

        if let Some(kind) = value.get("object_kind").and_then(|v| v.as_str()) {
            if kind != "note" {
                return Err(anyhow!("Not a note event: object_kind={}", kind));
            }
        }

        let noteable_type = value
            .get("object_attributes")
            .and_then(|a| a.get("noteable_type"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        match noteable_type.as_str() {
            "Issue" => Ok(NoteEvent::Issue(
                serde_json::from_value(value).context("Invalid issue comment payload")?,
            )),
            "MergeRequest" => Ok(NoteEvent::MergeRequest(
                serde_json::from_value(value).context("Invalid merge request comment payload")?,
            )),
            other => Err(anyhow!("Unsupported noteable_type: {:?}", other)),
        }
    }

    pub fn kind(&self) -> CommentKind {
        self.as_comment().kind()
    }

    /// 统一视图
    pub fn as_comment(&self) -> &dyn CommentEvent {
        match self {
            NoteEvent::Issue(e) => e,
            NoteEvent::MergeRequest(e) => e,
        }
    }
}

/// GitLab 有时把空数组写成 `null`
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
