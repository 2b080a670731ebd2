//! Comment Notify - 把 GitLab issue / merge request 评论转换为聊天通知

pub mod cli;
pub mod config;
pub mod infra;
pub mod notification;

pub use config::NotifyConfig;
pub use infra::{
    normalize_namespaced_project, StaticSubscriptionStore, StaticUserDirectory, SubscriptionStore,
    UserDirectory,
};
pub use notification::{
    CommentDispatcher, CommentEvent, CommentKind, DispatchOutcome, IssueCommentEvent,
    MergeCommentEvent, NoteEvent, NotificationDeduplicator, NotificationRecord, Subscription,
    Warning,
};
