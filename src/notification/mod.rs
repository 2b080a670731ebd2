//! 通知分发引擎 - 把 GitLab 评论事件转换为聊天通知
//!
//! # 组成
//! 1. `recipients`：作者和指派人（私信）
//! 2. `mention`：评论中 @ 到的用户（额外私信）
//! 3. `subscription`：订阅了项目的频道，按能力标记和标签过滤（广播）
//! 4. `formatter`：三种消息模板
//! 5. `deduplicator`：合并同一次分发中的重复消息
//! 6. `dispatcher`：串起以上步骤
//!
//! # 使用示例
//! ```ignore
//! use std::sync::Arc;
//! use comment_notify::infra::{StaticSubscriptionStore, StaticUserDirectory};
//! use comment_notify::notification::{CommentDispatcher, NoteEvent};
//!
//! let dispatcher = CommentDispatcher::new(
//!     Arc::new(StaticUserDirectory::new("https://gitlab.com")),
//!     Arc::new(StaticSubscriptionStore::new(vec![])),
//! );
//! let event = NoteEvent::parse(&payload)?;
//! let outcome = dispatcher.handle_note(&event).await?;
//! ```

pub mod deduplicator;
pub mod dispatcher;
pub mod event;
pub mod formatter;
pub mod mention;
pub mod recipients;
pub mod record;
pub mod subscription;

pub use deduplicator::NotificationDeduplicator;
pub use dispatcher::CommentDispatcher;
pub use event::{
    CommentEvent, CommentKind, EventLabel, EventProject, EventUser, IssueAttributes,
    IssueCommentEvent, MergeCommentEvent, MergeRequestAttributes, NoteAttributes, NoteEvent,
};
pub use formatter::MessageFormatter;
pub use mention::{mention_record, parse_usernames, MentionDetails};
pub use recipients::resolve_recipients;
pub use record::{DispatchOutcome, NotificationRecord, Warning};
pub use subscription::{select_channels, ChannelSelection, LabelFilterError, Subscription};
