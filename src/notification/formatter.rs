//! 消息格式化模块 - 将评论事件渲染为聊天消息文本
//!
//! 三种模板：
//! - 私信：通知作者和指派人有人评论
//! - 频道：广播评论全文到订阅频道
//! - 提及：通知评论中被 @ 的用户
//!
//! 所有函数都是纯函数，缺失的字段渲染为空字符串。

use super::event::CommentEvent;
use super::mention::MentionDetails;

/// 消息格式化器
pub struct MessageFormatter;

impl MessageFormatter {
    /// 私信文本
    ///
    /// ```text
    /// [manland](http://gitlab/manland) commented on your issue [manland/webhook#1](http://.../issues/1#note_997)
    /// ```
    pub fn direct_message(event: &dyn CommentEvent, sender_url: &str) -> String {
        format!(
            "[{}]({}) commented on your {} [{}#{}]({})",
            event.sender_username(),
            sender_url,
            event.kind().noun(),
            event.project().path_with_namespace,
            event.iid(),
            event.url(),
        )
    }

    /// 频道广播文本，包含评论全文
    pub fn channel_message(event: &dyn CommentEvent, sender_url: &str) -> String {
        let project = event.project();
        format!(
            "[{}]({}) New comment by [{}]({}) on [#{} {}]({}):\n\n{}",
            project.path_with_namespace,
            project.web_url,
            event.sender_username(),
            sender_url,
            event.iid(),
            event.title(),
            event.url(),
            event.body(),
        )
    }

    /// 提及文本，正文以引用形式附上
    pub fn mention_message(details: &MentionDetails<'_>, sender_url: &str) -> String {
        format!(
            "[{}]({}) mentioned you on [{}#{}]({}):\n>{}",
            details.sender_username,
            sender_url,
            details.path_with_namespace,
            details.iid,
            details.url,
            details.body,
        )
    }
}
