//! 私信接收者解析

use super::event::CommentEvent;
use crate::infra::UserDirectory;

/// 解析私信接收者：指派人在前（保持原顺序），作者总在最后
///
/// 这里不去重，也不过滤未知用户（空字符串），这些在去重阶段统一处理
pub fn resolve_recipients(event: &dyn CommentEvent, directory: &dyn UserDirectory) -> Vec<String> {
    let mut recipients: Vec<String> = event
        .assignee_ids()
        .into_iter()
        .map(|id| directory.get_username_by_id(id))
        .collect();
    recipients.push(directory.get_username_by_id(event.author_id()));
    recipients
}
