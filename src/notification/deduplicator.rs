//! 通知去重器 - 合并同一次分发中重复的通知
//!
//! 同一事件可能产生文本完全相同的多条记录（例如私信与提及恰好渲染出同一句话），
//! 此模块把它们合并成一条消息，接收者列表拼接。
//!
//! ## 去重策略
//! 1. `from` 和 `message` 都相同的记录合并，保留最早那条的位置
//! 2. 接收者清理：去掉空用户名和发送者本人，重复的用户/频道只保留第一次
//! 3. 清理后没有接收者的记录直接丢弃
//!
//! 不跨事件去重，每次调用互不影响。

use tracing::debug;

use super::record::NotificationRecord;

/// 通知去重器
pub struct NotificationDeduplicator;

impl NotificationDeduplicator {
    /// 合并并清理记录
    pub fn dedup(records: Vec<NotificationRecord>) -> Vec<NotificationRecord> {
        Self::merge(records)
            .into_iter()
            .map(Self::clean)
            .filter(|r| !r.is_empty())
            .collect()
    }

    /// 合并 `from` + `message` 相同的记录
    pub fn merge(records: Vec<NotificationRecord>) -> Vec<NotificationRecord> {
        let mut merged: Vec<NotificationRecord> = Vec::with_capacity(records.len());

        for record in records {
            match merged
                .iter_mut()
                .find(|r| r.from == record.from && r.message == record.message)
            {
                Some(existing) => {
                    debug!(
                        from = %record.from,
                        users = record.to_users.len(),
                        channels = record.to_channels.len(),
                        "Notification merged into identical message"
                    );
                    existing.to_users.extend(record.to_users);
                    existing.to_channels.extend(record.to_channels);
                }
                None => merged.push(record),
            }
        }

        merged
    }

    /// 清理单条记录的接收者
    fn clean(mut record: NotificationRecord) -> NotificationRecord {
        let from = record.from.clone();
        record.to_users = Self::unique(record.to_users, |u| !u.is_empty() && *u != from);
        record.to_channels = Self::unique(record.to_channels, |c| !c.is_empty());
        record
    }

    /// 按首次出现顺序去重
    fn unique(items: Vec<String>, keep: impl Fn(&String) -> bool) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(items.len());
        for item in items {
            if keep(&item) && !out.contains(&item) {
                out.push(item);
            }
        }
        out
    }
}
