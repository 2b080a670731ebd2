//! 评论分发器 - 把一次评论事件转换为私信 + 频道广播记录
//!
//! 流程：
//! 1. 私信：作者和指派人一条，评论中有 @ 提及时再加一条
//! 2. 频道：查询订阅，按能力标记和标签过滤，命中的频道合成一条广播
//! 3. 私信在前、广播在后，最后统一去重
//!
//! 订阅查询失败会中止整次分发，不返回部分结果；标签格式错误只产生警告。

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use super::deduplicator::NotificationDeduplicator;
use super::event::{CommentEvent, IssueCommentEvent, MergeCommentEvent, NoteEvent};
use super::formatter::MessageFormatter;
use super::mention::{mention_record, MentionDetails};
use super::recipients::resolve_recipients;
use super::record::{DispatchOutcome, NotificationRecord, Warning};
use super::subscription::select_channels;
use crate::infra::{normalize_namespaced_project, SubscriptionStore, UserDirectory};

/// 评论分发器
///
/// 不持有可变状态，可以在多个任务间共享并发调用
#[derive(Clone)]
pub struct CommentDispatcher {
    directory: Arc<dyn UserDirectory>,
    store: Arc<dyn SubscriptionStore>,
}

impl CommentDispatcher {
    pub fn new(directory: Arc<dyn UserDirectory>, store: Arc<dyn SubscriptionStore>) -> Self {
        Self { directory, store }
    }

    /// 处理 issue 评论
    pub async fn handle_issue_comment(&self, event: &IssueCommentEvent) -> Result<DispatchOutcome> {
        self.handle_comment(event).await
    }

    /// 处理 merge request 评论
    pub async fn handle_merge_request_comment(
        &self,
        event: &MergeCommentEvent,
    ) -> Result<DispatchOutcome> {
        self.handle_comment(event).await
    }

    /// 按载荷类型分发
    pub async fn handle_note(&self, event: &NoteEvent) -> Result<DispatchOutcome> {
        match event {
            NoteEvent::Issue(e) => self.handle_issue_comment(e).await,
            NoteEvent::MergeRequest(e) => self.handle_merge_request_comment(e).await,
        }
    }

    async fn handle_comment(&self, event: &dyn CommentEvent) -> Result<DispatchOutcome> {
        let mut records = self.direct_records(event);

        let (channel_record, warnings) = self.channel_record(event).await?;
        records.extend(channel_record);

        let records = NotificationDeduplicator::dedup(records);

        info!(
            kind = ?event.kind(),
            project = %event.project().path_with_namespace,
            iid = event.iid(),
            records = records.len(),
            warnings = warnings.len(),
            "Comment dispatched"
        );

        Ok(DispatchOutcome { records, warnings })
    }

    /// 私信记录：作者/指派人，加上可选的提及记录
    fn direct_records(&self, event: &dyn CommentEvent) -> Vec<NotificationRecord> {
        let sender = event.sender_username();
        let sender_url = self.directory.get_user_url(sender);

        let mut records = vec![NotificationRecord::direct(
            sender,
            MessageFormatter::direct_message(event, &sender_url),
            resolve_recipients(event, self.directory.as_ref()),
        )];

        let details = MentionDetails {
            sender_username: sender,
            path_with_namespace: &event.project().path_with_namespace,
            iid: event.iid().to_string(),
            url: event.url(),
            body: event.body(),
        };
        if let Some(mention) = mention_record(&details, self.directory.as_ref()) {
            records.push(mention);
        }

        records
    }

    /// 频道广播记录，没有命中的频道时为 `None`
    async fn channel_record(
        &self,
        event: &dyn CommentEvent,
    ) -> Result<(Option<NotificationRecord>, Vec<Warning>)> {
        let project = event.project();
        let (namespace, name) = normalize_namespaced_project(&project.path_with_namespace);
        let subscriptions = self
            .store
            .get_subscribed_channels_for_project(&namespace, &name, project.is_public())
            .await?;

        let labels = event.labels();
        let selection = select_channels(&subscriptions, event.kind(), &labels);

        if selection.channels.is_empty() {
            return Ok((None, selection.warnings));
        }

        let sender = event.sender_username();
        let sender_url = self.directory.get_user_url(sender);
        let record = NotificationRecord::channel(
            sender,
            MessageFormatter::channel_message(event, &sender_url),
            selection.channels,
        );
        Ok((Some(record), selection.warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{StaticSubscriptionStore, StaticUserDirectory};
    use crate::notification::event::{
        EventLabel, EventProject, EventUser, IssueAttributes, MergeRequestAttributes,
        NoteAttributes,
    };
    use crate::notification::subscription::Subscription;
    use async_trait::async_trait;

    const WARNING: &str = "each label must be wrapped in quotes, e.g. label:\"bug\"";

    /// 测试用的失败存储
    struct FailingStore;

    #[async_trait]
    impl SubscriptionStore for FailingStore {
        async fn get_subscribed_channels_for_project(
            &self,
            _namespace: &str,
            _project: &str,
            _is_public: bool,
        ) -> Result<Vec<Subscription>> {
            Err(anyhow::anyhow!("kv store unavailable"))
        }
    }

    fn directory() -> Arc<dyn UserDirectory> {
        Arc::new(
            StaticUserDirectory::new("http://my.gitlab.com")
                .with_user(1, "root")
                .with_user(2, "manland")
                .with_user(3, "alice"),
        )
    }

    fn dispatcher(subs: Vec<Subscription>) -> CommentDispatcher {
        CommentDispatcher::new(directory(), Arc::new(StaticSubscriptionStore::new(subs)))
    }

    fn project() -> EventProject {
        EventProject {
            web_url: "http://localhost:3000/manland/webhook".to_string(),
            path_with_namespace: "manland/webhook".to_string(),
            visibility: Some("public".to_string()),
            ..Default::default()
        }
    }

    fn issue_event(body: &str, labels: &[&str]) -> IssueCommentEvent {
        IssueCommentEvent {
            object_kind: "note".to_string(),
            user: EventUser {
                username: "manland".to_string(),
                ..Default::default()
            },
            project: project(),
            object_attributes: NoteAttributes {
                description: body.to_string(),
                noteable_type: "Issue".to_string(),
                url: "http://localhost:3000/manland/webhook/issues/1#note_997".to_string(),
                ..Default::default()
            },
            issue: IssueAttributes {
                iid: 1,
                title: "test new issue".to_string(),
                author_id: 1,
                assignee_ids: vec![3],
                labels: labels
                    .iter()
                    .map(|l| EventLabel {
                        id: 0,
                        title: l.to_string(),
                    })
                    .collect(),
                ..Default::default()
            },
        }
    }

    fn merge_event() -> MergeCommentEvent {
        MergeCommentEvent {
            object_kind: "note".to_string(),
            user: EventUser {
                username: "manland".to_string(),
                ..Default::default()
            },
            project: project(),
            object_attributes: NoteAttributes {
                description: "coucou".to_string(),
                noteable_type: "MergeRequest".to_string(),
                url: "http://localhost:3000/manland/webhook/merge_requests/6#note_999".to_string(),
                ..Default::default()
            },
            merge_request: MergeRequestAttributes {
                iid: 6,
                title: "Update README.md".to_string(),
                author_id: 1,
                assignee_id: Some(1),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_issue_comment_dm_then_channel() {
        let d = dispatcher(vec![Subscription::new(
            "channel1",
            "1",
            "issue_comments",
            "manland/webhook",
        )]);
        let outcome = d.handle_issue_comment(&issue_event("coucou3", &[])).await.unwrap();

        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.records[0].is_direct());
        assert_eq!(outcome.records[0].to_users, vec!["alice", "root"]);
        assert!(outcome.records[1].is_channel());
        assert_eq!(outcome.records[1].to_channels, vec!["channel1"]);
        assert!(outcome.records[1].message.ends_with(":\n\ncoucou3"));
    }

    #[tokio::test]
    async fn test_no_matching_subscription_only_dm() {
        let d = dispatcher(vec![Subscription::new(
            "channel1",
            "1",
            "merge_request_comments",
            "manland/webhook",
        )]);
        let outcome = d.handle_issue_comment(&issue_event("hi", &[])).await.unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.records[0].is_direct());
    }

    #[tokio::test]
    async fn test_malformed_label_filter_warns() {
        let d = dispatcher(vec![
            Subscription::new("channel1", "1", "issue_comments,label:", "manland/webhook"),
            Subscription::new("channel2", "1", "issue_comments,label:", "manland/webhook"),
        ]);
        let outcome = d.handle_issue_comment(&issue_event("hi", &["bug"])).await.unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.warnings, vec![WARNING, WARNING]);
    }

    #[tokio::test]
    async fn test_label_filter_matches_event_label() {
        let d = dispatcher(vec![
            Subscription::new("bugs", "1", "issue_comments,label:\"bug\"", "manland/webhook"),
            Subscription::new("docs", "1", "issue_comments,label:\"docs\"", "manland/webhook"),
        ]);
        let outcome = d
            .handle_issue_comment(&issue_event("hi", &["ui", "bug"]))
            .await
            .unwrap();
        assert_eq!(outcome.records.last().unwrap().to_channels, vec!["bugs"]);
    }

    #[tokio::test]
    async fn test_merge_request_label_filter_without_labels() {
        let d = dispatcher(vec![Subscription::new(
            "channel1",
            "1",
            "merge_request_comments,label:\"bug\"",
            "manland/webhook",
        )]);
        let outcome = d.handle_merge_request_comment(&merge_event()).await.unwrap();
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].to_users, vec!["root"]);
        assert!(outcome.records[0].message.contains("commented on your merge request"));
    }

    #[tokio::test]
    async fn test_mention_record_follows_dm() {
        let d = dispatcher(vec![]);
        let outcome = d
            .handle_issue_comment(&issue_event("@bob can you check?", &[]))
            .await
            .unwrap();
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[1].to_users, vec!["bob"]);
        assert!(outcome.records[1].message.contains("mentioned you on [manland/webhook#1]"));
    }

    #[tokio::test]
    async fn test_store_failure_aborts_dispatch() {
        let d = CommentDispatcher::new(directory(), Arc::new(FailingStore));
        let err = d
            .handle_issue_comment(&issue_event("hi", &[]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("kv store unavailable"));
    }

    #[tokio::test]
    async fn test_dispatch_is_idempotent() {
        let d = dispatcher(vec![Subscription::new(
            "channel1",
            "1",
            "issue_comments",
            "manland/webhook",
        )]);
        let event = NoteEvent::Issue(issue_event("@alice hi", &[]));
        let first = d.handle_note(&event).await.unwrap();
        let second = d.handle_note(&event).await.unwrap();
        assert_eq!(first, second);
    }
}
