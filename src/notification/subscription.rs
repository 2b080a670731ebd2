//! 订阅过滤 - 根据 feature 标记和标签过滤决定广播到哪些频道
//!
//! feature 描述是逗号分隔的 token 列表，例如：
//! ```text
//! issues,issue_comments,label:"bug",label:"needs review"
//! ```
//! - 能力标记决定订阅关心哪些事件
//! - `label:"<name>"` 是可选的标签过滤，多个标签之间是 OR 关系
//! - 没有标签过滤时订阅无条件匹配

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::event::CommentKind;
use super::record::Warning;

/// 评论相关的能力标记
pub mod features {
    pub const ISSUE_COMMENTS: &str = "issue_comments";
    pub const MERGE_REQUEST_COMMENTS: &str = "merge_request_comments";
}

const LABEL_PREFIX: &str = "label:";

/// 标签过滤格式错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFilterError;

impl fmt::Display for LabelFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "each label must be wrapped in quotes, e.g. label:\"bug\"")
    }
}

impl std::error::Error for LabelFilterError {}

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^label:"([^"]+)"$"#).expect("label regex is valid"))
}

/// 一个频道对一个仓库（或命名空间）的订阅
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub channel_id: String,
    #[serde(default)]
    pub creator_id: String,
    /// feature 描述
    #[serde(default)]
    pub features: String,
    /// `namespace/project` 或 `namespace`
    pub repository: String,
}

impl Subscription {
    pub fn new(
        channel_id: impl Into<String>,
        creator_id: impl Into<String>,
        features: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            creator_id: creator_id.into(),
            features: features.into(),
            repository: repository.into(),
        }
    }

    /// 拆分 feature 描述，引号内的逗号不作为分隔符
    fn tokens(&self) -> Vec<&str> {
        let mut tokens = Vec::new();
        let mut in_quotes = false;
        let mut start = 0;

        for (i, c) in self.features.char_indices() {
            match c {
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => {
                    tokens.push(&self.features[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        tokens.push(&self.features[start..]);

        tokens
            .into_iter()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// 能力 token（不含标签过滤）
    pub fn flags(&self) -> Vec<&str> {
        self.tokens()
            .into_iter()
            .filter(|t| !t.starts_with(LABEL_PREFIX))
            .collect()
    }

    /// 是否包含某个能力标记
    pub fn has_feature(&self, feature: &str) -> bool {
        self.flags().contains(&feature)
    }

    /// 订阅是否关心这种评论
    pub fn wants(&self, kind: CommentKind) -> bool {
        self.has_feature(kind.feature())
    }

    /// 标签过滤中的标签名
    ///
    /// 以 `label:` 开头的 token 必须是 `label:"<name>"`，否则整个过滤视为格式错误
    pub fn labels(&self) -> Result<Vec<String>, LabelFilterError> {
        self.tokens()
            .into_iter()
            .filter(|t| t.starts_with(LABEL_PREFIX))
            .map(|t| {
                label_regex()
                    .captures(t)
                    .map(|c| c[1].to_string())
                    .ok_or(LabelFilterError)
            })
            .collect()
    }

    /// 事件标签是否满足标签过滤
    ///
    /// 返回 `(是否匹配, 警告)`。格式错误时不匹配并给出警告，
    /// 格式正确但没有交集时不匹配也没有警告。标签比较区分大小写。
    pub fn matches_labels(&self, event_labels: &[&str]) -> (bool, Option<Warning>) {
        match self.labels() {
            Err(e) => (false, Some(e.to_string())),
            Ok(labels) if labels.is_empty() => (true, None),
            Ok(labels) => {
                let hit = labels
                    .iter()
                    .any(|wanted| event_labels.iter().any(|have| have == wanted));
                (hit, None)
            }
        }
    }
}

/// 频道过滤结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelSelection {
    /// 命中的频道，顺序与订阅顺序一致，不去重
    pub channels: Vec<String>,
    pub warnings: Vec<Warning>,
}

/// 按事件类型和标签过滤订阅
pub fn select_channels(
    subscriptions: &[Subscription],
    kind: CommentKind,
    event_labels: &[&str],
) -> ChannelSelection {
    let mut selection = ChannelSelection::default();

    for sub in subscriptions {
        if !sub.wants(kind) {
            debug!(
                channel = %sub.channel_id,
                feature = kind.feature(),
                "Subscription skipped (feature not enabled)"
            );
            continue;
        }

        let (ok, warning) = sub.matches_labels(event_labels);
        if !ok {
            match warning {
                Some(w) => {
                    warn!(
                        channel = %sub.channel_id,
                        features = %sub.features,
                        "Subscription has malformed label filter"
                    );
                    selection.warnings.push(w);
                }
                None => {
                    debug!(channel = %sub.channel_id, "Subscription skipped (no matching label)");
                }
            }
            continue;
        }

        selection.channels.push(sub.channel_id.clone());
    }

    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    const WARNING: &str = "each label must be wrapped in quotes, e.g. label:\"bug\"";

    fn sub(channel: &str, features: &str) -> Subscription {
        Subscription::new(channel, "1", features, "manland/webhook")
    }

    #[test]
    fn test_flags_ignore_labels_and_whitespace() {
        let s = sub("c", " issues , issue_comments,label:\"bug\",");
        assert_eq!(s.flags(), vec!["issues", "issue_comments"]);
        assert!(s.wants(CommentKind::Issue));
        assert!(!s.wants(CommentKind::MergeRequest));
    }

    #[test]
    fn test_labels_none() {
        assert_eq!(sub("c", "issue_comments").labels(), Ok(vec![]));
    }

    #[test]
    fn test_labels_quoted() {
        let s = sub("c", "issue_comments,label:\"bug\",label:\"needs review\"");
        assert_eq!(
            s.labels(),
            Ok(vec!["bug".to_string(), "needs review".to_string()])
        );
    }

    #[test]
    fn test_labels_malformed() {
        for features in [
            "issue_comments,label:",
            "issue_comments,label:bug",
            "issue_comments,label:\"\"",
            "issue_comments,label:\"bug\",label:",
        ] {
            let err = sub("c", features).labels().unwrap_err();
            assert_eq!(err.to_string(), WARNING, "features: {}", features);
        }
    }

    #[test]
    fn test_matches_labels_or_semantics() {
        let s = sub("c", "issue_comments,label:\"bug\",label:\"ui\"");
        assert_eq!(s.matches_labels(&["docs", "ui"]), (true, None));
        assert_eq!(s.matches_labels(&["docs"]), (false, None));
        assert_eq!(s.matches_labels(&[]), (false, None));
    }

    #[test]
    fn test_matches_labels_case_sensitive() {
        let s = sub("c", "issue_comments,label:\"Bug\"");
        assert_eq!(s.matches_labels(&["bug"]), (false, None));
    }

    #[test]
    fn test_select_channels_requires_feature() {
        let subs = vec![
            sub("c1", "issues,label:\"bug\""),
            sub("c2", "merge_request_comments"),
            sub("c3", "issue_comments"),
        ];
        let selection = select_channels(&subs, CommentKind::Issue, &["bug"]);
        assert_eq!(selection.channels, vec!["c3"]);
        assert!(selection.warnings.is_empty());
    }

    #[test]
    fn test_select_channels_keeps_order_and_duplicates() {
        let subs = vec![
            sub("c2", "issue_comments"),
            sub("c1", "issue_comments"),
            Subscription::new("c2", "7", "issue_comments", "manland"),
        ];
        let selection = select_channels(&subs, CommentKind::Issue, &[]);
        assert_eq!(selection.channels, vec!["c2", "c1", "c2"]);
    }

    #[test]
    fn test_select_channels_warning_per_malformed_subscription() {
        let subs = vec![
            sub("c1", "issue_comments,label:"),
            sub("c2", "issue_comments"),
            sub("c3", "issue_comments,label:bug"),
        ];
        let selection = select_channels(&subs, CommentKind::Issue, &["bug"]);
        assert_eq!(selection.channels, vec!["c2"]);
        assert_eq!(selection.warnings, vec![WARNING, WARNING]);
    }

    #[test]
    fn test_select_channels_malformed_without_feature_is_silent() {
        let subs = vec![sub("c1", "merge_request_comments,label:")];
        let selection = select_channels(&subs, CommentKind::Issue, &[]);
        assert!(selection.channels.is_empty());
        assert!(selection.warnings.is_empty());
    }

    #[test]
    fn test_label_name_containing_label_prefix() {
        let s = sub("c", "issue_comments,label:\"needs label: triage\"");
        assert_eq!(s.labels(), Ok(vec!["needs label: triage".to_string()]));

        let selection = select_channels(&[s], CommentKind::Issue, &["needs label: triage"]);
        assert_eq!(selection.channels, vec!["c"]);
        assert!(selection.warnings.is_empty());
    }

    #[test]
    fn test_label_name_containing_comma() {
        let s = sub("c", "merges,label:\"a,issue_comments\"");
        assert_eq!(s.flags(), vec!["merges"]);
        assert!(!s.wants(CommentKind::Issue));
        assert_eq!(s.labels(), Ok(vec!["a,issue_comments".to_string()]));
    }

    #[test]
    fn test_unterminated_quote_is_malformed() {
        let s = sub("c", "issue_comments,label:\"bug,label:\"ui\"");
        assert_eq!(s.labels(), Err(LabelFilterError));
    }
}
