//! @ 提及检测 - 评论正文中提到的用户额外收到一条私信

use std::sync::OnceLock;

use regex::Regex;

use super::formatter::MessageFormatter;
use super::record::NotificationRecord;
use crate::infra::UserDirectory;

/// 生成提及通知所需的上下文
#[derive(Debug, Clone)]
pub struct MentionDetails<'a> {
    pub sender_username: &'a str,
    pub path_with_namespace: &'a str,
    pub iid: String,
    pub url: &'a str,
    pub body: &'a str,
}

fn mention_regex() -> &'static Regex {
    // 前一个字符不能是单词字符、@、. 或 /，排除邮箱和路径
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[^\w@./])@([A-Za-z0-9_][A-Za-z0-9_.\-]*)").expect("mention regex is valid")
    })
}

/// 提取正文中的 GitLab 用户名，按首次出现顺序去重
pub fn parse_usernames(text: &str) -> Vec<String> {
    let mut usernames: Vec<String> = Vec::new();

    for caps in mention_regex().captures_iter(text) {
        let name = caps[1].trim_end_matches(&['.', '-'][..]);
        if name.is_empty() || usernames.iter().any(|u| u == name) {
            continue;
        }
        usernames.push(name.to_string());
    }

    usernames
}

/// 如果正文里有 @ 提及，生成一条发给被提及用户的私信记录
///
/// 不与作者/指派人通知做去重，两者可以重叠
pub fn mention_record(
    details: &MentionDetails<'_>,
    directory: &dyn UserDirectory,
) -> Option<NotificationRecord> {
    let mentioned = parse_usernames(details.body);
    if mentioned.is_empty() {
        return None;
    }

    let sender_url = directory.get_user_url(details.sender_username);
    Some(NotificationRecord::direct(
        details.sender_username,
        MessageFormatter::mention_message(details, &sender_url),
        mentioned,
    ))
}
