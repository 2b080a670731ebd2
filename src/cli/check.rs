//! CheckSubscription 命令 - 调试订阅的 feature 描述

use anyhow::{anyhow, Result};
use clap::Args;
use serde::Serialize;

use crate::notification::{select_channels, CommentKind, Subscription};

/// CheckSubscription 命令参数
#[derive(Args)]
pub struct CheckArgs {
    /// feature 描述，如 `issue_comments,label:"bug"`
    #[arg(long, short)]
    pub features: String,

    /// 事件标签，逗号分隔
    #[arg(long, short, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// 事件类型: issue, merge-request
    #[arg(long, short, default_value = "issue")]
    pub kind: String,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 检查结果
#[derive(Debug, Serialize, PartialEq)]
pub struct CheckOutput {
    pub matched: bool,
    pub flags: Vec<String>,
    pub labels: Vec<String>,
    pub warnings: Vec<String>,
}

fn parse_kind(kind: &str) -> Result<CommentKind> {
    match kind {
        "issue" => Ok(CommentKind::Issue),
        "merge-request" | "mr" => Ok(CommentKind::MergeRequest),
        other => Err(anyhow!("Unknown kind: {} (expected issue or merge-request)", other)),
    }
}

/// 计算一个 feature 描述对给定事件是否命中
pub fn check_subscription(args: &CheckArgs) -> Result<CheckOutput> {
    let kind = parse_kind(&args.kind)?;
    let sub = Subscription::new("check", "", args.features.clone(), "");
    let event_labels: Vec<&str> = args.labels.iter().map(|l| l.trim()).collect();
    let selection = select_channels(std::slice::from_ref(&sub), kind, &event_labels);

    Ok(CheckOutput {
        matched: !selection.channels.is_empty(),
        flags: sub.flags().into_iter().map(String::from).collect(),
        labels: sub.labels().unwrap_or_default(),
        warnings: selection.warnings,
    })
}

/// 处理 check-subscription 命令
pub fn handle_check(args: CheckArgs) -> Result<()> {
    let output = check_subscription(&args)?;

    if args.json {
        println!("{}", super::output::format_output(&output));
        return Ok(());
    }

    println!("matched: {}", output.matched);
    println!("flags:   {}", output.flags.join(", "));
    if !output.labels.is_empty() {
        println!("labels:  {}", output.labels.join(", "));
    }
    for warning in &output.warnings {
        println!("warning: {}", warning);
    }
    Ok(())
}
