// src/cli/dispatch.rs
//! Dispatch 命令 - 处理一个 note webhook 载荷并输出通知记录
//!
//! 只生成记录，不投递。投递由下游的聊天集成负责。

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::output::format_output;
use crate::config::NotifyConfig;
use crate::notification::{DispatchOutcome, NoteEvent, NotificationRecord};

/// Dispatch 命令参数
#[derive(Args)]
pub struct DispatchArgs {
    /// webhook JSON 文件，`-` 表示 stdin
    #[arg(long, short)]
    pub payload: String,

    /// 配置文件（默认 ~/.config/comment-notify/config.json）
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 读取载荷
fn read_payload(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read payload from stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(source).with_context(|| format!("Failed to read payload {}", source))
    }
}

/// 人类可读的记录
pub fn render_record(record: &NotificationRecord) -> String {
    let target = if record.to_channels.is_empty() {
        format!("DM -> {}", record.to_users.join(", "))
    } else {
        format!("Channels -> {}", record.to_channels.join(", "))
    };
    format!("[{}] from {}\n{}", target, record.from, record.message)
}

/// 处理 dispatch 命令
pub async fn handle_dispatch(args: DispatchArgs) -> Result<DispatchOutcome> {
    let config = NotifyConfig::load(args.config.as_deref())?;
    let payload = read_payload(&args.payload)?;
    let event = NoteEvent::parse(&payload)?;

    let outcome = config.build_dispatcher().handle_note(&event).await?;

    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }

    if args.json {
        println!("{}", format_output(&outcome.records));
    } else if outcome.records.is_empty() {
        println!("No notifications");
    } else {
        for record in &outcome.records {
            println!("{}\n", render_record(record));
        }
    }

    Ok(outcome)
}
