//! Comment Notify CLI
//!
//! 把 GitLab note webhook 转换为聊天通知记录

use anyhow::Result;
use clap::{Parser, Subcommand};
use comment_notify::cli::{handle_check, handle_dispatch, CheckArgs, DispatchArgs};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "cnotify")]
#[command(about = "Comment Notify - 把 GitLab 评论转换为聊天通知")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 处理一个 note webhook 载荷，输出通知记录
    Dispatch(DispatchArgs),
    /// 检查订阅的 feature 描述是否命中
    CheckSubscription(CheckArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 控制日志级别，默认为 info
    // 例如: RUST_LOG=debug cnotify dispatch --payload note.json
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("comment_notify=info,cnotify=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Dispatch(args) => {
            handle_dispatch(args).await?;
        }
        Commands::CheckSubscription(args) => {
            handle_check(args)?;
        }
    }

    Ok(())
}
