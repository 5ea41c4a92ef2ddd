use anyhow::Result;
use clap::{Parser, Subcommand};
use grading_queue_sync::{logger, App, AppError, Config};
use serde_json::{json, Value};

#[derive(Debug, Parser)]
#[command(name = "grading-queue-sync")]
#[command(about = "提取批改队列并与审阅人名单对账")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 运行一次完整提取
    Scrape,
    /// 列出所有快照中的记录
    Show,
    /// 列出某个审阅人名下的记录（`notassigned` 表示未分配）
    Reviewer { name: String },
    /// 列出未分配的记录
    Unassigned,
    /// 是否存在未分配记录
    Alert,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logger::init_with(config.verbose_logging);

    let app = App::from_config(config);

    let (body, ok) = match cli.command.unwrap_or(Commands::Show) {
        Commands::Scrape => envelope(app.run_extraction().await),
        Commands::Show => envelope(app.list_all_records().await),
        Commands::Reviewer { name } => envelope(app.list_records_for_reviewer(&name).await),
        Commands::Unassigned => envelope(app.list_unassigned_records().await),
        Commands::Alert => match app.has_unassigned_alert().await {
            Ok(alert) => (json!({ "alert": alert }), true),
            Err(e) => (error_body(&e), false),
        },
    };

    println!("{}", serde_json::to_string_pretty(&body)?);
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn envelope<T: serde::Serialize>(result: Result<T, AppError>) -> (Value, bool) {
    match result {
        Ok(data) => (json!({ "status": "success", "data": data }), true),
        Err(e) => (error_body(&e), false),
    }
}

fn error_body(err: &AppError) -> Value {
    json!({ "status": "error", "message": err.to_string() })
}
