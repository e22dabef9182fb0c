use anyhow::{Context, Result};
use clap::{value_parser, Arg, Command};
use scheduler_core::AppConfig;
use scheduler_observability::init_from_config;
use tokio::signal;
use tracing::{info, warn};

use scheduler::app::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = Command::new("scheduler")
        .version("1.0.0")
        .about("分布式任务调度系统")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径，未指定时搜索 config/scheduler.toml 和 scheduler.toml"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，覆盖配置文件")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式，覆盖配置文件")
                .value_parser(["json", "pretty"]),
        )
        .arg(
            Arg::new("tasks")
                .short('n')
                .long("tasks")
                .value_name("N")
                .help("演示任务数量")
                .value_parser(value_parser!(usize))
                .default_value("12"),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config");
    let task_count = matches.get_one::<usize>("tasks").copied().unwrap_or(12);

    // 加载配置
    let mut config = AppConfig::load(config_path.map(String::as_str))
        .with_context(|| format!("加载配置失败: {config_path:?}"))?;
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.observability.log_level = level.clone();
    }
    if let Some(format) = matches.get_one::<String>("log-format") {
        config.observability.log_format = format.clone();
    }

    // 初始化日志系统
    init_from_config(&config.observability).context("初始化日志系统失败")?;

    info!("启动分布式任务调度系统");
    let app = Application::new(config).await?;

    let outcome = tokio::select! {
        result = app.run(task_count) => result,
        _ = signal::ctrl_c() => {
            warn!("收到关闭信号，停止执行");
            Ok(Vec::new())
        }
    };

    app.shutdown().await;
    let summaries = outcome?;

    for summary in &summaries {
        println!("{}", serde_json::to_string_pretty(summary)?);
    }

    info!("分布式任务调度系统已退出");
    Ok(())
}
