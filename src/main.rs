use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pubmed_analyzer::orchestrator::App;
use pubmed_analyzer::utils::logging;
use pubmed_analyzer::{server, Config};

/// PubMed 论文分析器
#[derive(Parser, Debug)]
#[command(name = "pubmed-analyzer", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// 运行完整流水线：下载 → 摘要 → 结果表（默认）
    Run,
    /// 只下载论文
    Fetch,
    /// 只生成摘要
    Summarize,
    /// 只提取结果表
    Tables,
    /// 启动 HTTP 服务
    Serve,
}

impl Command {
    fn name(self) -> &'static str {
        match self {
            Command::Run => "run",
            Command::Fetch => "fetch",
            Command::Summarize => "summarize",
            Command::Tables => "tables",
            Command::Serve => "serve",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run);

    // 加载配置
    let config = Config::load().context("无法加载配置")?;

    // 初始化日志
    let component = if command == Command::Serve { "api" } else { "pipeline" };
    logging::init(component, &config.logs_dir, config.verbose_logging)?;
    logging::log_startup(command.name(), &config.papers_dir);

    if command == Command::Serve {
        return server::serve(&config).await;
    }

    // 初始化并运行应用
    let app = App::initialize(config)?;
    match command {
        Command::Fetch => {
            app.run_fetch().await?;
        }
        Command::Summarize => {
            app.run_summarize().await?;
        }
        Command::Tables => {
            app.run_tables().await?;
        }
        _ => {
            app.run().await?;
        }
    }

    Ok(())
}
