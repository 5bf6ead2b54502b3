/// 日志工具模块
///
/// 初始化 tracing，并提供日志格式化和输出的辅助函数
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::orchestrator::StageStats;

/// 下载组件包含的模块
const DOWNLOADER_MODULES: &[&str] = &[
    "services::paper_fetcher",
    "services::full_text_links",
    "workflow::fetch_flow",
    "clients::http_client",
    "browser",
    "infrastructure::js_executor",
];

/// 摘要组件包含的模块
const SUMMARIZER_MODULES: &[&str] = &[
    "services::summarizer",
    "services::text_extractor",
    "workflow::summary_flow",
    "clients::openai_summarizer",
    "clients::hf_summarizer",
];

/// 结果表组件包含的模块
const TABLE_EXTRACTOR_MODULES: &[&str] = &["services::table_extractor", "workflow::table_flow"];

/// 按日志事件的模块路径找到所属组件
///
/// 编排层、配置等公共模块不属于任何组件，只写入主日志。
pub fn component_for_target(target: &str) -> Option<&'static str> {
    let module = target.strip_prefix("pubmed_analyzer::")?;
    if in_modules(module, DOWNLOADER_MODULES) {
        Some("downloader")
    } else if in_modules(module, SUMMARIZER_MODULES) {
        Some("summarizer")
    } else if in_modules(module, TABLE_EXTRACTOR_MODULES) {
        Some("table_extractor")
    } else {
        None
    }
}

fn in_modules(module: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| module.starts_with(prefix))
}

/// 初始化日志
///
/// 同时输出到终端和 `<logs_dir>/<component>.log`（追加写入，带时间戳）。
/// 流水线模式下，下载、摘要、结果表三个组件的日志还会分别写入
/// `downloader.log`、`summarizer.log`、`table_extractor.log`。
/// 重复调用不会报错。
///
/// # 参数
/// - `component`: 组件名，决定主日志文件名
/// - `logs_dir`: 日志目录
/// - `verbose`: 未设置 `RUST_LOG` 时是否输出 debug 日志
pub fn init(component: &str, logs_dir: &Path, verbose: bool) -> Result<()> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("无法创建日志目录: {}", logs_dir.display()))?;

    let log_file = open_log_file(logs_dir, component)?;
    let split = component == "pipeline";

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(log_file)),
        )
        .with(component_layer(split, logs_dir, "downloader")?)
        .with(component_layer(split, logs_dir, "summarizer")?)
        .with(component_layer(split, logs_dir, "table_extractor")?)
        .try_init();

    Ok(())
}

fn open_log_file(logs_dir: &Path, component: &str) -> Result<File> {
    let log_path = logs_dir.join(format!("{}.log", component));
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("无法打开日志文件: {}", log_path.display()))
}

/// 只接收某个组件事件的文件输出层，`enabled` 为假时不创建文件
fn component_layer<S>(
    enabled: bool,
    logs_dir: &Path,
    component: &'static str,
) -> Result<Option<impl Layer<S>>>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    if !enabled {
        return Ok(None);
    }
    let file = open_log_file(logs_dir, component)?;
    let layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .with_filter(filter_fn(move |meta| {
            component_for_target(meta.target()) == Some(component)
        }));
    Ok(Some(layer))
}

/// 记录程序启动信息
pub fn log_startup(command: &str, papers_dir: &Path) {
    info!("{}", "=".repeat(60));
    info!("🚀 PubMed 论文分析器启动 - {}", command);
    info!("📁 论文目录: {}", papers_dir.display());
    info!(
        "🕐 启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
}

/// 记录阶段开始信息
///
/// # 参数
/// - `stage`: 阶段名称
/// - `total`: 待处理数量
/// - `max_concurrent`: 最大并发数
pub fn log_stage_start(stage: &str, total: usize, max_concurrent: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始阶段: {}", stage);
    info!("📄 待处理: {} 篇 | 并发数: {}", total, max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录阶段完成信息
pub fn log_stage_complete(stage: &str, stats: &StageStats) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 阶段 {} 完成: 成功 {}, 跳过 {}, 失败 {} / 共 {}",
        stage, stats.success, stats.skipped, stats.failed, stats.total
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(stages: &[(&str, StageStats)], log_dir: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    for (stage, stats) in stages {
        info!(
            "{}: ✅ 成功 {} | ⏭️ 跳过 {} | ❌ 失败 {}",
            stage, stats.success, stats.skipped, stats.failed
        );
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_dir.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_is_char_aware() {
        assert_eq!(truncate_text("摘要生成完成", 2), "摘要...");
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[test]
    fn test_init_creates_component_log_file() {
        let dir = tempfile::tempdir().unwrap();
        init("pipeline", dir.path(), false).unwrap();
        // 第二次调用不应报错
        init("pipeline", dir.path(), true).unwrap();
        assert!(dir.path().join("pipeline.log").exists());
        assert!(dir.path().join("downloader.log").exists());
        assert!(dir.path().join("summarizer.log").exists());
        assert!(dir.path().join("table_extractor.log").exists());
    }

    #[test]
    fn test_api_log_has_no_component_files() {
        let dir = tempfile::tempdir().unwrap();
        init("api", dir.path(), false).unwrap();
        assert!(dir.path().join("api.log").exists());
        assert!(!dir.path().join("downloader.log").exists());
    }

    #[test]
    fn test_component_for_target() {
        assert_eq!(
            component_for_target("pubmed_analyzer::services::paper_fetcher"),
            Some("downloader")
        );
        assert_eq!(
            component_for_target("pubmed_analyzer::browser::session"),
            Some("downloader")
        );
        assert_eq!(
            component_for_target("pubmed_analyzer::workflow::summary_flow"),
            Some("summarizer")
        );
        assert_eq!(
            component_for_target("pubmed_analyzer::services::table_extractor"),
            Some("table_extractor")
        );
        assert_eq!(component_for_target("pubmed_analyzer::orchestrator::app"), None);
        assert_eq!(component_for_target("chromiumoxide::handler"), None);
    }
}
