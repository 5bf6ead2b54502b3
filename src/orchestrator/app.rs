//! 批量论文处理器 - 编排层
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：读取配置、构造摘要模型、HTTP 客户端和产物存储
//! 2. **批量加载**：下载阶段读 URL 列表，其余阶段扫描论文目录
//! 3. **并发控制**：每个阶段用 Semaphore 限制同时处理的论文数
//! 4. **阶段统计**：汇总成功 / 跳过 / 失败数量

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::clients::{build_summarization_model, HttpClient, SummarizationModel};
use crate::config::Config;
use crate::infrastructure::ArtifactStore;
use crate::models::{load_urls, PaperId};
use crate::services::{PaperFetcher, Summarizer, TableExtractor, TextExtractor};
use crate::utils::logging::{log_stage_complete, log_stage_start, print_final_stats};
use crate::workflow::{FetchFlow, PaperCtx, ProcessResult, SummaryFlow, TableFlow};

/// 阶段名称
pub const STAGE_FETCH: &str = "下载";
pub const STAGE_SUMMARIZE: &str = "摘要";
pub const STAGE_TABLES: &str = "结果表";

/// 单个阶段的处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageStats {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

/// 应用主结构
pub struct App {
    config: Arc<Config>,
    store: ArtifactStore,
    fetch_flow: Arc<FetchFlow>,
    summary_flow: Arc<SummaryFlow>,
    table_flow: Arc<TableFlow>,
}

impl App {
    /// 初始化应用，按配置构造摘要模型
    pub fn initialize(config: Config) -> Result<Self> {
        let model = build_summarization_model(&config).context("无法创建摘要模型")?;
        Self::with_model(config, model)
    }

    /// 使用指定的摘要模型初始化应用
    pub fn with_model(config: Config, model: Arc<dyn SummarizationModel>) -> Result<Self> {
        config.validate().context("配置校验失败")?;
        let config = Arc::new(config);
        let store = ArtifactStore::new(&config);

        let http = HttpClient::new(&config).context("无法创建 HTTP 客户端")?;
        let fetcher = PaperFetcher::new(http, store.clone(), config.clone());
        let summarizer = Summarizer::new(model, &config);
        let table_extractor = TableExtractor::new().context("无法创建表格提取器")?;

        Ok(Self {
            fetch_flow: Arc::new(FetchFlow::new(fetcher, store.clone())),
            summary_flow: Arc::new(SummaryFlow::new(
                TextExtractor::new(&config),
                summarizer,
                store.clone(),
            )),
            table_flow: Arc::new(TableFlow::new(table_extractor, store.clone())),
            store,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 运行完整流水线：下载 → 摘要 → 结果表
    pub async fn run(&self) -> Result<Vec<(&'static str, StageStats)>> {
        let stages = vec![
            (STAGE_FETCH, self.run_fetch().await?),
            (STAGE_SUMMARIZE, self.run_summarize().await?),
            (STAGE_TABLES, self.run_tables().await?),
        ];

        print_final_stats(&stages, &self.config.logs_dir);
        Ok(stages)
    }

    /// 下载阶段
    pub async fn run_fetch(&self) -> Result<StageStats> {
        info!("\n📁 正在读取 URL 列表: {}", self.config.urls_file.display());
        let urls = load_urls(&self.config.urls_file).await?;
        if urls.is_empty() {
            warn!("⚠️ 没有找到待下载的 URL");
        }

        let flow = self.fetch_flow.clone();
        self.run_stage(STAGE_FETCH, urls, self.config.max_concurrent_downloads, move |index, url| {
            let flow = flow.clone();
            async move {
                let id = match PaperId::from_url(&url) {
                    Ok(id) => id,
                    Err(e) => {
                        error!("❌ 跳过 {}: {}", url, e);
                        return Err(anyhow::Error::from(e));
                    }
                };
                let ctx = PaperCtx::new(id, index);
                flow.run(&url, &ctx).await.inspect_err(|e| error!("{} ❌ {:#}", ctx, e))
            }
        })
        .await
    }

    /// 摘要阶段
    pub async fn run_summarize(&self) -> Result<StageStats> {
        let pdfs = self.scan_pdfs()?;
        let flow = self.summary_flow.clone();
        self.run_stage(
            STAGE_SUMMARIZE,
            pdfs,
            self.config.max_concurrent_summaries,
            move |index, (id, path): (PaperId, PathBuf)| {
                let flow = flow.clone();
                async move {
                    let ctx = PaperCtx::new(id, index);
                    flow.run(&path, &ctx).await.inspect_err(|e| error!("{} ❌ {:#}", ctx, e))
                }
            },
        )
        .await
    }

    /// 结果表阶段
    pub async fn run_tables(&self) -> Result<StageStats> {
        let pdfs = self.scan_pdfs()?;
        let flow = self.table_flow.clone();
        self.run_stage(
            STAGE_TABLES,
            pdfs,
            self.config.max_concurrent_tables,
            move |index, (id, path): (PaperId, PathBuf)| {
                let flow = flow.clone();
                async move {
                    let ctx = PaperCtx::new(id, index);
                    flow.run(&path, &ctx).await.inspect_err(|e| error!("{} ❌ {:#}", ctx, e))
                }
            },
        )
        .await
    }

    /// 扫描论文目录下的所有 PDF
    fn scan_pdfs(&self) -> Result<Vec<(PaperId, PathBuf)>> {
        let dir = self.store.dir(crate::models::ArtifactKind::Pdf);
        info!("\n📁 正在扫描论文目录: {}", dir.display());
        self.store
            .list_pdfs()
            .with_context(|| format!("无法读取论文目录: {}", dir.display()))
    }

    /// 用有界 worker 池处理一个阶段的所有论文
    ///
    /// 单篇论文的错误已在任务内记录，这里只计数。
    async fn run_stage<T, F, Fut>(
        &self,
        stage: &str,
        items: Vec<T>,
        max_concurrent: usize,
        job: F,
    ) -> Result<StageStats>
    where
        F: Fn(usize, T) -> Fut,
        Fut: Future<Output = Result<ProcessResult>> + Send + 'static,
    {
        let total = items.len();
        log_stage_start(stage, total, max_concurrent);

        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let mut handles = Vec::with_capacity(total);

        for (idx, item) in items.into_iter().enumerate() {
            let paper_index = idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let task = job(paper_index, item);

            let handle = tokio::spawn(async move {
                let _permit = permit;
                task.await
            });
            handles.push((paper_index, handle));
        }

        let mut stats = StageStats {
            total,
            ..Default::default()
        };

        for (paper_index, handle) in handles {
            match handle.await {
                Ok(Ok(ProcessResult::Success)) => stats.success += 1,
                Ok(Ok(ProcessResult::Skipped)) => stats.skipped += 1,
                Ok(Err(_)) => stats.failed += 1,
                Err(e) => {
                    error!("[第 {} 篇] 任务执行失败: {}", paper_index, e);
                    stats.failed += 1;
                }
            }
        }

        log_stage_complete(stage, &stats);
        Ok(stats)
    }
}
