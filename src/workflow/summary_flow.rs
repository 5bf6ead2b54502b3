//! 摘要流程 - 流程层
//!
//! 一篇论文的摘要流程：已存在则跳过 → 认领 → 提取文本并分块 → 逐块摘要 → 发布

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::{PaperCtx, ProcessResult};
use crate::infrastructure::ArtifactStore;
use crate::models::ArtifactKind;
use crate::services::{Summarizer, TextExtractor};
use crate::utils::logging::truncate_text;

/// 摘要流程
pub struct SummaryFlow {
    extractor: TextExtractor,
    summarizer: Summarizer,
    store: ArtifactStore,
}

impl SummaryFlow {
    pub fn new(extractor: TextExtractor, summarizer: Summarizer, store: ArtifactStore) -> Self {
        Self {
            extractor,
            summarizer,
            store,
        }
    }

    pub async fn run(&self, pdf_path: &Path, ctx: &PaperCtx) -> Result<ProcessResult> {
        let id = &ctx.paper_id;

        if self.store.exists(ArtifactKind::Summary, id) {
            info!("{} ⏭️ {} 已存在，跳过", ctx, ArtifactKind::Summary.label());
            return Ok(ProcessResult::Skipped);
        }

        let Some(_claim) = self
            .store
            .claim(ArtifactKind::Summary, id)
            .with_context(|| format!("无法认领 {}", ArtifactKind::Summary.file_name(id)))?
        else {
            info!("{} ⏭️ 摘要正由其他 worker 生成，跳过", ctx);
            return Ok(ProcessResult::Skipped);
        };

        // PDF 解析是同步的 CPU 密集操作
        let extractor = self.extractor.clone();
        let path = pdf_path.to_path_buf();
        let chunks = tokio::task::spawn_blocking(move || extractor.extract_chunks(&path))
            .await
            .context("文本提取任务异常退出")?
            .with_context(|| format!("无法提取 {} 的文本", pdf_path.display()))?;

        info!(
            "{} 📝 {} 个文本块，使用模型 {} 生成摘要...",
            ctx,
            chunks.len(),
            self.summarizer.model_name()
        );

        let summary = self.summarizer.summarize_chunks(&chunks).await?;

        self.store
            .publish_bytes(ArtifactKind::Summary, id, summary.as_bytes())
            .with_context(|| format!("无法写入 {}", ArtifactKind::Summary.file_name(id)))?;

        info!("{} ✓ 摘要已保存: {}", ctx, truncate_text(&summary, 80));
        Ok(ProcessResult::Success)
    }
}
