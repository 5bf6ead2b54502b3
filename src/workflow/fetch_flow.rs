//! 下载流程 - 流程层
//!
//! 一篇论文的下载流程：已存在则跳过 → 认领 → 下载并发布

use anyhow::{Context, Result};
use tracing::info;

use super::{PaperCtx, ProcessResult};
use crate::infrastructure::ArtifactStore;
use crate::models::ArtifactKind;
use crate::services::PaperFetcher;

/// 下载流程
///
/// - 决定是否需要下载
/// - 不持有浏览器资源（由下载服务按需打开）
pub struct FetchFlow {
    fetcher: PaperFetcher,
    store: ArtifactStore,
}

impl FetchFlow {
    pub fn new(fetcher: PaperFetcher, store: ArtifactStore) -> Self {
        Self { fetcher, store }
    }

    pub async fn run(&self, url: &str, ctx: &PaperCtx) -> Result<ProcessResult> {
        let id = &ctx.paper_id;

        if self.store.exists(ArtifactKind::Pdf, id) {
            info!("{} ⏭️ {} 已存在，跳过", ctx, ArtifactKind::Pdf.label());
            return Ok(ProcessResult::Skipped);
        }

        let Some(_claim) = self
            .store
            .claim(ArtifactKind::Pdf, id)
            .with_context(|| format!("无法认领 {}", ArtifactKind::Pdf.file_name(id)))?
        else {
            info!("{} ⏭️ PDF 正由其他 worker 下载，跳过", ctx);
            return Ok(ProcessResult::Skipped);
        };

        info!("{} 📥 开始下载: {}", ctx, url);
        let path = self
            .fetcher
            .fetch(url, id)
            .await
            .with_context(|| format!("下载 {} 失败", url))?;

        info!("{} ✓ PDF 已保存: {}", ctx, path.display());
        Ok(ProcessResult::Success)
    }
}
