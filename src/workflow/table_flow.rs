//! 结果表流程 - 流程层
//!
//! 一篇论文的结果表流程：已存在则跳过 → 认领 → 识别结果表 → 写 CSV

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::{PaperCtx, ProcessResult};
use crate::infrastructure::ArtifactStore;
use crate::models::ArtifactKind;
use crate::services::table_extractor::write_csv;
use crate::services::TableExtractor;

/// 结果表流程
pub struct TableFlow {
    extractor: TableExtractor,
    store: ArtifactStore,
}

impl TableFlow {
    pub fn new(extractor: TableExtractor, store: ArtifactStore) -> Self {
        Self { extractor, store }
    }

    /// 执行结果表流程
    ///
    /// 没有识别到结果表时不写文件，记为跳过。
    pub async fn run(&self, pdf_path: &Path, ctx: &PaperCtx) -> Result<ProcessResult> {
        let id = &ctx.paper_id;

        if self.store.exists(ArtifactKind::Table, id) {
            info!("{} ⏭️ {} 已存在，跳过", ctx, ArtifactKind::Table.label());
            return Ok(ProcessResult::Skipped);
        }

        let Some(_claim) = self
            .store
            .claim(ArtifactKind::Table, id)
            .with_context(|| format!("无法认领 {}", ArtifactKind::Table.file_name(id)))?
        else {
            info!("{} ⏭️ 结果表正由其他 worker 提取，跳过", ctx);
            return Ok(ProcessResult::Skipped);
        };

        let extractor = self.extractor.clone();
        let path = pdf_path.to_path_buf();
        let table = tokio::task::spawn_blocking(move || extractor.extract_results_table(&path))
            .await
            .context("表格提取任务异常退出")?
            .with_context(|| format!("无法解析 {}", pdf_path.display()))?;

        let Some(rows) = table else {
            warn!("{} ⚠️ no results table found in {}", ctx, pdf_path.display());
            return Ok(ProcessResult::Skipped);
        };

        let mut staged = self.store.staging(ArtifactKind::Table)?;
        write_csv(&mut staged, &rows)?;
        self.store
            .commit(staged, ArtifactKind::Table, id)
            .with_context(|| format!("无法写入 {}", ArtifactKind::Table.file_name(id)))?;

        info!("{} ✓ 结果表已保存: {} 行", ctx, rows.len());
        Ok(ProcessResult::Success)
    }
}
