//! 请求处理函数

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::{error, info};

use super::error::ApiError;
use super::state::SharedState;
use crate::models::{ArtifactKind, PaperId};

const SUMMARY_NOT_FOUND: &str = "Summary not found";
const TABLE_NOT_FOUND: &str = "Results table not found";
const ANALYSIS_FAILED: &str = "Failed to execute analysis script.";

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "PubMed Paper Analyzer API is running!" }))
}

/// POST /analyze
///
/// 同步执行完整流水线，子进程退出码非 0 时返回 500。
pub async fn analyze(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    info!("🚀 收到分析请求，启动流水线...");

    match state.pipeline.run().await {
        Ok(status) if status.success() => {
            info!("✓ 流水线执行完成");
            Ok(Json(json!({ "message": "Analysis started successfully" })))
        }
        Ok(status) => {
            error!("❌ 流水线退出异常: {}", status);
            Err(ApiError::Internal(ANALYSIS_FAILED.to_string()))
        }
        Err(e) => {
            error!("❌ 无法启动流水线: {}", e);
            Err(ApiError::Internal(ANALYSIS_FAILED.to_string()))
        }
    }
}

/// GET /summary/{paper_id}
pub async fn get_summary(
    State(state): State<SharedState>,
    Path(paper_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let not_found = || ApiError::NotFound(SUMMARY_NOT_FOUND.to_string());
    let id = PaperId::parse_strict(&paper_id).ok_or_else(not_found)?;

    let summary = tokio::fs::read_to_string(state.store.path(ArtifactKind::Summary, &id))
        .await
        .map_err(|_| not_found())?;

    Ok(Json(json!({ "pubmed_id": paper_id, "summary": summary })))
}

/// GET /table/{paper_id}
///
/// 按行返回 CSV 原文，每行保留换行符。
pub async fn get_table(
    State(state): State<SharedState>,
    Path(paper_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let not_found = || ApiError::NotFound(TABLE_NOT_FOUND.to_string());
    let id = PaperId::parse_strict(&paper_id).ok_or_else(not_found)?;

    let content = tokio::fs::read_to_string(state.store.path(ArtifactKind::Table, &id))
        .await
        .map_err(|_| not_found())?;
    let lines: Vec<&str> = content.split_inclusive('\n').collect();

    Ok(Json(json!({ "pubmed_id": paper_id, "table": lines })))
}
