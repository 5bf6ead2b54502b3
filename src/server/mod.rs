//! HTTP 服务
//!
//! 对外提供健康检查、触发流水线、按 ID 读取摘要和结果表

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::infrastructure::ArtifactStore;

pub use error::ApiError;
pub use router::build_router;
pub use state::{AppState, PipelineCommand};

/// 启动 HTTP 服务，直到进程退出
pub async fn serve(config: &Config) -> Result<()> {
    let pipeline = PipelineCommand::current_exe().context("无法定位当前程序")?;
    let state = AppState::new(ArtifactStore::new(config), pipeline);

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("无法监听 {}", config.server_addr))?;
    info!("🌐 HTTP 服务已启动: http://{}", config.server_addr);

    axum::serve(listener, build_router(state))
        .await
        .context("HTTP 服务异常退出")
}
