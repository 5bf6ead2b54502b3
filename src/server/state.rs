//! 服务共享状态

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;

use tokio::process::Command;

use crate::infrastructure::ArtifactStore;

/// 触发流水线时执行的子进程命令
#[derive(Debug, Clone)]
pub struct PipelineCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl PipelineCommand {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// 以 `run` 子命令重新执行当前程序
    pub fn current_exe() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, ["run"]))
    }

    /// 执行并等待子进程退出
    pub async fn run(&self) -> std::io::Result<ExitStatus> {
        Command::new(&self.program).args(&self.args).status().await
    }
}

/// 注入到每个 handler 的共享状态
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: ArtifactStore,
    pub pipeline: PipelineCommand,
}

impl AppState {
    pub fn new(store: ArtifactStore, pipeline: PipelineCommand) -> Self {
        Self { store, pipeline }
    }
}

pub type SharedState = Arc<AppState>;
