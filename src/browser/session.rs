//! 浏览器会话
//!
//! 一个 worker 处理一个 URL 时独占的浏览器实例。不做池化，用完即关。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::Browser;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{connect_to_browser, launch_headless_browser};
use crate::config::Config;
use crate::infrastructure::JsExecutor;

/// 浏览器会话
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    executor: JsExecutor,
    download_dir: PathBuf,
    launched: bool,
}

impl BrowserSession {
    /// 打开会话
    ///
    /// 配置了调试端口时连接已有浏览器，否则启动新的无头实例。
    /// 下载一律落到 `download_dir`，不弹出确认。
    pub async fn open(config: &Config, download_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(download_dir)
            .await
            .with_context(|| format!("无法创建下载目录: {}", download_dir.display()))?;
        let download_dir = std::fs::canonicalize(download_dir)?;

        let (browser, handler, launched) = match config.browser_debug_port {
            Some(port) => {
                let (browser, handler) = connect_to_browser(port).await?;
                (browser, handler, false)
            }
            None => {
                let (browser, handler) =
                    launch_headless_browser(config.chrome_executable.as_deref(), &download_dir)
                        .await?;
                (browser, handler, true)
            }
        };

        let behavior = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(download_dir.to_string_lossy().to_string())
            .build()
            .map_err(|e| anyhow::anyhow!("无法构建下载设置: {}", e))?;
        browser.execute(behavior).await?;
        debug!("下载目录: {}", download_dir.display());

        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            handler,
            executor: JsExecutor::new(page),
            download_dir,
            launched,
        })
    }

    pub fn executor(&self) -> &JsExecutor {
        &self.executor
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// 关闭会话
    ///
    /// 启动的实例整个关闭；连接的浏览器只关闭本会话的页面。
    pub async fn shutdown(self) {
        let Self {
            mut browser,
            handler,
            executor,
            launched,
            ..
        } = self;

        if let Err(e) = executor.close().await {
            debug!("关闭页面失败: {}", e);
        }
        if launched {
            if let Err(e) = browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            let _ = browser.wait().await;
        }
        handler.abort();
    }
}
