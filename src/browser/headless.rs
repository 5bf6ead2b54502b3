use std::path::Path;

use anyhow::{Context, Result};
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// 启动无头浏览器
///
/// 每个 worker 独占一个实例，用户数据目录放在 worker 自己的下载目录里，
/// 避免多个实例争用同一个 profile。
///
/// # 参数
/// - `chrome_executable`: 浏览器可执行文件，`None` 时自动查找
/// - `worker_dir`: worker 专属目录
///
/// # 返回
/// 返回浏览器和事件处理任务
pub async fn launch_headless_browser(
    chrome_executable: Option<&Path>,
    worker_dir: &Path,
) -> Result<(Browser, JoinHandle<()>)> {
    info!("🚀 启动无头浏览器...");

    let profile_dir = worker_dir.join("profile");
    write_download_preferences(&profile_dir, worker_dir)?;

    let mut builder = BrowserConfig::builder()
        .new_headless_mode()
        .user_data_dir(&profile_dir)
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ]);
    if let Some(executable) = chrome_executable {
        debug!("使用浏览器: {}", executable.display());
        builder = builder.chrome_executable(executable);
    }

    let config = builder.build().map_err(|e| {
        error!("配置无头浏览器失败: {}", e);
        anyhow::anyhow!("配置无头浏览器失败: {}", e)
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        anyhow::anyhow!("启动无头浏览器失败: {}", e)
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    let handle = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    Ok((browser, handle))
}

/// 写入 profile 偏好：下载不弹窗，PDF 直接下载而不是在浏览器内打开
fn write_download_preferences(profile_dir: &Path, download_dir: &Path) -> Result<()> {
    let default_dir = profile_dir.join("Default");
    std::fs::create_dir_all(&default_dir)
        .with_context(|| format!("无法创建浏览器 profile: {}", default_dir.display()))?;

    let preferences = json!({
        "download": {
            "default_directory": download_dir.to_string_lossy(),
            "prompt_for_download": false,
            "directory_upgrade": true
        },
        "plugins": {
            "always_open_pdf_externally": true
        }
    });
    std::fs::write(default_dir.join("Preferences"), preferences.to_string())
        .context("无法写入浏览器偏好设置")?;
    Ok(())
}
