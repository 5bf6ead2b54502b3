use anyhow::Result;
use chromiumoxide::Browser;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// 连接到已经开启远程调试端口的浏览器
///
/// 调试下载流程时使用：在本机开一个可见的浏览器，观察 worker 的操作。
pub async fn connect_to_browser(port: u16) -> Result<(Browser, JoinHandle<()>)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器连接成功");

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
