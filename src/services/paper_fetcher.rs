//! 论文下载服务 - 业务能力层
//!
//! 两种下载方式：
//! 1. 直接下载：HTTP GET 流式写入临时文件，再原子发布为 `<id>.pdf`
//! 2. 浏览器下载：抓落地页 → 解析全文链接 → 逐个链接用无头浏览器打开，
//!    点击下载按钮，等待 PDF 落盘后移入论文目录，首个成功即停止

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::full_text_links::extract_full_text_links;
use crate::browser::BrowserSession;
use crate::clients::HttpClient;
use crate::config::{Config, FetchMode};
use crate::error::{AppError, FetchError, Result};
use crate::infrastructure::{ArtifactStore, JsExecutor};
use crate::models::{ArtifactKind, PaperId};
use crate::utils::{poll_until, PollPolicy};

/// 下载按钮的可见文字，按优先级排列
pub const DOWNLOAD_LABELS: [&str; 4] = ["Download", "PDF", "Full Text", "Get PDF"];

/// 查找下载按钮，命中后打上标记并返回匹配的文字，未命中返回空串
const FIND_DOWNLOAD_CONTROL_JS: &str = r#"
(() => {
    const labels = ["Download", "PDF", "Full Text", "Get PDF"];
    const controls = Array.from(document.querySelectorAll('a, button'));
    for (const label of labels) {
        const hit = controls.find(el => (el.innerText || el.textContent || '').includes(label));
        if (hit) {
            hit.setAttribute('data-paper-download', '1');
            return label;
        }
    }
    return '';
})()
"#;

/// 点击已标记的下载按钮
const CLICK_DOWNLOAD_CONTROL_JS: &str = r#"
(() => {
    const el = document.querySelector('[data-paper-download]');
    if (!el) {
        return false;
    }
    el.click();
    return true;
})()
"#;

/// 打开链接后先出现的东西
enum Landing {
    /// 页面上找到了下载按钮
    Control(String),
    /// 链接本身直接触发了下载
    Pdf(PathBuf),
}

/// 根据 URL 决定实际的下载方式
pub fn resolve_mode(mode: FetchMode, url: &str) -> FetchMode {
    match mode {
        FetchMode::Auto => {
            let path = url::Url::parse(url)
                .map(|u| u.path().to_ascii_lowercase())
                .unwrap_or_default();
            if path.ends_with(".pdf") {
                FetchMode::Direct
            } else {
                FetchMode::Browser
            }
        }
        other => other,
    }
}

/// 在下载目录中查找已完成的 PDF
///
/// 忽略未完成的 `.crdownload` 和空文件，多个时取文件名最小的。
pub fn completed_pdf_in(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .filter(|path| {
            std::fs::metadata(path)
                .map(|meta| meta.is_file() && meta.len() > 0)
                .unwrap_or(false)
        })
        .collect();
    pdfs.sort();
    pdfs.into_iter().next()
}

/// 论文下载服务
///
/// 职责：
/// - 按 URL 下载一篇论文的 PDF 并发布到论文目录
/// - 不关心 PDF 是否已存在（由流程层判断）
#[derive(Clone)]
pub struct PaperFetcher {
    http: HttpClient,
    store: ArtifactStore,
    config: Arc<Config>,
}

impl PaperFetcher {
    /// 创建新的论文下载服务
    pub fn new(http: HttpClient, store: ArtifactStore, config: Arc<Config>) -> Self {
        Self {
            http,
            store,
            config,
        }
    }

    /// 下载一篇论文
    ///
    /// # 返回
    /// 返回发布后的 PDF 路径
    pub async fn fetch(&self, url: &str, id: &PaperId) -> Result<PathBuf> {
        match resolve_mode(self.config.fetch_mode, url) {
            FetchMode::Browser => self.fetch_via_browser(url, id).await,
            _ => self.fetch_direct(url, id).await,
        }
    }

    /// 直接下载
    pub async fn fetch_direct(&self, url: &str, id: &PaperId) -> Result<PathBuf> {
        let staged = self.store.staging(ArtifactKind::Pdf)?;
        let file = tokio::fs::File::from_std(staged.reopen()?);

        let bytes = self.http.download(url, file).await?;
        debug!("{} 写入 {} 字节", id, bytes);

        if !self.store.commit(staged, ArtifactKind::Pdf, id)? {
            info!("{} 已由其他 worker 下载", id);
        }
        Ok(self.store.path(ArtifactKind::Pdf, id))
    }

    /// 浏览器下载
    ///
    /// 每篇论文使用独立的下载目录 `downloads_dir/<id>`，结束后无论成败都删除。
    pub async fn fetch_via_browser(&self, url: &str, id: &PaperId) -> Result<PathBuf> {
        let html = self.http.get_text(url).await?;
        let links = extract_full_text_links(&html, url);
        if links.is_empty() {
            return Err(FetchError::NoFullTextLinks {
                url: url.to_string(),
            }
            .into());
        }
        info!("{} 找到 {} 个全文链接", id, links.len());

        let download_dir = self.config.downloads_dir.join(id.as_str());
        let outcome = match BrowserSession::open(&self.config, &download_dir).await {
            Ok(session) => {
                let outcome = self.try_links(&session, url, id, &links).await;
                session.shutdown().await;
                outcome
            }
            Err(e) => Err(AppError::browser(format!("{:#}", e))),
        };

        if let Err(e) = tokio::fs::remove_dir_all(&download_dir).await {
            debug!("清理下载目录失败 {}: {}", download_dir.display(), e);
        }
        outcome
    }

    /// 依次尝试全文链接，首个成功即返回
    async fn try_links(
        &self,
        session: &BrowserSession,
        url: &str,
        id: &PaperId,
        links: &[String],
    ) -> Result<PathBuf> {
        for (index, link) in links.iter().enumerate() {
            info!("{} 🔗 尝试第 {}/{} 个链接: {}", id, index + 1, links.len(), link);

            match self.download_from_link(session, link).await {
                Ok(downloaded) => {
                    if !self.store.publish_file(ArtifactKind::Pdf, id, &downloaded)? {
                        info!("{} 已由其他 worker 下载", id);
                    }
                    return Ok(self.store.path(ArtifactKind::Pdf, id));
                }
                Err(e) if e.is_missing_element() => {
                    warn!("{} ⚠️ {}", id, e);
                }
                Err(e) => {
                    error!("{} ❌ {}", id, e);
                }
            }
        }

        Err(FetchError::AllLinksFailed {
            url: url.to_string(),
        }
        .into())
    }

    /// 打开单个链接并等待 PDF 落盘
    async fn download_from_link(&self, session: &BrowserSession, link: &str) -> Result<PathBuf> {
        let executor = session.executor();
        let dir = session.download_dir();

        if let Err(e) = executor.goto(link).await {
            // 链接直接指向 PDF 时，导航会因下载而中断
            debug!("导航中断 {}: {}", link, e);
            let wait = self.policy(self.config.download_timeout_ms);
            return poll_until(wait, || async move { completed_pdf_in(dir) })
                .await
                .ok_or_else(|| AppError::browser(e));
        }

        let render = self.policy(self.config.render_timeout_ms);
        let landing =
            poll_until(render, || async move { probe_landing(executor, dir).await }).await;

        match landing {
            Some(Landing::Pdf(pdf)) => return Ok(pdf),
            Some(Landing::Control(label)) => debug!("找到下载按钮 '{}'", label),
            None => {
                return Err(FetchError::NoDownloadControl {
                    url: link.to_string(),
                }
                .into())
            }
        }

        let clicked: bool = executor
            .eval_as(CLICK_DOWNLOAD_CONTROL_JS)
            .await
            .map_err(AppError::browser)?;
        if !clicked {
            return Err(FetchError::NoDownloadControl {
                url: link.to_string(),
            }
            .into());
        }

        let wait = self.policy(self.config.download_timeout_ms);
        poll_until(wait, || async move { completed_pdf_in(dir) })
            .await
            .ok_or_else(|| {
                FetchError::DownloadTimeout {
                    url: link.to_string(),
                }
                .into()
            })
    }

    fn policy(&self, timeout_ms: u64) -> PollPolicy {
        PollPolicy::new(timeout_ms, self.config.poll_initial_ms, self.config.poll_max_ms)
    }
}

async fn probe_landing(executor: &JsExecutor, dir: &Path) -> Option<Landing> {
    if let Some(pdf) = completed_pdf_in(dir) {
        return Some(Landing::Pdf(pdf));
    }
    match executor.eval_as::<String>(FIND_DOWNLOAD_CONTROL_JS).await {
        Ok(label) if !label.is_empty() => Some(Landing::Control(label)),
        Ok(_) => None,
        Err(e) => {
            debug!("查找下载按钮失败: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_mode_picks_direct_for_pdf_urls() {
        assert_eq!(
            resolve_mode(FetchMode::Auto, "https://example.org/files/12345.PDF"),
            FetchMode::Direct
        );
        assert_eq!(
            resolve_mode(FetchMode::Auto, "https://pubmed.ncbi.nlm.nih.gov/12345/"),
            FetchMode::Browser
        );
        assert_eq!(
            resolve_mode(FetchMode::Direct, "https://pubmed.ncbi.nlm.nih.gov/12345/"),
            FetchMode::Direct
        );
    }

    #[test]
    fn test_completed_pdf_ignores_partial_downloads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("paper.pdf.crdownload"), b"%PDF-partial").unwrap();
        std::fs::write(dir.path().join("empty.pdf"), b"").unwrap();
        assert!(completed_pdf_in(dir.path()).is_none());

        std::fs::write(dir.path().join("paper.pdf"), b"%PDF-1.5").unwrap();
        assert_eq!(completed_pdf_in(dir.path()), Some(dir.path().join("paper.pdf")));
    }

    #[test]
    fn test_completed_pdf_missing_dir() {
        assert!(completed_pdf_in(Path::new("/no/such/download/dir")).is_none());
    }

    #[test]
    fn test_labels_match_script() {
        for label in DOWNLOAD_LABELS {
            assert!(FIND_DOWNLOAD_CONTROL_JS.contains(label));
        }
    }
}
