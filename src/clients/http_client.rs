/// HTTP 客户端
///
/// 封装落地页抓取和 PDF 流式下载
use std::time::Duration;

use futures::StreamExt;
use reqwest::StatusCode;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, FetchError, Result};

/// HTTP 客户端
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
    chunk_size: usize,
}

impl HttpClient {
    /// 创建新的 HTTP 客户端
    pub fn new(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.http_timeout_secs);
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(timeout)
            .build()
            .map_err(|e| AppError::request_failed("<client>", e))?;

        Ok(Self {
            client,
            timeout,
            chunk_size: config.download_chunk_size.max(1),
        })
    }

    /// 获取页面 HTML
    ///
    /// 非 200 状态码视为失败。
    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::request_failed(url, e))?;

        ensure_ok(url, response.status())?;

        response
            .text()
            .await
            .map_err(|e| AppError::request_failed(url, e))
    }

    /// 流式下载到 `writer`
    ///
    /// 每个分片的读取都受超时限制，整体不设上限。
    ///
    /// # 返回
    /// 返回写入的字节数
    pub async fn download<W>(&self, url: &str, writer: W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        debug!("下载 {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::request_failed(url, e))?;

        ensure_ok(url, response.status())?;

        let mut writer = BufWriter::with_capacity(self.chunk_size, writer);
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        loop {
            let next = tokio::time::timeout(self.timeout, stream.next())
                .await
                .map_err(|_| {
                    AppError::Io(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("读取 {} 超时", url),
                    ))
                })?;
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk.map_err(|e| AppError::request_failed(url, e))?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        writer.flush().await?;
        debug!("下载完成 {}: {} 字节", url, written);
        Ok(written)
    }
}

fn ensure_ok(url: &str, status: StatusCode) -> Result<()> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_200_is_accepted() {
        assert!(ensure_ok("u", StatusCode::OK).is_ok());
        assert!(matches!(
            ensure_ok("u", StatusCode::NO_CONTENT),
            Err(AppError::Fetch(FetchError::HttpStatus { status: 204, .. }))
        ));
        assert!(ensure_ok("u", StatusCode::NOT_FOUND).is_err());
    }
}
