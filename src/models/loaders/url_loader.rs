use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{error, info};

/// 从文本文件加载来源 URL 列表
///
/// 每行一个 URL，去掉首尾空白，忽略空行。文件不存在时记录错误并返回空列表。
pub async fn load_urls(urls_file: &Path) -> Result<Vec<String>> {
    if !fs::try_exists(urls_file).await.unwrap_or(false) {
        error!("URL 文件不存在: {}", urls_file.display());
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(urls_file)
        .await
        .with_context(|| format!("无法读取 URL 文件: {}", urls_file.display()))?;

    let urls = parse_urls(&content);
    info!("从 {} 加载了 {} 个 URL", urls_file.display(), urls.len());
    Ok(urls)
}

/// 按行解析 URL，保持原有顺序
pub fn parse_urls(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urls_strips_blank_lines() {
        let urls = parse_urls("https://a.org/1/\n\n   \n  https://b.org/2/  \r\n");
        assert_eq!(urls, vec!["https://a.org/1/", "https://b.org/2/"]);
    }

    #[tokio::test]
    async fn test_load_urls_missing_file_is_empty() {
        let urls = load_urls(Path::new("/no/such/input_urls.txt")).await.unwrap();
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_load_urls_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input_urls.txt");
        tokio::fs::write(&path, "https://x.org/3/\nhttps://x.org/1/\n\nhttps://x.org/2/\n")
            .await
            .unwrap();

        let urls = load_urls(&path).await.unwrap();
        assert_eq!(
            urls,
            vec!["https://x.org/3/", "https://x.org/1/", "https://x.org/2/"]
        );
    }
}
