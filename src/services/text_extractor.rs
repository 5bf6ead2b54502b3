//! 文本提取服务 - 业务能力层
//!
//! 打开 PDF，按页提取文本，拼接后切成固定词数的文本块

use std::path::Path;

use tracing::debug;

use crate::config::Config;
use crate::error::{ExtractError, Result};

/// 分块参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingPolicy {
    /// 每块词数
    pub chunk_words: usize,
    /// 少于这个词数的块被丢弃
    pub min_chunk_words: usize,
}

impl ChunkingPolicy {
    pub fn new(chunk_words: usize, min_chunk_words: usize) -> Self {
        Self {
            chunk_words: chunk_words.max(1),
            min_chunk_words,
        }
    }
}

impl Default for ChunkingPolicy {
    fn default() -> Self {
        Self::new(500, 50)
    }
}

/// 按页提取 PDF 文本
///
/// 单页提取失败时跳过该页。
///
/// # 返回
/// 返回 (页码, 页面文本) 列表，页码从 1 开始
pub fn extract_page_texts(
    pdf_path: &Path,
) -> std::result::Result<Vec<(u32, String)>, lopdf::Error> {
    let document = lopdf::Document::load(pdf_path)?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) => pages.push((*page_number, text)),
            Err(e) => debug!("第 {} 页提取失败，跳过: {}", page_number, e),
        }
    }
    Ok(pages)
}

/// 把文本按空白切词，每 `chunk_words` 个词一块，丢弃过短的块
///
/// 只有最后一块可能不足 `chunk_words`，所以结果块数为
/// ⌈L/C⌉，若最后一块少于 `min_chunk_words` 个词则再减一。
pub fn chunk_text(text: &str, policy: ChunkingPolicy) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(policy.chunk_words.max(1))
        .filter(|chunk| chunk.len() >= policy.min_chunk_words)
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// 截取前 `max_words` 个词
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 文本提取服务
#[derive(Debug, Clone)]
pub struct TextExtractor {
    policy: ChunkingPolicy,
}

impl TextExtractor {
    pub fn new(config: &Config) -> Self {
        Self::with_policy(ChunkingPolicy::new(config.chunk_words, config.min_chunk_words))
    }

    pub fn with_policy(policy: ChunkingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ChunkingPolicy {
        self.policy
    }

    /// 提取全文（各页拼接后去掉首尾空白）
    pub fn extract_text(&self, pdf_path: &Path) -> Result<String> {
        let pages = extract_page_texts(pdf_path).map_err(|source| ExtractError::Pdf {
            path: pdf_path.to_path_buf(),
            source,
        })?;

        let text = pages
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(ExtractError::NoText {
                path: pdf_path.to_path_buf(),
            }
            .into());
        }
        Ok(text)
    }

    /// 提取并分块
    pub fn extract_chunks(&self, pdf_path: &Path) -> Result<Vec<String>> {
        let text = self.extract_text(pdf_path)?;
        let chunks = chunk_text(&text, self.policy);
        debug!(
            "{}: {} 个词, {} 个文本块",
            pdf_path.display(),
            text.split_whitespace().count(),
            chunks.len()
        );

        if chunks.is_empty() {
            return Err(ExtractError::NoChunks {
                path: pdf_path.to_path_buf(),
            }
            .into());
        }
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_chunk_count_matches_formula() {
        let policy = ChunkingPolicy::new(500, 50);
        let cases = [
            (1200, 3), // 500 + 500 + 200
            (1030, 2), // 最后 30 个词被丢弃
            (1000, 2),
            (49, 0),
            (50, 1),
            (0, 0),
        ];
        for (len, expected) in cases {
            assert_eq!(chunk_text(&words(len), policy).len(), expected, "L = {}", len);
        }
    }

    #[test]
    fn test_chunks_are_word_bounded_and_ordered() {
        let chunks = chunk_text("a b  c\n\td e", ChunkingPolicy::new(2, 1));
        assert_eq!(chunks, vec!["a b", "c d", "e"]);
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("one two   three four", 2), "one two");
        assert_eq!(truncate_words("one", 5), "one");
    }

    #[test]
    fn test_unreadable_pdf_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let extractor = TextExtractor::with_policy(ChunkingPolicy::default());
        let err = extractor.extract_chunks(&path).unwrap_err();
        assert!(matches!(err, AppError::Extract(ExtractError::Pdf { .. })));
    }
}
