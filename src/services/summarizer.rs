//! 摘要服务 - 业务能力层
//!
//! 逐块调用摘要模型，按原顺序拼接成整篇论文的摘要

use std::sync::Arc;

use tracing::{debug, error};

use super::text_extractor::truncate_words;
use crate::clients::{SummarizationModel, SummaryRequest};
use crate::config::Config;
use crate::error::{Result, SummarizeError};

/// 摘要服务
///
/// 职责：
/// - 对单篇论文的文本块逐块生成摘要
/// - 单块失败只丢弃该块，全部失败才算整篇失败
/// - 不关心文件是否已存在
#[derive(Clone)]
pub struct Summarizer {
    model: Arc<dyn SummarizationModel>,
    chunk_words: usize,
    max_length: u32,
    min_length: u32,
}

impl Summarizer {
    /// 创建新的摘要服务
    pub fn new(model: Arc<dyn SummarizationModel>, config: &Config) -> Self {
        Self {
            model,
            chunk_words: config.chunk_words.max(1),
            max_length: config.summary_max_length,
            min_length: config.summary_min_length,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// 生成合并后的摘要
    ///
    /// # 返回
    /// 返回各块摘要以单个空格拼接的结果
    pub async fn summarize_chunks(&self, chunks: &[String]) -> Result<String> {
        if chunks.is_empty() {
            return Err(SummarizeError::NoInput.into());
        }

        let mut parts = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            let text = truncate_words(chunk, self.chunk_words);
            let request = SummaryRequest {
                text: &text,
                max_length: self.max_length,
                min_length: self.min_length,
            };

            match self.model.summarize(&request).await {
                Ok(summary) => {
                    debug!("第 {}/{} 块摘要完成", index + 1, chunks.len());
                    parts.push(summary);
                }
                Err(e) => {
                    error!("第 {}/{} 块摘要失败，已丢弃: {}", index + 1, chunks.len(), e);
                }
            }
        }

        if parts.is_empty() {
            return Err(SummarizeError::AllChunksFailed {
                chunks: chunks.len(),
            }
            .into());
        }
        Ok(parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 记录输入的测试模型，文本以 "FAIL" 开头时报错
    struct RecordingModel {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SummarizationModel for RecordingModel {
        fn name(&self) -> &str {
            "recording"
        }

        async fn summarize(&self, request: &SummaryRequest<'_>) -> Result<String> {
            self.seen.lock().unwrap().push(request.text.to_string());
            if request.text.starts_with("FAIL") {
                return Err(AppError::model_failed("recording", "boom"));
            }
            let first = request.text.split_whitespace().next().unwrap_or_default();
            Ok(format!("<{}>", first))
        }
    }

    fn summarizer(chunk_words: usize) -> (Summarizer, Arc<RecordingModel>) {
        let model = Arc::new(RecordingModel {
            seen: Mutex::new(Vec::new()),
        });
        let config = Config {
            chunk_words,
            min_chunk_words: 1,
            ..Config::default()
        };
        (Summarizer::new(model.clone(), &config), model)
    }

    #[tokio::test]
    async fn test_parts_joined_in_chunk_order() {
        let (summarizer, model) = summarizer(500);
        let chunks = vec!["alpha one".to_string(), "beta two".to_string(), "gamma".to_string()];

        let summary = summarizer.summarize_chunks(&chunks).await.unwrap();
        assert_eq!(summary, "<alpha> <beta> <gamma>");
        assert_eq!(model.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_chunk_is_dropped() {
        let (summarizer, _) = summarizer(500);
        let chunks = vec!["alpha".to_string(), "FAIL here".to_string(), "gamma".to_string()];

        let summary = summarizer.summarize_chunks(&chunks).await.unwrap();
        assert_eq!(summary, "<alpha> <gamma>");
    }

    #[tokio::test]
    async fn test_all_chunks_failing_fails_paper() {
        let (summarizer, _) = summarizer(500);
        let chunks = vec!["FAIL a".to_string(), "FAIL b".to_string()];

        let err = summarizer.summarize_chunks(&chunks).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Summarize(SummarizeError::AllChunksFailed { chunks: 2 })
        ));
    }

    #[tokio::test]
    async fn test_chunk_is_truncated_to_limit() {
        let (summarizer, model) = summarizer(3);
        let chunks = vec!["a b c d e f".to_string()];

        summarizer.summarize_chunks(&chunks).await.unwrap();
        assert_eq!(model.seen.lock().unwrap()[0], "a b c");
    }

    #[tokio::test]
    async fn test_no_chunks_is_error() {
        let (summarizer, model) = summarizer(500);
        let result = summarizer.summarize_chunks(&[]).await;
        tokio_test::assert_err!(result);
        assert!(model.seen.lock().unwrap().is_empty());
    }
}
