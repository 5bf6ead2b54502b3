pub mod hf_summarizer;
pub mod http_client;
pub mod openai_summarizer;
pub mod summarization;

use std::sync::Arc;

use crate::config::{Config, SummaryBackend};
use crate::error::Result;

pub use hf_summarizer::HuggingFaceSummarizer;
pub use http_client::HttpClient;
pub use openai_summarizer::OpenAiSummarizer;
pub use summarization::{SummarizationModel, SummaryRequest};

/// 按配置构造摘要模型
pub fn build_summarization_model(config: &Config) -> Result<Arc<dyn SummarizationModel>> {
    let model: Arc<dyn SummarizationModel> = match config.summary_backend {
        SummaryBackend::OpenAi => Arc::new(OpenAiSummarizer::new(config)),
        SummaryBackend::HuggingFace => Arc::new(HuggingFaceSummarizer::new(config)?),
    };
    Ok(model)
}
