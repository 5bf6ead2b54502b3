//! Hugging Face Inference API 摘要后端
//!
//! 直接调用 `facebook/bart-large-cnn` 等 summarization 模型。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::summarization::{SummarizationModel, SummaryRequest};
use crate::config::Config;
use crate::error::{AppError, Result, SummarizeError};

/// Hugging Face 摘要后端
pub struct HuggingFaceSummarizer {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

#[derive(Debug, Deserialize)]
struct InferenceOutput {
    summary_text: String,
}

impl HuggingFaceSummarizer {
    /// 创建新的 Hugging Face 摘要后端
    ///
    /// 单次请求超过 `http_timeout_secs` 即视为失败。
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| AppError::model_failed(&config.hf_model, e))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}",
                config.hf_api_base_url.trim_end_matches('/'),
                config.hf_model
            ),
            token: config.hf_api_token.clone(),
            model: config.hf_model.clone(),
        })
    }
}

fn build_request<'a>(request: &SummaryRequest<'a>) -> InferenceRequest<'a> {
    InferenceRequest {
        inputs: request.text,
        parameters: InferenceParameters {
            max_length: request.max_length,
            min_length: request.min_length,
            do_sample: false,
        },
    }
}

#[async_trait]
impl SummarizationModel for HuggingFaceSummarizer {
    fn name(&self) -> &str {
        &self.model
    }

    async fn summarize(&self, request: &SummaryRequest<'_>) -> Result<String> {
        debug!("调用 HF Inference API: {}", self.endpoint);

        let mut http_request = self.client.post(&self.endpoint).json(&build_request(request));
        if !self.token.is_empty() {
            http_request = http_request.bearer_auth(&self.token);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| AppError::model_failed(&self.model, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("HF Inference API 返回 {}: {}", status, body);
            return Err(AppError::model_failed(
                &self.model,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let outputs: Vec<InferenceOutput> = response
            .json()
            .await
            .map_err(|e| AppError::model_failed(&self.model, e))?;

        outputs
            .into_iter()
            .next()
            .map(|output| output.summary_text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                SummarizeError::EmptyOutput {
                    model: self.model.clone(),
                }
                .into()
            })
    }
}
