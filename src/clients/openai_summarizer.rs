//! OpenAI 兼容接口的摘要后端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::summarization::{SummarizationModel, SummaryRequest};
use crate::config::Config;
use crate::error::{AppError, Result, SummarizeError};

const SYSTEM_PROMPT: &str = "You are a scientific summarization model. \
Summarize the given excerpt of a research paper abstractively. \
Reply with the summary text only, no preamble.";

/// OpenAI 摘要后端
pub struct OpenAiSummarizer {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl OpenAiSummarizer {
    /// 创建新的 OpenAI 摘要后端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }
}

/// 构建用户消息，把长度约束写进提示词
fn build_user_message(request: &SummaryRequest<'_>) -> String {
    format!(
        "Summarize the following text in {} to {} words.\n\n{}",
        request.min_length, request.max_length, request.text
    )
}

#[async_trait]
impl SummarizationModel for OpenAiSummarizer {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn summarize(&self, request: &SummaryRequest<'_>) -> Result<String> {
        debug!(
            "调用 LLM API，模型: {}，输入长度: {} 字符",
            self.model_name,
            request.text.len()
        );

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT)
            .build()
            .map_err(|e| AppError::model_failed(&self.model_name, e))?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(build_user_message(request))
            .build()
            .map_err(|e| AppError::model_failed(&self.model_name, e))?;

        // temperature = 0：确定性解码
        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.0)
            .max_tokens(request.max_length)
            .build()
            .map_err(|e| AppError::model_failed(&self.model_name, e))?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::model_failed(&self.model_name, e)
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(SummarizeError::EmptyOutput {
                model: self.model_name.clone(),
            }
            .into());
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_carries_length_bounds() {
        let request = SummaryRequest {
            text: "Body text.",
            max_length: 250,
            min_length: 30,
        };
        let message = build_user_message(&request);
        assert!(message.contains("30 to 250 words"));
        assert!(message.ends_with("Body text."));
    }

    /// 需要真实的 API key
    #[tokio::test]
    #[ignore]
    async fn test_openai_summarize_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env();
        let model = OpenAiSummarizer::new(&config);
        let request = SummaryRequest {
            text: "Aspirin reduced the incidence of cardiovascular events by 12% in a \
                   randomized trial of 10,000 adults over five years.",
            max_length: 60,
            min_length: 10,
        };

        let summary = model.summarize(&request).await.expect("摘要失败");
        println!("摘要: {}", summary);
        assert!(!summary.is_empty());
    }
}
