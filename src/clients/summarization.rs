//! 摘要模型抽象
//!
//! 模型在进程启动时构造一次，以 `Arc<dyn SummarizationModel>` 传给各个 worker。

use async_trait::async_trait;

use crate::error::Result;

/// 单次摘要请求
///
/// 解码固定为确定性（不采样），输出长度限制在 `[min_length, max_length]`。
#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest<'a> {
    pub text: &'a str,
    pub max_length: u32,
    pub min_length: u32,
}

/// 摘要模型
#[async_trait]
pub trait SummarizationModel: Send + Sync {
    /// 模型名称（用于日志和错误信息）
    fn name(&self) -> &str;

    /// 生成一段摘要
    async fn summarize(&self, request: &SummaryRequest<'_>) -> Result<String>;
}
