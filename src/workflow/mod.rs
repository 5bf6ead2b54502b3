pub mod fetch_flow;
pub mod paper_ctx;
pub mod summary_flow;
pub mod table_flow;

pub use fetch_flow::FetchFlow;
pub use paper_ctx::PaperCtx;
pub use summary_flow::SummaryFlow;
pub use table_flow::TableFlow;

/// 单篇论文的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// 产物已生成
    Success,
    /// 跳过（产物已存在、正由其他 worker 处理，或没有可生成的内容）
    Skipped,
}
