//! 论文处理上下文
//!
//! 封装"我正在处理第几篇、哪一篇论文"这一信息

use std::fmt::Display;

use crate::models::PaperId;

/// 论文处理上下文
#[derive(Debug, Clone)]
pub struct PaperCtx {
    /// 论文 ID
    pub paper_id: PaperId,

    /// 在本阶段中的序号（从 1 开始，仅用于日志显示）
    pub paper_index: usize,
}

impl PaperCtx {
    /// 创建新的论文上下文
    pub fn new(paper_id: PaperId, paper_index: usize) -> Self {
        Self {
            paper_id,
            paper_index,
        }
    }
}

impl Display for PaperCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[论文 {}]", self.paper_id)
    }
}
