//! # PubMed Paper Analyzer
//!
//! 批量下载 PubMed 论文全文，生成摘要并提取结果表的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构，上层只依赖下层：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 goto() / eval() 能力
//! - `ArtifactStore` - 磁盘产物布局、认领和原子发布
//!
//! ### ② 外部客户端（Clients / Browser）
//! - `clients/` - HTTP 下载、摘要模型后端（OpenAI 兼容接口 / Hugging Face）
//! - `browser/` - 启动或连接无头浏览器，打开下载会话
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单篇论文
//! - `PaperFetcher` - 直接下载 / 浏览器点击下载
//! - `TextExtractor` - PDF 文本提取与分块
//! - `Summarizer` - 逐块摘要并拼接
//! - `TableExtractor` - 结果表识别与 CSV 读写
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一篇论文"在每个阶段的完整处理流程
//! - `PaperCtx` - 上下文封装（paper_id + paper_index）
//! - `FetchFlow` / `SummaryFlow` / `TableFlow` - 跳过已存在 → 认领 → 生成 → 发布
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/app` - 按阶段批量处理，管理并发和统计
//!
//! ### ⑥ HTTP 服务（Server）
//! - `server/` - 触发流水线、读取摘要和结果表
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod server;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{SummarizationModel, SummaryRequest};
pub use config::Config;
pub use error::{AppError, Result};
pub use infrastructure::{ArtifactStore, JsExecutor};
pub use models::{ArtifactKind, PaperId};
pub use orchestrator::{App, StageStats};
pub use workflow::{PaperCtx, ProcessResult};
