//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和阶段调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 批量论文处理器
//! - 管理应用生命周期（初始化、运行）
//! - 加载 URL 列表、扫描论文目录
//! - 控制每个阶段的并发数量（Semaphore）
//! - 输出每个阶段和全局的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! App (下载 → 摘要 → 结果表，阶段之间顺序执行)
//!     ↓
//! workflow::{FetchFlow, SummaryFlow, TableFlow} (处理单篇论文)
//!     ↓
//! services (能力层：下载 / 文本 / 摘要 / 表格)
//!     ↓
//! clients + infrastructure (HTTP、模型、浏览器、产物存储)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源集中**：模型和配置只在 `App::initialize` 中创建一次
//! 2. **失败隔离**：单篇论文失败只计数，不中断整个阶段
//! 3. **向下依赖**：编排层 → workflow → services → clients / infrastructure
//! 4. **无业务逻辑**：只做调度和统计

pub mod app;

pub use app::{App, StageStats};
