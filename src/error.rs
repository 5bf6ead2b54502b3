use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 论文下载错误
    #[error("下载错误: {0}")]
    Fetch(#[from] FetchError),
    /// PDF 文本提取错误
    #[error("文本提取错误: {0}")]
    Extract(#[from] ExtractError),
    /// 摘要生成错误
    #[error("摘要错误: {0}")]
    Summarize(#[from] SummarizeError),
    /// 结果表提取错误
    #[error("表格错误: {0}")]
    Table(#[from] TableError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件系统错误
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// 论文下载相关错误
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL 无法解析出论文 ID
    #[error("无效的 URL: {url}")]
    InvalidUrl { url: String },
    /// HTTP 状态码非 200
    #[error("请求 {url} 返回 HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    /// 网络请求异常
    #[error("请求 {url} 失败: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// 落地页没有全文链接区域
    #[error("{url} 上没有找到全文链接")]
    NoFullTextLinks { url: String },
    /// 页面上没有下载按钮
    #[error("{url} 上没有找到下载按钮")]
    NoDownloadControl { url: String },
    /// 点击后等待 PDF 超时
    #[error("等待 {url} 的 PDF 下载超时")]
    DownloadTimeout { url: String },
    /// 浏览器操作失败
    #[error("浏览器错误: {0}")]
    Browser(String),
    /// 所有全文链接都未能产出 PDF
    #[error("{url} 的所有全文链接均下载失败")]
    AllLinksFailed { url: String },
}

/// PDF 文本提取错误
#[derive(Debug, Error)]
pub enum ExtractError {
    /// PDF 无法打开或解析
    #[error("无法解析 PDF {path}: {source}")]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },
    /// 没有可提取的文本
    #[error("{path} 没有可提取的文本")]
    NoText { path: PathBuf },
    /// 所有分块都过短
    #[error("{path} 没有足够长的文本块")]
    NoChunks { path: PathBuf },
}

/// 摘要生成错误
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// 模型调用失败
    #[error("模型 {model} 调用失败: {message}")]
    Model { model: String, message: String },
    /// 模型返回空内容
    #[error("模型 {model} 返回内容为空")]
    EmptyOutput { model: String },
    /// 所有分块都摘要失败
    #[error("全部 {chunks} 个文本块摘要失败")]
    AllChunksFailed { chunks: usize },
    /// 没有输入分块
    #[error("没有可摘要的文本块")]
    NoInput,
}

/// 结果表提取错误
#[derive(Debug, Error)]
pub enum TableError {
    /// PDF 无法打开或解析
    #[error("无法解析 PDF {path}: {source}")]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },
    /// CSV 读写失败
    #[error("CSV 错误: {0}")]
    Csv(#[from] csv::Error),
    /// 表格文件不存在
    #[error("表格文件不存在: {path}")]
    NotFound { path: PathBuf },
    /// 单元格分隔规则无法编译
    #[error("表格规则无效: {0}")]
    Pattern(#[source] regex::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置值不合法
    #[error("配置项 {field} 无效: {reason}")]
    Invalid { field: &'static str, reason: String },
    /// 配置文件解析失败
    #[error("无法解析配置文件 {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建 HTTP 请求失败错误
    pub fn request_failed(url: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Fetch(FetchError::Request {
            url: url.into(),
            source,
        })
    }

    /// 创建浏览器错误
    pub fn browser(message: impl std::fmt::Display) -> Self {
        AppError::Fetch(FetchError::Browser(message.to_string()))
    }

    /// 创建模型调用错误
    pub fn model_failed(model: impl Into<String>, message: impl std::fmt::Display) -> Self {
        AppError::Summarize(SummarizeError::Model {
            model: model.into(),
            message: message.to_string(),
        })
    }

    /// 是否为"页面结构缺失"类错误（换下一个链接继续尝试）
    pub fn is_missing_element(&self) -> bool {
        matches!(
            self,
            AppError::Fetch(FetchError::NoFullTextLinks { .. })
                | AppError::Fetch(FetchError::NoDownloadControl { .. })
        )
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::browser(err)
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Table(TableError::Csv(err))
    }
}
