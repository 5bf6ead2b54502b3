use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// 配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "PUBMED_ANALYZER_CONFIG";
/// 默认配置文件
pub const DEFAULT_CONFIG_FILE: &str = "pubmed_analyzer.toml";

/// 下载方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// URL 以 .pdf 结尾时直接下载，否则走浏览器
    Auto,
    /// 直接 HTTP GET
    Direct,
    /// 解析落地页全文链接，用无头浏览器点击下载
    Browser,
}

impl FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(FetchMode::Auto),
            "direct" => Ok(FetchMode::Direct),
            "browser" => Ok(FetchMode::Browser),
            other => Err(format!("未知的下载方式: {}", other)),
        }
    }
}

/// 摘要模型后端
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryBackend {
    /// OpenAI 兼容的聊天接口
    OpenAi,
    /// Hugging Face Inference API
    HuggingFace,
}

impl FromStr for SummaryBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(SummaryBackend::OpenAi),
            "huggingface" | "hf" => Ok(SummaryBackend::HuggingFace),
            other => Err(format!("未知的摘要后端: {}", other)),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 目录 ---
    /// URL 列表文件
    pub urls_file: PathBuf,
    /// PDF 存放目录
    pub papers_dir: PathBuf,
    /// 摘要存放目录
    pub summaries_dir: PathBuf,
    /// 结果表存放目录
    pub tables_dir: PathBuf,
    /// 日志目录
    pub logs_dir: PathBuf,
    /// 浏览器下载临时目录（每个 worker 一个子目录）
    pub downloads_dir: PathBuf,

    // --- 下载 ---
    pub fetch_mode: FetchMode,
    /// 同时下载的论文数量
    pub max_concurrent_downloads: usize,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    /// 写盘时的缓冲大小（字节）
    pub download_chunk_size: usize,

    // --- 浏览器 ---
    pub chrome_executable: Option<PathBuf>,
    /// 设置后连接已有浏览器，不再启动新实例
    pub browser_debug_port: Option<u16>,
    pub render_timeout_ms: u64,
    pub download_timeout_ms: u64,
    pub poll_initial_ms: u64,
    pub poll_max_ms: u64,

    // --- 文本与摘要 ---
    pub chunk_words: usize,
    pub min_chunk_words: usize,
    pub max_concurrent_summaries: usize,
    pub summary_max_length: u32,
    pub summary_min_length: u32,
    pub summary_backend: SummaryBackend,
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub hf_api_token: String,
    pub hf_api_base_url: String,
    pub hf_model: String,

    // --- 结果表 ---
    pub max_concurrent_tables: usize,

    // --- 服务 ---
    pub server_addr: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urls_file: PathBuf::from("input_urls.txt"),
            papers_dir: PathBuf::from("data/papers"),
            summaries_dir: PathBuf::from("data/summaries"),
            tables_dir: PathBuf::from("data/tables"),
            logs_dir: PathBuf::from("logs"),
            downloads_dir: PathBuf::from("data/downloads"),
            fetch_mode: FetchMode::Auto,
            max_concurrent_downloads: 3,
            http_timeout_secs: 10,
            user_agent: "Mozilla/5.0".to_string(),
            download_chunk_size: 4096,
            chrome_executable: None,
            browser_debug_port: None,
            render_timeout_ms: 10_000,
            download_timeout_ms: 30_000,
            poll_initial_ms: 200,
            poll_max_ms: 2_000,
            chunk_words: 500,
            min_chunk_words: 50,
            max_concurrent_summaries: 3,
            summary_max_length: 250,
            summary_min_length: 30,
            summary_backend: SummaryBackend::OpenAi,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            hf_api_token: String::new(),
            hf_api_base_url: "https://api-inference.huggingface.co/models".to_string(),
            hf_model: "facebook/bart-large-cnn".to_string(),
            max_concurrent_tables: 1,
            server_addr: "0.0.0.0:8000".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 默认值 → 配置文件（可选）→ 环境变量，最后校验
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config = Self::from_file(&path)?.unwrap_or_default().apply_env();
        config.validate()?;
        Ok(config)
    }

    /// 读取 TOML 配置文件，文件不存在时返回 `None`
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Ok(None),
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })
    }

    /// 只用环境变量覆盖默认值
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// 用环境变量覆盖当前值，解析失败时保留原值
    pub fn apply_env(self) -> Self {
        Self {
            urls_file: env_or("URLS_FILE", self.urls_file),
            papers_dir: env_or("PAPERS_DIR", self.papers_dir),
            summaries_dir: env_or("SUMMARIES_DIR", self.summaries_dir),
            tables_dir: env_or("TABLES_DIR", self.tables_dir),
            logs_dir: env_or("LOGS_DIR", self.logs_dir),
            downloads_dir: env_or("DOWNLOADS_DIR", self.downloads_dir),
            fetch_mode: env_or("FETCH_MODE", self.fetch_mode),
            max_concurrent_downloads: env_or(
                "MAX_CONCURRENT_DOWNLOADS",
                self.max_concurrent_downloads,
            ),
            http_timeout_secs: env_or("HTTP_TIMEOUT_SECS", self.http_timeout_secs),
            user_agent: env_or("USER_AGENT", self.user_agent),
            download_chunk_size: env_or("DOWNLOAD_CHUNK_SIZE", self.download_chunk_size),
            chrome_executable: env_opt("CHROME_EXECUTABLE").or(self.chrome_executable),
            browser_debug_port: env_opt("BROWSER_DEBUG_PORT").or(self.browser_debug_port),
            render_timeout_ms: env_or("RENDER_TIMEOUT_MS", self.render_timeout_ms),
            download_timeout_ms: env_or("DOWNLOAD_TIMEOUT_MS", self.download_timeout_ms),
            poll_initial_ms: env_or("POLL_INITIAL_MS", self.poll_initial_ms),
            poll_max_ms: env_or("POLL_MAX_MS", self.poll_max_ms),
            chunk_words: env_or("CHUNK_WORDS", self.chunk_words),
            min_chunk_words: env_or("MIN_CHUNK_WORDS", self.min_chunk_words),
            max_concurrent_summaries: env_or(
                "MAX_CONCURRENT_SUMMARIES",
                self.max_concurrent_summaries,
            ),
            summary_max_length: env_or("SUMMARY_MAX_LENGTH", self.summary_max_length),
            summary_min_length: env_or("SUMMARY_MIN_LENGTH", self.summary_min_length),
            summary_backend: env_or("SUMMARY_BACKEND", self.summary_backend),
            llm_api_key: env_or("LLM_API_KEY", self.llm_api_key),
            llm_api_base_url: env_or("LLM_API_BASE_URL", self.llm_api_base_url),
            llm_model_name: env_or("LLM_MODEL_NAME", self.llm_model_name),
            hf_api_token: env_or("HF_API_TOKEN", self.hf_api_token),
            hf_api_base_url: env_or("HF_API_BASE_URL", self.hf_api_base_url),
            hf_model: env_or("HF_MODEL", self.hf_model),
            max_concurrent_tables: env_or("MAX_CONCURRENT_TABLES", self.max_concurrent_tables),
            server_addr: env_or("SERVER_ADDR", self.server_addr),
            verbose_logging: env_or("VERBOSE_LOGGING", self.verbose_logging),
        }
    }

    /// 校验配置之间的约束
    pub fn validate(&self) -> Result<(), ConfigError> {
        let concurrency = [
            ("max_concurrent_downloads", self.max_concurrent_downloads),
            ("max_concurrent_summaries", self.max_concurrent_summaries),
            ("max_concurrent_tables", self.max_concurrent_tables),
        ];
        for (field, value) in concurrency {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "并发数至少为 1".to_string(),
                });
            }
        }
        if self.chunk_words == 0 {
            return Err(ConfigError::Invalid {
                field: "chunk_words",
                reason: "分块大小至少为 1".to_string(),
            });
        }
        if self.min_chunk_words > self.chunk_words {
            return Err(ConfigError::Invalid {
                field: "min_chunk_words",
                reason: format!("不能大于 chunk_words ({})", self.chunk_words),
            });
        }
        if self.summary_min_length > self.summary_max_length {
            return Err(ConfigError::Invalid {
                field: "summary_min_length",
                reason: format!("不能大于 summary_max_length ({})", self.summary_max_length),
            });
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, current: T) -> T {
    env_opt(key).unwrap_or(current)
}

fn env_opt<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
