//! Relay configuration / 中继配置

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use figment::providers::Env;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::config::base::{LogConfig, ServerConfig};
use crate::config::layered_figment;

/// Prefix for nested environment overrides, e.g. `MAPDESC_RELAY__OLLAMA__TIMEOUT_MS`
/// 嵌套环境变量覆盖的前缀
pub const ENV_PREFIX: &str = "MAPDESC_";

pub const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "qwen3-vl:4b";
pub const DEFAULT_ALLOW_ORIGINS: &str = "*";

/// Relay command line arguments / 中继命令行参数
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "mapdesc-relay",
    version = "0.1.0",
    about = "Map description relay for a local Ollama vision model\n面向本地Ollama视觉模型的地图描述中继"
)]
pub struct CliArgs {
    /// Configuration file path / 配置文件路径
    #[arg(short, long, value_name = "FILE", help = "Configuration file path / 配置文件路径")]
    pub config: Option<String>,

    /// HTTP listen address / HTTP监听地址
    #[arg(
        long,
        value_name = "ADDR",
        help = "HTTP listen address (e.g., 0.0.0.0:8000) / HTTP监听地址"
    )]
    pub http_addr: Option<String>,

    /// Ollama base URL / Ollama基础URL
    #[arg(long, value_name = "URL", help = "Ollama base URL / Ollama基础URL")]
    pub ollama_host: Option<String>,

    /// Default vision model / 默认视觉模型
    #[arg(long, value_name = "NAME", help = "Default vision model / 默认视觉模型")]
    pub ollama_model: Option<String>,

    /// CORS allow-list / CORS允许列表
    #[arg(
        long,
        value_name = "LIST",
        help = "CORS origins: '*' or comma-separated list / CORS来源：'*'或逗号分隔列表"
    )]
    pub allow_origins: Option<String>,

    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Log level / 日志级别
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level (trace, debug, info, warn, error) / 日志级别"
    )]
    pub log_level: Option<String>,
}

/// Relay application configuration / 中继应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub relay: RelayConfig,
}

impl AppConfig {
    /// Load configuration with CLI arguments / 使用CLI参数加载配置
    ///
    /// Defaults < config file < `MAPDESC_*` env < `OLLAMA_HOST`/`OLLAMA_MODEL`/`ALLOW_ORIGINS` < CLI
    pub fn load_with_cli(args: &CliArgs) -> Result<Self> {
        let file = args.config.as_ref().map(PathBuf::from);
        if let Some(path) = &file {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
        }

        let mut config: AppConfig = layered_figment(&AppConfig::default(), file.as_deref(), ENV_PREFIX)
            .merge(legacy_env())
            .extract()
            .context("Failed to load configuration")?;

        // Override with CLI arguments / 使用CLI参数覆盖
        let relay = &mut config.relay;
        if let Some(addr) = &args.http_addr {
            relay.http.server.addr = addr
                .parse()
                .map_err(|e| anyhow!("invalid --http-addr {}: {}", addr, e))?;
        }
        if let Some(host) = &args.ollama_host {
            relay.ollama.host = host.clone();
        }
        if let Some(model) = &args.ollama_model {
            relay.ollama.model = model.clone();
        }
        if let Some(origins) = &args.allow_origins {
            relay.http.allow_origins = origins.clone();
        }
        if let Some(t) = args.timeout_ms {
            relay.ollama.timeout_ms = t;
        }
        if let Some(level) = &args.log_level {
            relay.logging.level = level.clone();
        }

        config.relay.validate()?;
        Ok(config)
    }
}

/// Unprefixed variable names kept for existing deployments
/// 为现有部署保留的无前缀变量名
fn legacy_env() -> Env {
    Env::raw().filter_map(|key| match key.as_str().to_ascii_uppercase().as_str() {
        "OLLAMA_HOST" => Some("relay.ollama.host".into()),
        "OLLAMA_MODEL" => Some("relay.ollama.model".into()),
        "ALLOW_ORIGINS" => Some("relay.http.allow_origins".into()),
        _ => None,
    })
}

/// Relay service configuration / 中继服务配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// HTTP server configuration / HTTP服务器配置
    pub http: HttpConfig,
    /// Inference backend / 推理后端
    pub ollama: OllamaConfig,
    /// Image payload checks / 图像数据检查
    pub image: ImageConfig,
    /// Logging configuration / 日志配置
    pub logging: LogConfig,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.ollama.host)
            .map_err(|e| anyhow!("invalid ollama host {}: {}", self.ollama.host, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("ollama host must be http or https: {}", self.ollama.host);
        }
        if self.ollama.model.trim().is_empty() {
            bail!("ollama model must not be empty");
        }
        if self.ollama.timeout_ms == 0 {
            bail!("ollama timeout_ms must be greater than zero");
        }
        if self.http.max_body_bytes == 0 {
            bail!("http max_body_bytes must be greater than zero");
        }
        Ok(())
    }
}

/// HTTP gateway configuration / HTTP网关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// HTTP server settings / HTTP服务器设置
    pub server: ServerConfig,
    /// `*` or comma-separated origins / `*`或逗号分隔的来源
    pub allow_origins: String,
    /// Inbound body limit in bytes / 入站正文大小上限（字节）
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            allow_origins: DEFAULT_ALLOW_ORIGINS.to_string(),
            max_body_bytes: 25 * 1024 * 1024, // 25MB
        }
    }
}

/// Ollama backend configuration / Ollama后端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL / 基础URL
    pub host: String,
    /// Default model / 默认模型
    pub model: String,
    /// Overall timeout per outbound call / 每次出站调用的总超时
    pub timeout_ms: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_HOST.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            timeout_ms: 120_000,
        }
    }
}

impl OllamaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ImageConfig {
    /// Reject payloads that are not valid base64 / 拒绝非法base64数据
    pub strict_base64: bool,
}
