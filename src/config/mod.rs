//! Configuration management for the relay
//! 中继服务的配置管理
//!
//! This module provides the shared configuration plumbing:
//! - Layered loading (defaults, TOML file, environment) / 分层加载（默认值、TOML文件、环境变量）
//! - Tracing initialization / 跟踪初始化
//!
//! Service-specific structures live next to the service (`relay::config`).
//! 服务特定的配置结构位于服务模块内（`relay::config`）。

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_subscriber::Layer;

/// Base configuration shared by all applications / 所有应用程序共享的基础配置
pub mod base;
pub use base::*;

/// Build a layered figment / 构建分层的figment
///
/// Precedence order (lowest to highest):
/// 优先级顺序（从低到高）：
/// 1. Default values / 默认值
/// 2. Configuration file, if given / 配置文件（如提供）
/// 3. Prefixed environment variables, nested with `__` / 带前缀的环境变量，用`__`嵌套
pub fn layered_figment<T: Serialize>(
    defaults: &T,
    file: Option<&Path>,
    env_prefix: &str,
) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(defaults));
    if let Some(path) = file {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed(env_prefix).split("__"))
}

/// Common logging configuration / 通用日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level or filter directive / 日志级别或过滤指令
    pub level: String,
    /// Log format (json, compact, pretty) / 日志格式
    pub format: String,
    /// Log file path, enables file output / 日志文件路径，启用文件输出
    pub file_path: Option<PathBuf>,
}

static FILE_LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn stdout_layer(format: &str) -> BoxedLayer {
    let timer = tracing_subscriber::fmt::time::uptime();
    match format {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_timer(timer)
            .with_level(true)
            .boxed(),
        "compact" => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(true)
            .with_timer(timer)
            .with_level(true)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(timer)
            .with_level(true)
            .boxed(),
    }
}

fn file_layer(format: &str, path: &Path) -> Result<BoxedLayer> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create log dir: {}", parent.display()))?;
        }
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file: {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let _ = FILE_LOG_GUARD.set(guard);

    let timer = tracing_subscriber::fmt::time::uptime();
    // Files never get the multi-line pretty format / 文件不使用多行pretty格式
    let layer = if format == "json" {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_timer(timer)
            .with_level(true)
            .with_writer(writer)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer)
            .with_level(true)
            .with_writer(writer)
            .boxed()
    };
    Ok(layer)
}

/// Initialize tracing based on logging configuration
/// 基于日志配置初始化跟踪
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.level.trim().is_empty() {
            EnvFilter::new("info")
        } else {
            EnvFilter::new(config.level.clone())
        }
    });

    let mut layers: Vec<BoxedLayer> = vec![stdout_layer(config.format.as_str())];
    if let Some(path) = config.file_path.as_ref() {
        layers.push(file_layer(config.format.as_str(), path)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
