//! Map description relay main entry point
//! 地图描述中继主入口点

use clap::Parser;
use mapdesc_relay::config::init_tracing;
use mapdesc_relay::relay::config::{AppConfig, CliArgs, RelayConfig};
use mapdesc_relay::relay::http_gateway::HttpGateway;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    // Parse command line arguments / 解析命令行参数
    let args = CliArgs::parse();
    let log_args = format!("{:?}", args);

    // Defaults, file, env, then CLI / 默认值、文件、环境变量、再到命令行
    let cfg = AppConfig::load_with_cli(&args)?;
    let config = Arc::new(cfg.relay);

    // Initialize logging with configuration / 使用配置初始化日志
    init_tracing(&config.logging.to_logging_config())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(log_args, config))
}

async fn run(log_args: String, config: Arc<RelayConfig>) -> anyhow::Result<()> {
    tracing::info!("Starting map description relay with args: {}", log_args);
    tracing::info!("Relay starting with:");
    tracing::info!("  - HTTP gateway on: {}", config.http.server.addr);
    tracing::info!("  - Ollama host: {}", config.ollama.host);
    tracing::info!("  - Ollama model: {}", config.ollama.model);
    tracing::info!("  - Allowed origins: {}", config.http.allow_origins);
    tracing::info!("  - Timeout: {}ms", config.ollama.timeout_ms);

    let http_gateway = HttpGateway::new(config.clone())?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let http_handle = tokio::spawn(async move {
        if let Err(e) = http_gateway
            .start_with_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
        {
            tracing::error!("HTTP gateway error: {}", e);
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Relay shutting down");
    let _ = shutdown_tx.send(());

    // In-flight descriptions may wait on the model; bound the drain
    if tokio::time::timeout(std::time::Duration::from_secs(5), http_handle)
        .await
        .is_err()
    {
        tracing::warn!("Shutdown timeout reached, aborting HTTP gateway");
    }

    Ok(())
}
