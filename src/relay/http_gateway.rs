//! HTTP gateway for the description relay
//! 描述中继的HTTP网关

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{HeaderValue, Method},
    response::Json,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};
use tracing::{info, info_span, warn, Instrument};

use super::config::RelayConfig;
use super::error::RelayError;
use super::orchestrator::{Attempt, DescriptionOrchestrator};
use super::prompt::select_prompt;
use super::request::{DescriptionParams, DescriptionRequest};
use super::response::DescriptionResponse;
use super::transport::{HttpTransport, OllamaTransport};

/// Application state / 应用状态
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<DescriptionOrchestrator>,
    config: Arc<RelayConfig>,
}

impl AppState {
    pub fn new(config: Arc<RelayConfig>, transport: Arc<dyn OllamaTransport>) -> Self {
        let orchestrator = Arc::new(DescriptionOrchestrator::new(
            transport,
            config.ollama.model.clone(),
        ));
        Self {
            orchestrator,
            config,
        }
    }
}

/// Build the CORS policy from an allow-list / 根据允许列表构建CORS策略
///
/// `*` allows any origin without credentials, also when it appears inside a
/// list; anything else is an explicit comma-separated origin list with credentials.
pub fn cors_layer(allow_origins: &str) -> CorsLayer {
    let methods = [Method::OPTIONS, Method::POST];
    if allow_origins.split(',').any(|o| o.trim() == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allow_origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.http.allow_origins);
    let body_limit = state.config.http.max_body_bytes;

    Router::new()
        .route("/description/", post(post_description))
        .route("/description", post(post_description))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// HTTP gateway server / HTTP网关服务器
pub struct HttpGateway {
    config: Arc<RelayConfig>,
    transport: Arc<dyn OllamaTransport>,
}

impl HttpGateway {
    /// Create a gateway talking to the configured Ollama host / 创建连接到配置的Ollama主机的网关
    pub fn new(config: Arc<RelayConfig>) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(config.ollama.host.clone(), config.ollama.timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: Arc<RelayConfig>, transport: Arc<dyn OllamaTransport>) -> Self {
        Self { config, transport }
    }

    /// Start HTTP gateway server / 启动HTTP网关服务器
    pub async fn start(self) -> anyhow::Result<()> {
        let (listener, app) = self.prepare().await?;
        axum::serve(listener, app).await?;
        Ok(())
    }

    /// Start HTTP gateway with shutdown signal / 使用关闭信号启动HTTP网关
    pub async fn start_with_shutdown<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let (listener, app) = self.prepare().await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }

    async fn prepare(self) -> anyhow::Result<(tokio::net::TcpListener, Router)> {
        let addr: SocketAddr = self.config.http.server.addr;
        info!("Starting HTTP gateway on {}", addr);

        let app = build_router(AppState::new(self.config.clone(), self.transport));

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("HTTP gateway listening on {}", listener.local_addr()?);
        Ok((listener, app))
    }
}

/// Health check endpoint / 健康检查端点
/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mapdesc-relay",
        "model": state.orchestrator.model(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Describe a map snapshot / 描述地图快照
/// POST /description/
///
/// Backend failures are reported inside the message with status 200; only
/// malformed requests are rejected.
async fn post_description(
    State(state): State<AppState>,
    payload: Result<Json<DescriptionParams>, JsonRejection>,
) -> Result<Json<DescriptionResponse>, RelayError> {
    let Json(params) = payload?;
    let request = DescriptionRequest::from_params(params, state.config.image.strict_base64)?;

    let request_id = uuid::Uuid::new_v4();
    let span = info_span!(
        "description",
        %request_id,
        language = request.language.code(),
        variant = ?request.variant,
        voice = %request.display.voice,
        speed = request.display.speed,
        response_type = %request.display.response_type,
        skip_openai = request.display.skip_openai,
    );

    async move {
        let started = Instant::now();
        let prompt = select_prompt(request.language, request.variant);
        let outcome = state
            .orchestrator
            .run(Attempt {
                prompt,
                image: &request.image,
            })
            .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome.result {
            Ok(text) => info!(
                model = %outcome.model,
                stages = ?outcome.stages,
                chars = text.chars().count(),
                elapsed_ms,
                "description ready"
            ),
            Err(e) => warn!(
                model = %outcome.model,
                stages = ?outcome.stages,
                backend = state.orchestrator.backend(),
                kind = e.kind(),
                error = %e,
                elapsed_ms,
                "description failed"
            ),
        }

        Ok::<_, RelayError>(Json(DescriptionResponse::from_result(outcome.result)))
    }
    .instrument(span)
    .await
}
