//! Outbound transport to the inference backend
//! 通往推理后端的出站传输

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::BackendError;

/// Status and body of a completed backend call / 已完成后端调用的状态与正文
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode a 2xx body, or turn the response into an HTTP error
    /// 解码2xx正文，否则转换为HTTP错误
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, BackendError> {
        if !self.is_success() {
            return Err(BackendError::Http {
                status: self.status,
                body: self.body,
            });
        }
        serde_json::from_str(&self.body).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

/// Seam between the orchestrator and the network / 编排器与网络之间的接缝
///
/// Paths are relative to the backend base URL, e.g. `api/chat`.
#[async_trait]
pub trait OllamaTransport: Send + Sync {
    /// Backend identifier for logs / 用于日志的后端标识
    fn base_url(&self) -> &str;

    async fn post_json(&self, path: &str, body: Value) -> Result<RawResponse, BackendError>;

    async fn get(&self, path: &str) -> Result<RawResponse, BackendError>;
}

/// reqwest-backed transport / 基于reqwest的传输
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// `timeout` bounds connect, send and receive of each call
    /// `timeout`限制每次调用的连接、发送与接收
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.into();
        Url::parse(&base_url)
            .map_err(|e| anyhow::anyhow!("invalid ollama base_url: {}: {}", base_url, e))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn join_url(&self, path: &str) -> String {
        let mut base = self.base_url.trim_end_matches('/').to_string();
        base.push('/');
        base.push_str(path.trim_start_matches('/'));
        base
    }

    async fn read(resp: reqwest::Response) -> Result<RawResponse, BackendError> {
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await.map_err(BackendError::transport)?;
        Ok(RawResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

#[async_trait]
impl OllamaTransport for HttpTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<RawResponse, BackendError> {
        let resp = self
            .client
            .post(self.join_url(path))
            .json(&body)
            .send()
            .await
            .map_err(BackendError::transport)?;
        Self::read(resp).await
    }

    async fn get(&self, path: &str) -> Result<RawResponse, BackendError> {
        let resp = self
            .client
            .get(self.join_url(path))
            .send()
            .await
            .map_err(BackendError::transport)?;
        Self::read(resp).await
    }
}
