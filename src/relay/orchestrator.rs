//! Inference call orchestration / 推理调用编排
//!
//! The fallback chain is a small state machine:
//!
//! ```text
//! Generate ──404/405──▶ Chat ──404 "model … not found"──▶ Discover ──▶ ChatRetry
//!    │                   │                                   │            │
//!    └── 2xx: Succeed    └── 2xx: Succeed                    └── none:    └── Succeed | Fail
//!        else: Fail          else: Fail                          Fail
//! ```
//!
//! At most one chat fallback and one model substitution happen per request.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::error::BackendError;
use super::ollama::{
    select_substitute, ChatRequest, ChatResponse, GenerateRequest, GenerateResponse,
    TagsResponse, CHAT_PATH, GENERATE_PATH, TAGS_PATH,
};
use super::transport::OllamaTransport;

/// Orchestrator state / 编排器状态
#[derive(Debug, Clone)]
pub enum Stage {
    /// Single-shot `api/generate` with the configured model
    Generate,
    /// `api/chat` with the configured model
    Chat,
    /// List installed models after a model-not-found chat error
    Discover { not_found: BackendError },
    /// `api/chat` with the substituted model, terminal
    ChatRetry { model: String },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Generate => "generate",
            Stage::Chat => "chat",
            Stage::Discover { .. } => "discover",
            Stage::ChatRetry { .. } => "chat_retry",
        }
    }
}

/// Result of one state step / 单步状态转换的结果
#[derive(Debug)]
pub enum Transition {
    Succeed(String),
    Advance(Stage),
    Fail(BackendError),
}

/// What the backend produced for one request / 后端对单个请求的产出
#[derive(Debug)]
pub struct Outcome {
    pub result: Result<String, BackendError>,
    /// Model that produced the final answer or error / 产生最终结果或错误的模型
    pub model: String,
    /// Stages visited, in order / 依次经过的状态
    pub stages: Vec<&'static str>,
}

/// Prompt and image for one description / 单次描述的提示与图像
#[derive(Debug, Clone, Copy)]
pub struct Attempt<'a> {
    pub prompt: &'a str,
    pub image: &'a str,
}

/// Drives the fallback chain against a transport / 针对传输执行回退链
pub struct DescriptionOrchestrator {
    transport: Arc<dyn OllamaTransport>,
    model: String,
}

impl DescriptionOrchestrator {
    pub fn new(transport: Arc<dyn OllamaTransport>, model: impl Into<String>) -> Self {
        Self {
            transport,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn backend(&self) -> &str {
        self.transport.base_url()
    }

    /// Run the state machine to completion / 运行状态机直至结束
    pub async fn run(&self, attempt: Attempt<'_>) -> Outcome {
        let mut stage = Stage::Generate;
        let mut stages = Vec::with_capacity(4);
        let mut model = self.model.clone();

        loop {
            stages.push(stage.name());
            if let Stage::ChatRetry { model: substitute } = &stage {
                model = substitute.clone();
            }
            match self.step(attempt, stage).await {
                Transition::Succeed(text) => {
                    return Outcome {
                        result: Ok(text),
                        model,
                        stages,
                    }
                }
                Transition::Fail(err) => {
                    return Outcome {
                        result: Err(err),
                        model,
                        stages,
                    }
                }
                Transition::Advance(next) => {
                    debug!(from = stages.last().copied(), to = next.name(), "advancing");
                    stage = next;
                }
            }
        }
    }

    /// Execute one stage and decide the next one / 执行一个状态并决定下一个状态
    pub async fn step(&self, attempt: Attempt<'_>, stage: Stage) -> Transition {
        match stage {
            Stage::Generate => match self.generate(attempt).await {
                Ok(text) => Transition::Succeed(text),
                Err(e) if e.is_unsupported_endpoint() => {
                    debug!(status = ?e.status(), "generate endpoint unsupported, trying chat");
                    Transition::Advance(Stage::Chat)
                }
                Err(e) => Transition::Fail(e),
            },
            Stage::Chat => match self.chat(attempt, &self.model).await {
                Ok(text) => Transition::Succeed(text),
                Err(e) if e.is_model_not_found() => {
                    warn!(model = %self.model, "configured model not found, looking for a substitute");
                    Transition::Advance(Stage::Discover { not_found: e })
                }
                Err(e) => Transition::Fail(e),
            },
            Stage::Discover { not_found } => match self.installed_models().await {
                Ok(tags) => match select_substitute(&tags.candidates()) {
                    Some(model) => {
                        debug!(substitute = %model, "selected substitute model");
                        Transition::Advance(Stage::ChatRetry { model })
                    }
                    None => Transition::Fail(BackendError::NoSubstituteModel {
                        not_found: Box::new(not_found),
                    }),
                },
                Err(e) => Transition::Fail(e),
            },
            Stage::ChatRetry { model } => match self.chat(attempt, &model).await {
                Ok(text) => Transition::Succeed(text),
                Err(e) => Transition::Fail(e),
            },
        }
    }

    async fn generate(&self, attempt: Attempt<'_>) -> Result<String, BackendError> {
        let body = GenerateRequest::new(&self.model, attempt.prompt, attempt.image);
        let resp = self
            .transport
            .post_json(GENERATE_PATH, to_body(&body)?)
            .await?;
        Ok(resp.into_json::<GenerateResponse>()?.response)
    }

    async fn chat(&self, attempt: Attempt<'_>, model: &str) -> Result<String, BackendError> {
        let body = ChatRequest::single_turn(model, attempt.prompt, attempt.image);
        let resp = self.transport.post_json(CHAT_PATH, to_body(&body)?).await?;
        Ok(resp.into_json::<ChatResponse>()?.into_content())
    }

    async fn installed_models(&self) -> Result<TagsResponse, BackendError> {
        self.transport.get(TAGS_PATH).await?.into_json()
    }
}

fn to_body<T: Serialize>(body: &T) -> Result<serde_json::Value, BackendError> {
    serde_json::to_value(body).map_err(|e| BackendError::Serialization(e.to_string()))
}
