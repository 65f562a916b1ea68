//! Scripted in-memory transport / 脚本化的内存传输
//!
//! Replies are consumed in order regardless of path, and every call is
//! recorded so callers can assert on the exact outbound sequence.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::error::BackendError;
use super::transport::{OllamaTransport, RawResponse};

/// One scripted reply / 一个脚本化的回复
#[derive(Debug, Clone)]
pub enum StubReply {
    Json(u16, Value),
    Text(u16, String),
    Fail(String),
}

/// A recorded outbound call / 一次记录的出站调用
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct StubTransport {
    replies: Mutex<VecDeque<StubReply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubTransport {
    pub fn new(replies: impl IntoIterator<Item = StubReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// `METHOD path` for each recorded call / 每次调用的`方法 路径`
    pub fn call_paths(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|c| format!("{} {}", c.method, c.path))
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }

    fn answer(&self, call: RecordedCall) -> Result<RawResponse, BackendError> {
        self.calls.lock().push(call);
        match self.replies.lock().pop_front() {
            Some(StubReply::Json(status, v)) => Ok(RawResponse {
                status,
                body: v.to_string(),
            }),
            Some(StubReply::Text(status, body)) => Ok(RawResponse { status, body }),
            Some(StubReply::Fail(msg)) => Err(BackendError::Transport(msg)),
            None => Err(BackendError::Transport(
                "stub transport has no scripted reply left".to_string(),
            )),
        }
    }
}

#[async_trait]
impl OllamaTransport for StubTransport {
    fn base_url(&self) -> &str {
        "stub://ollama"
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<RawResponse, BackendError> {
        self.answer(RecordedCall {
            method: "POST",
            path: path.to_string(),
            body: Some(body),
        })
    }

    async fn get(&self, path: &str) -> Result<RawResponse, BackendError> {
        self.answer(RecordedCall {
            method: "GET",
            path: path.to_string(),
            body: None,
        })
    }
}
