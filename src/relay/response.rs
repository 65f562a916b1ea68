//! Fixed response envelope / 固定的响应信封

use serde::{Deserialize, Serialize};

use super::error::BackendError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    pub message: String,
}

/// `{"text_data": {"message": ...}, "audio_data": null}`
///
/// Audio is synthesized on the client, so `audio_data` is always null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionResponse {
    pub text_data: TextData,
    pub audio_data: Option<()>,
}

impl DescriptionResponse {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            text_data: TextData {
                message: message.into(),
            },
            audio_data: None,
        }
    }

    /// Success text or a synthesized backend error message / 成功文本或合成的后端错误消息
    pub fn from_result(result: Result<String, BackendError>) -> Self {
        match result {
            Ok(text) => Self::text(text),
            Err(err) => Self::text(err.to_message()),
        }
    }

    pub fn message(&self) -> &str {
        &self.text_data.message
    }
}
