//! Error types for the relay
//! 中继服务的错误类型

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Maximum number of characters of a backend error body kept in messages
/// 错误消息中保留的后端错误正文最大字符数
pub const ERROR_BODY_LIMIT: usize = 200;

/// Prefix of every failure message returned to the client / 返回给客户端的失败消息前缀
pub const BACKEND_ERROR_PREFIX: &str = "Ollama error";

/// Errors raised while talking to the inference backend
/// 与推理后端通信时产生的错误
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Non-2xx response / 非2xx响应
    #[error("HTTP {status}: {}", truncate_body(.body))]
    Http { status: u16, body: String },

    /// Backend unreachable or timed out / 后端不可达或超时
    #[error("{0}")]
    Transport(String),

    /// 2xx response with an unusable body / 2xx响应但正文不可用
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    /// Request body could not be encoded / 请求正文无法编码
    #[error("failed to encode backend request: {0}")]
    Serialization(String),

    /// Configured model missing and no substitute installed / 配置的模型缺失且没有可替代模型
    #[error("{not_found}")]
    NoSubstituteModel { not_found: Box<BackendError> },
}

fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

impl BackendError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        BackendError::Transport(err.to_string())
    }

    /// HTTP status, if the error carries one / HTTP状态码（如有）
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Http { status, .. } => Some(*status),
            BackendError::NoSubstituteModel { not_found } => not_found.status(),
            _ => None,
        }
    }

    /// Endpoint or method not supported by the backend / 后端不支持该端点或方法
    pub fn is_unsupported_endpoint(&self) -> bool {
        matches!(self, BackendError::Http { status: 404 | 405, .. })
    }

    /// 404 whose body reports a missing model / 正文表明模型不存在的404
    pub fn is_model_not_found(&self) -> bool {
        match self {
            BackendError::Http { status: 404, body } => {
                let lower = body.to_lowercase();
                lower.contains("model") && lower.contains("not found")
            }
            _ => false,
        }
    }

    /// Short kind label for logs / 用于日志的简短类型标签
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Http { .. } => "http",
            BackendError::Transport(_) => "transport",
            BackendError::InvalidResponse(_) => "invalid_response",
            BackendError::Serialization(_) => "serialization",
            BackendError::NoSubstituteModel { .. } => "no_substitute_model",
        }
    }

    /// User-facing message placed in the response envelope
    /// 放入响应信封的面向用户的消息
    pub fn to_message(&self) -> String {
        format!("{}: {}", BACKEND_ERROR_PREFIX, self)
    }
}

/// Errors rejected at the HTTP boundary / 在HTTP边界被拒绝的错误
#[derive(Debug, Error)]
pub enum RelayError {
    /// Body missing, not JSON, or missing required fields / 正文缺失、非JSON或缺少必填字段
    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },

    /// Field present but invalid / 字段存在但无效
    #[error("invalid field `{field}`: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
}

impl RelayError {
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        RelayError::InvalidField {
            field,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidBody { status, .. } => *status,
            RelayError::InvalidField { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for RelayError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        RelayError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({ "detail": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_body_is_truncated() {
        let err = BackendError::Http {
            status: 500,
            body: "x".repeat(500),
        };
        let msg = err.to_string();
        assert_eq!(msg, format!("HTTP 500: {}", "x".repeat(ERROR_BODY_LIMIT)));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let err = BackendError::Http {
            status: 502,
            body: "ü".repeat(300),
        };
        let msg = err.to_string();
        assert!(msg.ends_with(&"ü".repeat(ERROR_BODY_LIMIT)));
    }

    #[test]
    fn test_message_format() {
        let err = BackendError::Http {
            status: 500,
            body: "internal error".to_string(),
        };
        assert_eq!(err.to_message(), "Ollama error: HTTP 500: internal error");
    }

    #[test]
    fn test_model_not_found_detection() {
        let err = BackendError::Http {
            status: 404,
            body: r#"{"error":"model 'x' not found"}"#.to_string(),
        };
        assert!(err.is_model_not_found());

        let upper = BackendError::Http {
            status: 404,
            body: "MODEL qwen NOT FOUND".to_string(),
        };
        assert!(upper.is_model_not_found());

        let wrong_status = BackendError::Http {
            status: 500,
            body: "model 'x' not found".to_string(),
        };
        assert!(!wrong_status.is_model_not_found());

        let plain_404 = BackendError::Http {
            status: 404,
            body: "404 page not found".to_string(),
        };
        assert!(!plain_404.is_model_not_found());
    }

    #[test]
    fn test_unsupported_endpoint_detection() {
        for status in [404u16, 405] {
            let err = BackendError::Http {
                status,
                body: String::new(),
            };
            assert!(err.is_unsupported_endpoint());
        }
        assert!(!BackendError::Transport("timeout".into()).is_unsupported_endpoint());
    }

    #[test]
    fn test_no_substitute_keeps_original_detail() {
        let original = BackendError::Http {
            status: 404,
            body: "model 'x' not found".to_string(),
        };
        let err = BackendError::NoSubstituteModel {
            not_found: Box::new(original),
        };
        assert_eq!(err.to_message(), "Ollama error: HTTP 404: model 'x' not found");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.kind(), "no_substitute_model");
    }

    #[test]
    fn test_relay_error_status_codes() {
        let err = RelayError::invalid_field("speed", "must be positive");
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "invalid field `speed`: must be positive");
    }
}
