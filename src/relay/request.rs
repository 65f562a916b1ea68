//! Inbound description request parsing and validation
//! 入站描述请求的解析与校验

use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

use super::error::RelayError;

pub const DEFAULT_VOICE: &str = "random";
pub const DEFAULT_SPEED: f64 = 1.0;
pub const DEFAULT_RESPONSE_TYPE: &str = "text";

/// Raw JSON body of `POST /description/` / `POST /description/`的原始JSON正文
///
/// Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionParams {
    pub data_url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub response_type: Option<String>,
    #[serde(default)]
    pub skip_openai: Option<bool>,
}

impl DescriptionParams {
    fn has_voice_options(&self) -> bool {
        self.voice.is_some()
            || self.speed.is_some()
            || self.response_type.is_some()
            || self.skip_openai.is_some()
    }
}

/// Prompt language / 提示语言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    German,
}

impl Language {
    /// Only the exact code `de` selects German / 仅精确匹配`de`时选择德语
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("de") => Language::German,
            _ => Language::English,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::German => "de",
        }
    }
}

/// Which prompt family to use / 使用哪一类提示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptVariant {
    /// Region, features and directions / 区域、要素与方位
    Brief,
    /// Brief plus marker density and clustering / 额外描述标记密度与聚集
    Markers,
}

/// Display options sent by voice-style clients / 语音类客户端发送的显示选项
///
/// Speech is synthesized in the browser; these values are only recorded on
/// the request span.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayOptions {
    pub voice: String,
    pub speed: f64,
    pub response_type: String,
    pub skip_openai: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            speed: DEFAULT_SPEED,
            response_type: DEFAULT_RESPONSE_TYPE.to_string(),
            skip_openai: false,
        }
    }
}

/// Validated description request / 校验后的描述请求
#[derive(Debug, Clone)]
pub struct DescriptionRequest {
    /// Base64 image payload, forwarded verbatim / Base64图像数据，原样转发
    pub image: String,
    pub language: Language,
    pub variant: PromptVariant,
    pub display: DisplayOptions,
}

impl DescriptionRequest {
    /// Validate raw params / 校验原始参数
    ///
    /// With `strict_base64` the payload must be non-empty standard base64.
    pub fn from_params(params: DescriptionParams, strict_base64: bool) -> Result<Self, RelayError> {
        let variant = if params.has_voice_options() {
            PromptVariant::Markers
        } else {
            PromptVariant::Brief
        };

        let speed = params.speed.unwrap_or(DEFAULT_SPEED);
        if !speed.is_finite() || speed <= 0.0 {
            return Err(RelayError::invalid_field(
                "speed",
                format!("must be a positive number, got {speed}"),
            ));
        }

        let image = extract_image_payload(&params.data_url).to_string();
        if strict_base64 {
            validate_base64(&image)?;
        }

        let language = Language::from_code(params.language.as_deref());
        let defaults = DisplayOptions::default();

        Ok(Self {
            image,
            language,
            variant,
            display: DisplayOptions {
                voice: params.voice.unwrap_or(defaults.voice),
                speed,
                response_type: params.response_type.unwrap_or(defaults.response_type),
                skip_openai: params.skip_openai.unwrap_or(defaults.skip_openai),
            },
        })
    }
}

/// Strip an optional `<prefix>,` from a data URL / 去掉数据URL中可选的`<前缀>,`
///
/// Splits on the first comma only; input without a comma is returned whole.
pub fn extract_image_payload(data_url: &str) -> &str {
    match data_url.split_once(',') {
        Some((_, payload)) => payload,
        None => data_url,
    }
}

fn validate_base64(payload: &str) -> Result<(), RelayError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(RelayError::invalid_field("data_url", "empty image payload"));
    }
    general_purpose::STANDARD
        .decode(trimmed)
        .map(|_| ())
        .map_err(|e| RelayError::invalid_field("data_url", format!("invalid base64 payload: {e}")))
}
