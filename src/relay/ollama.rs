//! Ollama wire types and model substitution
//! Ollama线路类型与模型替换

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GENERATE_PATH: &str = "api/generate";
pub const CHAT_PATH: &str = "api/chat";
pub const TAGS_PATH: &str = "api/tags";

/// Body of `POST /api/generate`
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub images: [&'a str; 1],
    pub stream: bool,
}

impl<'a> GenerateRequest<'a> {
    pub fn new(model: &'a str, prompt: &'a str, image: &'a str) -> Self {
        Self {
            model,
            prompt,
            images: [image],
            stream: false,
        }
    }
}

/// Body of `POST /api/chat`
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: [ChatMessage<'a>; 1],
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
    pub images: [&'a str; 1],
}

impl<'a> ChatRequest<'a> {
    /// Single user turn carrying prompt and image / 携带提示与图像的单个用户轮次
    pub fn single_turn(model: &'a str, prompt: &'a str, image: &'a str) -> Self {
        Self {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
                images: [image],
            }],
            stream: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub content: String,
}

impl ChatResponse {
    pub fn into_content(self) -> String {
        self.message.map(|m| m.content).unwrap_or_default()
    }
}

/// `GET /api/tags` response; entries are kept loose / 条目保持宽松解析
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<Value>,
}

/// Installed model entry / 已安装模型条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidate {
    pub name: String,
    pub model: Option<String>,
}

impl ModelCandidate {
    /// Non-object entries and entries without a name are skipped
    /// 跳过非对象条目以及没有名称的条目
    pub fn from_entry(entry: &Value) -> Option<Self> {
        let obj = entry.as_object()?;
        let model = obj
            .get("model")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .or_else(|| model.clone())
            .filter(|s| !s.trim().is_empty())?;
        Some(Self { name, model })
    }

    fn mentions(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .model
                .as_deref()
                .map(|m| m.to_lowercase().contains(needle))
                .unwrap_or(false)
    }

    fn matches(&self, family: &str, tag: &str) -> bool {
        self.mentions(family) && self.mentions(tag)
    }
}

impl TagsResponse {
    pub fn candidates(&self) -> Vec<ModelCandidate> {
        self.models
            .iter()
            .filter_map(ModelCandidate::from_entry)
            .collect()
    }
}

/// Model families tried in order when the configured model is missing
/// 配置的模型缺失时按顺序尝试的模型族
const SUBSTITUTE_PREFERENCE: [(&str, &str); 2] = [("qwen3", "vl"), ("qwen", "vl")];

/// First installed model of the most preferred family, in backend order
/// 按后端返回顺序取最优先模型族中的第一个已安装模型
pub fn select_substitute(candidates: &[ModelCandidate]) -> Option<String> {
    SUBSTITUTE_PREFERENCE.iter().find_map(|(family, tag)| {
        candidates
            .iter()
            .find(|c| c.matches(family, tag))
            .map(|c| c.name.clone())
    })
}
