use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{RemoteAnswer, RemoteIngestResult, RemoteUrlIngest};
use crate::config::{DEFAULT_CHUNK_SIZE, ESTIMATE_CHARS_PER_CHUNK};

pub const ANSWER_FALLBACK: &str = "Could not get an answer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// History entries are accepted as-is; their content is never inspected.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<Value>,
}

impl ChatResponse {
    pub fn from_remote(remote: RemoteAnswer) -> Self {
        let response = remote
            .answer
            .filter(|answer| !answer.is_empty())
            .unwrap_or_else(|| ANSWER_FALLBACK.to_string());
        Self {
            response,
            usage: remote.usage,
            model: remote.model,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextIngestRequest {
    #[serde(default)]
    pub text: Option<String>,
}

impl TextIngestRequest {
    /// Returns the text when it has any non-whitespace content.
    pub fn content(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UrlIngestRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub chunk_size: Option<u32>,
    #[serde(default)]
    pub preprocess: Option<bool>,
}

impl UrlIngestRequest {
    /// Validates the URL syntax and fills in defaults. Reachability is not checked.
    pub fn to_remote(&self) -> Option<RemoteUrlIngest> {
        let url = self.url.as_deref().filter(|url| !url.is_empty())?;
        reqwest::Url::parse(url).ok()?;

        Some(RemoteUrlIngest {
            url: url.to_string(),
            chunk_size: chunk_size_or_default(self.chunk_size),
            preprocess: self.preprocess != Some(false),
        })
    }
}

pub fn chunk_size_or_default(chunk_size: Option<u32>) -> u32 {
    match chunk_size {
        Some(size) if size > 0 => size,
        _ => DEFAULT_CHUNK_SIZE,
    }
}

/// Chunk count assumed for text the backend did not report on.
/// Counts chars, so astral-plane characters weigh one each rather than two UTF-16 units.
pub fn estimate_chunks(text: &str) -> u64 {
    text.chars().count().div_ceil(ESTIMATE_CHARS_PER_CHUNK) as u64
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IngestResponse {
    pub fn from_remote(message: impl Into<String>, remote: RemoteIngestResult, elapsed: f64) -> Self {
        Self {
            success: true,
            message: message.into(),
            chunks: remote.chunks,
            processing_time: Some(elapsed),
            details: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            chunks: None,
            processing_time: None,
            details: None,
        }
    }

    pub fn failed(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::rejected(message)
        }
    }
}
