use std::time::Instant;

use anyhow::Result;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;

#[derive(Debug, Serialize)]
pub struct RemoteTextIngest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct RemoteUrlIngest {
    pub url: String,
    pub chunk_size: u32,
    pub preprocess: bool,
}

#[derive(Debug, Serialize)]
pub struct RemoteQuestion {
    pub question: String,
}

/// A file already read into memory, ready to be forwarded.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoteIngestResult {
    #[serde(default)]
    pub chunks: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoteAnswer {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub usage: Option<Value>,
    #[serde(default)]
    pub model: Option<Value>,
}

/// Result of an outbound call together with its wall-clock duration in seconds.
#[derive(Debug)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: f64,
}

// Client for the retrieval/answering service
pub struct BackendClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl BackendClient {
    pub fn new(config: &Config) -> Self {
        info!("Using backend service at: {}", config.backend_url);
        if config.api_key.is_some() {
            info!("Bearer credential configured for backend requests");
        }

        Self {
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client: Client::new(),
        }
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.post(url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    pub async fn ingest_text(&self, text: &str) -> Result<Timed<RemoteIngestResult>> {
        info!("Forwarding text ingest ({} chars)", text.chars().count());
        let body = RemoteTextIngest {
            text: text.to_string(),
        };
        timed(async { send_json(self.post("/ingest").json(&body)).await }).await
    }

    pub async fn ingest_url(&self, request: &RemoteUrlIngest) -> Result<Timed<RemoteIngestResult>> {
        info!(
            "Forwarding URL ingest: {} (chunk_size: {}, preprocess: {})",
            request.url, request.chunk_size, request.preprocess
        );
        timed(async { send_json(self.post("/ingest-url").json(request)).await }).await
    }

    pub async fn upload_file(
        &self,
        file: UploadedFile,
        chunk_size: u32,
        preprocess: bool,
    ) -> Result<Timed<RemoteIngestResult>> {
        info!(
            "Forwarding file upload: {} ({} bytes, chunk_size: {}, preprocess: {})",
            file.file_name,
            file.data.len(),
            chunk_size,
            preprocess
        );

        let mut part = Part::bytes(file.data).file_name(file.file_name);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new()
            .part("file", part)
            .text("chunk_size", chunk_size.to_string())
            .text("preprocess", preprocess.to_string());

        timed(async { send_json(self.post("/upload/").multipart(form)).await }).await
    }

    pub async fn ask(&self, question: &str) -> Result<RemoteAnswer> {
        info!("Forwarding question ({} chars)", question.chars().count());
        debug!("Question: {}", question);
        let body = RemoteQuestion {
            question: question.to_string(),
        };
        send_json(self.post("/ask").json(&body)).await
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        debug!("Backend error body: {}", error_text);
        return Err(anyhow::anyhow!("backend returned {}", status));
    }

    let value: Value = response.json().await?;
    debug!("Backend response: {}", value);
    Ok(serde_json::from_value(value)?)
}

async fn timed<T, F>(call: F) -> Result<Timed<T>>
where
    F: std::future::Future<Output = Result<T>>,
{
    let start = Instant::now();
    let value = call.await?;
    Ok(Timed {
        value,
        elapsed: start.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> Config {
        Config {
            backend_url: "http://backend.test/".to_string(),
            api_key: api_key.map(str::to_string),
            bind_address: "127.0.0.1".to_string(),
            port: 0,
            templates_dir: "templates".to_string(),
            static_dir: "static".to_string(),
        }
    }

    #[test]
    fn bearer_credential_is_applied_when_configured() {
        let backend = BackendClient::new(&config(Some("secret")));
        let request = backend.post("/ingest").build().unwrap();
        assert_eq!(request.url().as_str(), "http://backend.test/ingest");
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer secret"
        );
    }

    #[test]
    fn no_authorization_header_without_credential() {
        let backend = BackendClient::new(&config(None));
        let request = backend.post("/ask").build().unwrap();
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn ingest_result_tolerates_missing_and_extra_fields() {
        let result: RemoteIngestResult =
            serde_json::from_str(r#"{"status":"success","message":"ok"}"#).unwrap();
        assert!(result.chunks.is_none());

        let result: RemoteIngestResult = serde_json::from_str(r#"{"chunks":7}"#).unwrap();
        assert_eq!(result.chunks, Some(7));
    }

    #[test]
    fn answer_is_optional() {
        let answer: RemoteAnswer = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert!(answer.answer.is_none());
    }
}
