use std::env;
use std::ops::RangeInclusive;

use dotenv::dotenv;

/// Uploads larger than this are rejected before contacting the backend.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Limit for each non-file form field of an upload.
pub const MAX_FORM_FIELD_BYTES: usize = 4 * 1024;

/// Limit across all parts of an upload form.
pub const MAX_FORM_BYTES: usize = MAX_UPLOAD_BYTES + 64 * 1024;

pub const DEFAULT_CHUNK_SIZE: u32 = 1000;

/// Range offered by the admin page. Not enforced server-side.
pub const CHUNK_SIZE_RANGE: RangeInclusive<u32> = 100..=5000;

/// Characters per chunk used when the backend does not report a chunk count for text.
pub const ESTIMATE_CHARS_PER_CHUNK: usize = 1000;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub api_key: Option<String>,
    pub bind_address: String,
    pub port: u16,
    pub templates_dir: String,
    pub static_dir: String,
}

impl Config {
    /// Reads the environment after loading `.env`, if present.
    pub fn from_env() -> Self {
        dotenv().ok();

        let backend_url = env::var("FASTAPI_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            api_key: env::var("FASTAPI_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(8080),
            templates_dir: env::var("TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_string()),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()),
        }
    }
}
