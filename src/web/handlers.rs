use actix_multipart::{Multipart, MultipartError};
use actix_web::{web, HttpResponse, Responder};
use futures_util::TryStreamExt;
use log::{debug, error, info};
use serde_json::json;
use tera::Context;

use crate::backend::UploadedFile;
use crate::config::{
    CHUNK_SIZE_RANGE, DEFAULT_CHUNK_SIZE, MAX_FORM_BYTES, MAX_FORM_FIELD_BYTES, MAX_UPLOAD_BYTES,
};
use crate::web::models::{
    chunk_size_or_default, estimate_chunks, ChatRequest, ChatResponse, ErrorBody, IngestResponse,
    TextIngestRequest, UrlIngestRequest,
};
use crate::AppState;

// Chat page
pub async fn index(data: web::Data<AppState>) -> impl Responder {
    render(&data, "index.html", &Context::new())
}

// Knowledge-base admin page
pub async fn admin(data: web::Data<AppState>) -> impl Responder {
    let mut context = Context::new();
    context.insert("chunk_size_min", CHUNK_SIZE_RANGE.start());
    context.insert("chunk_size_max", CHUNK_SIZE_RANGE.end());
    context.insert("chunk_size_default", &DEFAULT_CHUNK_SIZE);
    context.insert("max_upload_mb", &(MAX_UPLOAD_BYTES / (1024 * 1024)));
    render(&data, "admin.html", &context)
}

fn render(data: &AppState, template: &str, context: &Context) -> HttpResponse {
    match data.tera.render(template, context) {
        Ok(html) => HttpResponse::Ok().content_type("text/html").body(html),
        Err(e) => {
            error!("Template error: {}", e);
            HttpResponse::InternalServerError().body("Template error")
        }
    }
}

// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// Chat relay. Only the latest message reaches the backend.
pub async fn chat(data: web::Data<AppState>, req: web::Json<ChatRequest>) -> impl Responder {
    info!(
        "Chat request: {} chars, {} prior messages",
        req.message.chars().count(),
        req.history.len()
    );
    if !req.history.is_empty() {
        debug!("History of {} messages is not forwarded", req.history.len());
    }

    match data.backend.ask(&req.message).await {
        Ok(answer) => HttpResponse::Ok().json(ChatResponse::from_remote(answer)),
        Err(e) => {
            error!("Chat relay error: {:#}", e);
            HttpResponse::InternalServerError().json(ErrorBody {
                error: "Internal server error".to_string(),
                details: format!("{:#}", e),
            })
        }
    }
}

pub async fn ingest_text(
    data: web::Data<AppState>,
    req: web::Json<TextIngestRequest>,
) -> impl Responder {
    let text = match req.content() {
        Some(text) => text,
        None => return HttpResponse::BadRequest().json(IngestResponse::rejected("Text is empty")),
    };

    match data.backend.ingest_text(text).await {
        Ok(timed) => {
            let fallback = estimate_chunks(text);
            let mut response =
                IngestResponse::from_remote("Text was added successfully", timed.value, timed.elapsed);
            response.chunks.get_or_insert(fallback);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            error!("Text ingest error: {:#}", e);
            HttpResponse::InternalServerError().json(IngestResponse::failed(
                "An error occurred while processing the text",
                format!("{:#}", e),
            ))
        }
    }
}

pub async fn ingest_url(
    data: web::Data<AppState>,
    req: web::Json<UrlIngestRequest>,
) -> impl Responder {
    let remote = match req.to_remote() {
        Some(remote) => remote,
        None => {
            return HttpResponse::BadRequest()
                .json(IngestResponse::rejected("Please enter a valid URL"))
        }
    };

    match data.backend.ingest_url(&remote).await {
        Ok(timed) => HttpResponse::Ok().json(IngestResponse::from_remote(
            "Data from the URL was added successfully",
            timed.value,
            timed.elapsed,
        )),
        Err(e) => {
            error!("URL ingest error: {:#}", e);
            HttpResponse::InternalServerError().json(IngestResponse::failed(
                "An error occurred while processing the URL",
                format!("{:#}", e),
            ))
        }
    }
}

#[derive(Debug, Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    chunk_size: Option<String>,
    preprocess: Option<String>,
}

enum UploadError {
    TooLarge,
    FieldTooLarge(String),
    FormTooLarge,
    Malformed(MultipartError),
}

impl From<MultipartError> for UploadError {
    fn from(e: MultipartError) -> Self {
        UploadError::Malformed(e)
    }
}

async fn read_upload(payload: &mut Multipart) -> Result<UploadForm, UploadError> {
    let mut form = UploadForm::default();
    let mut total = 0usize;

    while let Some(mut field) = payload.try_next().await? {
        let name = field.content_disposition().get_name().unwrap_or_default().to_string();
        let file_name = field.content_disposition().get_filename().map(str::to_string);
        let content_type = field.content_type().map(|mime| mime.to_string());
        let known = matches!(name.as_str(), "file" | "chunk_size" | "preprocess");

        let mut data = Vec::new();
        let mut size = 0usize;
        while let Some(chunk) = field.try_next().await? {
            size += chunk.len();
            total += chunk.len();
            if name == "file" {
                if size > MAX_UPLOAD_BYTES {
                    return Err(UploadError::TooLarge);
                }
            } else if size > MAX_FORM_FIELD_BYTES {
                return Err(UploadError::FieldTooLarge(name));
            }
            if total > MAX_FORM_BYTES {
                return Err(UploadError::FormTooLarge);
            }
            // Unknown fields count toward the total but are never kept.
            if known {
                data.extend_from_slice(&chunk);
            }
        }

        match name.as_str() {
            "file" => {
                if let Some(file_name) = file_name {
                    form.file = Some(UploadedFile {
                        file_name,
                        content_type,
                        data,
                    });
                }
            }
            "chunk_size" => form.chunk_size = Some(String::from_utf8_lossy(&data).into_owned()),
            "preprocess" => form.preprocess = Some(String::from_utf8_lossy(&data).into_owned()),
            other => debug!("Ignoring form field: {}", other),
        }
    }

    Ok(form)
}

pub async fn ingest_file(data: web::Data<AppState>, mut payload: Multipart) -> impl Responder {
    let form = match read_upload(&mut payload).await {
        Ok(form) => form,
        Err(UploadError::TooLarge) => {
            info!("Rejected upload larger than {} bytes", MAX_UPLOAD_BYTES);
            return HttpResponse::BadRequest()
                .json(IngestResponse::rejected("File size exceeds 10MB"));
        }
        Err(UploadError::FieldTooLarge(name)) => {
            info!("Rejected oversized form field: {}", name);
            return HttpResponse::BadRequest().json(IngestResponse::rejected(format!(
                "Form field \"{}\" is too large",
                name
            )));
        }
        Err(UploadError::FormTooLarge) => {
            info!("Rejected form data larger than {} bytes", MAX_FORM_BYTES);
            return HttpResponse::BadRequest()
                .json(IngestResponse::rejected("Form data is too large"));
        }
        Err(UploadError::Malformed(e)) => {
            error!("File ingest error: {}", e);
            return HttpResponse::InternalServerError().json(IngestResponse::failed(
                "An error occurred while processing the file",
                e.to_string(),
            ));
        }
    };

    let file = match form.file {
        Some(file) => file,
        None => {
            return HttpResponse::BadRequest().json(IngestResponse::rejected("No file selected"))
        }
    };

    let chunk_size = chunk_size_or_default(
        form.chunk_size
            .as_deref()
            .and_then(|s| s.trim().parse::<u32>().ok()),
    );
    let preprocess = form.preprocess.as_deref() == Some("true");
    let file_name = file.file_name.clone();

    match data.backend.upload_file(file, chunk_size, preprocess).await {
        Ok(timed) => HttpResponse::Ok().json(IngestResponse::from_remote(
            format!("File \"{}\" was added successfully", file_name),
            timed.value,
            timed.elapsed,
        )),
        Err(e) => {
            error!("File ingest error: {:#}", e);
            HttpResponse::InternalServerError().json(IngestResponse::failed(
                "An error occurred while processing the file",
                format!("{:#}", e),
            ))
        }
    }
}
