use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::{web, HttpRequest, HttpResponse};
use log::{error, info};

use crate::web::handlers;
use crate::web::models::{ErrorBody, IngestResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::resource("/chat")
                    .app_data(web::JsonConfig::default().error_handler(chat_json_error))
                    .route(web::post().to(handlers::chat)),
            )
            .service(
                web::scope("/admin/ingest")
                    .app_data(web::JsonConfig::default().error_handler(ingest_json_error))
                    .route("/text", web::post().to(handlers::ingest_text))
                    .route("/url", web::post().to(handlers::ingest_url))
                    .route("/file", web::post().to(handlers::ingest_file)),
            ),
    )
    .route("/", web::get().to(handlers::index))
    .route("/admin", web::get().to(handlers::admin))
    .route("/health", web::get().to(handlers::health_check));
}

// Unreadable chat bodies are treated like any other unexpected failure.
fn chat_json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    error!("Chat request body error: {}", err);
    let response = HttpResponse::InternalServerError().json(ErrorBody {
        error: "Internal server error".to_string(),
        details: err.to_string(),
    });
    InternalError::from_response(err, response).into()
}

fn ingest_json_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    info!("Rejected ingest body on {}: {}", req.path(), err);
    let response = HttpResponse::BadRequest().json(IngestResponse::failed(
        "Invalid request body",
        err.to_string(),
    ));
    InternalError::from_response(err, response).into()
}
