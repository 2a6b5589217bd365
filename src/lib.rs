pub mod backend;
pub mod chat;
pub mod config;
pub mod web;

use tera::Tera;

use backend::BackendClient;

// App state structure
pub struct AppState {
    pub tera: Tera,
    pub backend: BackendClient,
}
