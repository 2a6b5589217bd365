use actix_files as fs;
use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use log::{error, info};
use tera::Tera;

use kb_relay::backend::BackendClient;
use kb_relay::config::Config;
use kb_relay::web::routes;
use kb_relay::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::from_env();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting knowledge-base relay");

    let backend = BackendClient::new(&config);

    // Initialize template engine
    let mut tera = match Tera::new(&format!("{}/**/*", config.templates_dir)) {
        Ok(t) => t,
        Err(e) => {
            error!("Template parsing error: {}", e);
            std::process::exit(1);
        }
    };
    tera.autoescape_on(vec![".html"]);

    let app_state = Data::new(AppState { tera, backend });
    let static_dir = config.static_dir.clone();

    info!("Listening on {}:{}", config.bind_address, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(routes::configure)
            .service(fs::Files::new("/static", &static_dir))
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await
}
