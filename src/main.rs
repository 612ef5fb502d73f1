use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::info;

use ds_model_web::artifacts::Artifacts;
use ds_model_web::config::ApiConfig;
use ds_model_web::{configure_api, telemetry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init();

    let config = ApiConfig::from_env();
    let artifacts = web::Data::new(Artifacts::load(&config));
    info!(bind = %config.bind, ?artifacts, "prediction API starting");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(artifacts.clone())
            .configure(configure_api)
    })
    .bind(config.bind)?
    .run()
    .await
}
