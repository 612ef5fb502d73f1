use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::info;

use ds_model_web::config::SiteConfig;
use ds_model_web::{site, telemetry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init();

    let config = SiteConfig::from_env();
    info!(bind = %config.bind, upload_dir = %config.upload_dir.display(), "site starting");
    let bind = config.bind;
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(config.clone())
            .configure(site::configure)
    })
    .bind(bind)?
    .run()
    .await
}
