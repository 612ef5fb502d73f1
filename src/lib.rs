//! Prediction API and PMB site served with actix-web.
//!
//! The two binaries share this crate: `ds-model-api` serves [`handlers`]
//! backed by the [`artifacts`] loaded at startup, `ds-site` serves the
//! static pages in [`site`].

pub mod artifacts;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod site;
pub mod telemetry;

use actix_web::web;

/// Registers the prediction API routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(handlers::welcome)))
        .service(
            web::resource("/predict")
                .route(web::get().to(handlers::predict_usage))
                .route(web::post().to(handlers::predict)),
        );
}
