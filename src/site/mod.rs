//! Static pages and the PMB registration form.

pub mod handlers;
pub mod templates;
pub mod upload;

use actix_web::web;

/// Registers the site routes. Expects `web::Data<SiteConfig>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(handlers::home)))
        .service(web::resource("/home").route(web::get().to(handlers::home)))
        .service(web::resource("/about").route(web::get().to(handlers::about)))
        .service(
            web::resource("/contact")
                .route(web::get().to(handlers::contact))
                .route(web::post().to(handlers::contact_submit)),
        )
        .service(
            web::resource("/pmb")
                .route(web::get().to(handlers::pmb))
                .route(web::post().to(handlers::pmb_submit)),
        );
}
