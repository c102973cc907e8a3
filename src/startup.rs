use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::logger::LoggerMiddleware;
use crate::middleware::{ApiMetrics, FileserverHits};
use crate::routes::{
    create_chirp, create_user, delete_chirp, get_chirp, get_chirps, health_check, login, metrics,
    polka_webhook, refresh, reset, revoke, update_user,
};
use crate::state::AppState;

/// Register every route on an actix service config
///
/// Shared by the real server and the in-process test services.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/healthz", web::get().to(health_check))
            .route("/users", web::post().to(create_user))
            .route("/users", web::put().to(update_user))
            .route("/login", web::post().to(login))
            .route("/refresh", web::post().to(refresh))
            .route("/revoke", web::post().to(revoke))
            .route("/chirps", web::post().to(create_chirp))
            .route("/chirps", web::get().to(get_chirps))
            .route("/chirps/{chirp_id}", web::get().to(get_chirp))
            .route("/chirps/{chirp_id}", web::delete().to(delete_chirp))
            .route("/polka/webhooks", web::post().to(polka_webhook)),
    )
    .service(
        web::scope("/admin")
            .route("/metrics", web::get().to(metrics))
            .route("/reset", web::post().to(reset)),
    );
}

pub fn run(
    listener: TcpListener,
    state: AppState,
    static_dir: String,
) -> Result<Server, std::io::Error> {
    let state = web::Data::new(state);
    let metrics = Arc::new(ApiMetrics::default());
    let metrics_data = web::Data::from(Arc::clone(&metrics));

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(state.clone())
            .app_data(metrics_data.clone())

            .configure(configure)

            // Static file serving, counted for the admin page
            .service(
                web::scope("/app")
                    .wrap(FileserverHits::new(Arc::clone(&metrics)))
                    .service(fs::Files::new("/", &static_dir).index_file("index.html")),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
