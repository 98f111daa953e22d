use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use chrono::Utc;
use std::io;

use workboard::{auth::AuthMiddleware, config::Config, db, routes, services, state::AppState};

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;

    let pool = if config.database_url.contains(":memory:") {
        db::connect_in_memory().await
    } else {
        db::connect(&config.database_url).await
    }
    .map_err(startup_error)?;

    if db::seed_admin(&pool, &config).await.map_err(startup_error)? {
        log::warn!("Created initial admin {}; change its password", config.seed_admin_email);
    }
    services::revocation::prune_expired(&pool, Utc::now().timestamp())
        .await
        .map_err(startup_error)?;

    let bind = (config.server_host.clone(), config.server_port);
    let cors_origin = config.cors_origin.clone();
    log::info!("Starting workboard server at {}", config.server_url());
    let state = web::Data::new(AppState::new(pool, config));

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .expose_headers(vec![header::CONTENT_DISPOSITION])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(routes::health::health)
            .service(
                web::scope("")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind(bind)?
    .run()
    .await
}
