use std::time::Duration;

use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;

use tasknest::config::Config;
use tasknest::middleware::{RateLimit, RecoverPanic};
use tasknest::routes;
use tasknest::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_timeout)
        .connect(&config.database_url)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("database connection failed: {}", e)))?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("migrations failed: {}", e)))?;

    let state = web::Data::new(AppState::postgres(pool, &config));
    let limiter = RateLimit::from_config(
        config.limiter.enabled,
        config.limiter.rps,
        config.limiter.burst,
    );
    limiter.spawn_pruner(Duration::from_secs(60));

    log::info!(
        "starting {} server at {}",
        config.environment,
        config.server_url()
    );
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(limiter.clone())
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(DefaultHeaders::new().add(("X-Frame-Options", "deny")))
            .wrap(RecoverPanic)
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
