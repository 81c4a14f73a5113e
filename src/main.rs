mod config;
mod dtos;
mod errors;
mod handlers;
mod models;
mod repositories;

use std::env;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use deadpool_postgres::Pool;
use log::{error, info, warn};

use crate::errors::json_error_handler;
use crate::handlers::post_handlers::{create_post, list_posts};

const DB_CONN_CHECK_TIMEOUT: Duration = Duration::from_secs(1);
const DB_CONN_CHECKS_COUNT: u32 = 20;

#[derive(Clone)]
pub struct AppState {
    pub pg_pool: Pool,
}

/// The pool hands out connections lazily, so reachability is checked once at
/// startup before the server binds. Requests themselves never retry.
async fn wait_for_db(pool: &Pool) -> anyhow::Result<()> {
    for attempt in 1..=DB_CONN_CHECKS_COUNT {
        match ping_db(pool).await {
            Ok(()) => return Ok(()),
            Err(e) => warn!(
                "database accessibility check failure ({}/{}): {}",
                attempt, DB_CONN_CHECKS_COUNT, e
            ),
        }
        if attempt < DB_CONN_CHECKS_COUNT {
            tokio::time::sleep(DB_CONN_CHECK_TIMEOUT).await;
        }
    }
    anyhow::bail!("database connection check timeout")
}

async fn ping_db(pool: &Pool) -> anyhow::Result<()> {
    let client = pool.get().await?;
    client.simple_query("SELECT 1;").await?;
    Ok(())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    dotenv::dotenv().ok();

    let pg_pool = match config::get_pg_pool() {
        Ok(p) => p,
        Err(e) => {
            error!("failed to create PG pool: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = wait_for_db(&pg_pool).await {
        error!("{}", e);
        std::process::exit(1);
    }

    let state = web::Data::new(AppState { pg_pool });

    let allowed_origins = env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".into());

    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_address = format!("0.0.0.0:{}", port);
    info!("starting server on {}", bind_address);

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec!["content-type", "accept"])
            .max_age(3600);

        for origin in allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
        {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .service(create_post) // POST /posts
            .service(list_posts) // GET /posts
    })
    .bind(&bind_address)?
    .run()
    .await
}
