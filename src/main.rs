// src/main.rs
mod auth;
mod database;
mod dtos;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;

use axum::{routing::get, Router};
use dotenvy::dotenv;
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::fmt::init as tracing_init;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_init();

    // Load environment variables
    dotenv().ok();

    // Create database pool and apply migrations
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db_pool = database::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");
    database::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    // Create application state (services built once, passed explicitly)
    let app_state = state::AppState::new(db_pool);

    // Build application under the /api base path
    let api = routes::create_router()
        .route("/", get(|| async { "Back-office POS API" }))
        .route("/health", get(health_check));

    let app = Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server with HOST/PORT env and graceful port selection
    let host_str = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let host: IpAddr = host_str.parse().unwrap_or_else(|_| "127.0.0.1".parse().unwrap());
    let base_port = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()).unwrap_or(3000);

    // Try base_port..base_port+20 to avoid crash when address is in use
    let listener = {
        let mut bound = None;
        for offset in 0u16..=20 {
            let port = base_port.saturating_add(offset);
            let addr = SocketAddr::from((host, port));
            match TcpListener::bind(addr).await {
                Ok(l) => {
                    bound = Some((l, addr));
                    break;
                }
                Err(e) => {
                    if offset == 0 {
                        tracing::warn!(%addr, error = %e, "Port in use, trying next");
                    }
                }
            }
        }
        match bound {
            Some((l, addr)) => {
                tracing::info!("Server running on {}", addr);
                l
            }
            None => {
                tracing::error!("Failed to bind to any port starting at {} on {}", base_port, host);
                return;
            }
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
    }
}

async fn health_check() -> &'static str {
    "OK"
}
