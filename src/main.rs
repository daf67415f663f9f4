//! # WhatsApp Bridge
//!
//! HTTP bridge exposing WhatsApp sessions owned by an automation driver.
//! Configures SSL, middleware, the session registry and route handling.

#![recursion_limit = "256"]

pub mod api;
pub mod config;
pub mod metric;
pub mod server;
pub mod session;

use anyhow::Context;
use logfire::config::MetricsOptions;
use ntex::web;
use ntex_cors::Cors;
use openssl::ssl::{SslAcceptor, SslFiletype, SslMethod};
use std::sync::Arc;

#[ntex::main]
async fn main() -> anyhow::Result<()> {
    // Initialize configuration
    config::init_config()?;

    // Initialize logging and metrics
    let shutdown_handler = logfire::configure()
        .install_panic_handler()
        .with_metrics(Some(MetricsOptions::default()))
        .send_to_logfire(logfire::config::SendToLogfire::IfTokenPresent)
        .finish()?;

    let app_state = create_app_state()?;
    logfire::info!(
        "Registered sessions: {sessions}",
        sessions = app_state.registry.names().join(",")
    );

    configure_and_run_server(app_state).await?;

    shutdown_handler.shutdown()?;

    Ok(())
}

/// Configures SSL acceptor for production environments
fn setup_ssl_acceptor() -> anyhow::Result<openssl::ssl::SslAcceptorBuilder> {
    let mut ssl_acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls_server())
        .map_err(|e| anyhow::anyhow!("Failed to create SSL acceptor: {}", e))?;

    let app_config = config::APP_CONFIG
        .get()
        .context("failed to get app config")?;
    ssl_acceptor
        .set_private_key_file(&app_config.private_key_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load private key from {}: {}",
                app_config.private_key_path,
                e
            )
        })?;

    ssl_acceptor
        .set_certificate_file(&app_config.certificate_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load certificate from {}: {}",
                app_config.certificate_path,
                e
            )
        })?;

    Ok(ssl_acceptor)
}

/// Registers a driver-backed handle for every configured session
fn create_app_state() -> anyhow::Result<server::AppState> {
    let app_config = config::APP_CONFIG
        .get()
        .context("failed to get app config")?;

    let client = reqwest::Client::new();
    let registry = session::InMemorySessionRegistry::new();
    for name in app_config.session_names() {
        let driver_session = session::driver::DriverSession::from_config(client.clone(), &name)?;
        registry.insert(name, Arc::new(driver_session));
    }

    Ok(server::AppState::new(
        Arc::new(registry),
        app_config.secret_key.clone(),
        app_config.is_dev(),
    ))
}

/// Configures and starts the web server with appropriate SSL settings
async fn configure_and_run_server(app_state: server::AppState) -> anyhow::Result<()> {
    let app_config = config::APP_CONFIG
        .get()
        .context("failed to get app config")?;
    let server_addr = (app_config.server_host.clone(), app_config.server_port);
    let max_body_bytes = app_config.max_body_bytes;

    let server = web::server(move || {
        web::App::new()
            .wrap(
                Cors::new()
                    .allowed_methods(vec!["GET", "HEAD", "POST", "OPTIONS"])
                    .finish(),
            )
            .wrap(web::middleware::Logger::default())
            .wrap(web::middleware::Compress::default())
            .state(app_state.clone())
            .state(web::types::PayloadConfig::new(max_body_bytes))
            .configure(server::routes::admin)
            .configure(server::routes::session_operations)
            .default_service(web::route().to(server::errors::serve_not_found))
    });

    let bound_server = if app_config.is_prod() {
        let ssl_acceptor = setup_ssl_acceptor()?;
        server.bind_openssl(server_addr, ssl_acceptor)?
    } else {
        server.bind(server_addr)?
    };

    bound_server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
