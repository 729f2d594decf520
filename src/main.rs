//! Media Inference Gateway
//!
//! Bridges a REST API to a remote Triton-style model serving endpoint.
//! Serves the person resource routes and checks the serving backend at
//! startup.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use infergate::api::rest::{create_rest_router, AppState};
use infergate::config::Config;
use infergate::service::MemoryRegistry;
use infergate::serving::{parse_model, ServingClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Starting Media Inference Gateway v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load(Config::default_path()).unwrap_or_else(|e| {
        info!("Using default config ({})", e);
        Config::default()
    });

    info!("Configuration loaded:");
    info!("  REST port: {}", config.server.rest_port);
    info!("  Serving endpoint: {}", config.serving.url);
    info!(
        "  Model: {} (version {})",
        config.serving.model_name, config.serving.model_version
    );
    info!("  Batch size: {}", config.serving.batch_size);

    probe_serving_endpoint(&config).await;

    // Wire up the person registry and REST router
    let registry = Arc::new(MemoryRegistry::new());
    let state = Arc::new(AppState { registry });
    let router = create_rest_router(state);

    let rest_port = config.server.rest_port;
    let _rest_handle = tokio::spawn(async move {
        let addr = format!("0.0.0.0:{}", rest_port);
        info!("REST API listening on http://{}", addr);

        let listener = TcpListener::bind(&addr).await.unwrap();
        axum::serve(listener, router).await.unwrap();
    });

    info!("Media Inference Gateway is ready!");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, cleaning up...");

    info!("Goodbye!");
    Ok(())
}

/// Best-effort startup check of the serving endpoint.
///
/// The gateway still serves its REST surface when the backend is down.
async fn probe_serving_endpoint(config: &Config) {
    let mut client = match ServingClient::connect(&config.serving.url, config.serving.verbose).await
    {
        Ok(client) => client,
        Err(e) => {
            warn!("Serving endpoint unreachable: {e}");
            return;
        }
    };

    let description = client
        .model_description(&config.serving.model_name, &config.serving.model_version)
        .await;
    let (metadata, model_config) = match description {
        Ok(description) => description,
        Err(e) => {
            warn!("Model description fetch failed: {e}");
            return;
        }
    };

    match parse_model(&metadata, &model_config) {
        Ok(io) => info!(
            "Model '{}' ready: {} input(s), {} output(s), image dims {:?}, max batch size {}",
            config.serving.model_name,
            io.input_names.len(),
            io.output_names.len(),
            io.image_dims,
            io.max_batch_size
        ),
        Err(e) => warn!("Model description not usable: {e}"),
    }
}
