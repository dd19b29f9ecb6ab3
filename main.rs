//! X402 Gate Server
//!
//! Demo server that puts a payment gate in front of a premium route.
//!
//! ## Environment
//!
//! - `X402_GATE_CONFIG`: path to the JSON gate config (default: `gate.json`)
//! - `BIND_ADDR`: server bind address (default: `0.0.0.0:4021`)
//! - `RUST_LOG`: log filter (default: `info`)
//! - `OKX_API_KEY`, `OKX_SECRET_KEY`, `OKX_PASSPHRASE`, `OKX_PROJECT_ID`:
//!   credentials for signed facilitators the config file leaves without them

use axum::{response::Json, routing::get, Router};
use std::env;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use x402_gate::{
    middleware::{payment_middleware, GateConfig, PaymentGate},
    X402_VERSION,
};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = env::var("X402_GATE_CONFIG").unwrap_or_else(|_| "gate.json".to_string());
    let bind_address = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:4021".to_string());

    let config = GateConfig::from_file(&config_path)?;
    if !config.routes.contains_key("/premium") {
        tracing::warn!(config = %config_path, "/premium is not priced; it will be served for free");
    }
    let gate = PaymentGate::new(config)?;

    let app = Router::new()
        .route("/premium", get(premium_handler))
        .route("/health", get(health_handler))
        .layer(axum::middleware::from_fn_with_state(gate, payment_middleware))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %bind_address, "X402 gate server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Protected content
async fn premium_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "data": "premium content",
    }))
}

/// Health check endpoint
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": x402_gate::VERSION,
        "x402_version": X402_VERSION,
    }))
}
