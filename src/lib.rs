//! # x402 payment gate
//!
//! Server-side x402 payment protection for HTTP handlers: priced routes answer
//! `402 Payment Required` with the accepted payment options, paid requests are
//! verified by a facilitator before the handler runs, and the handler's response
//! is only released once the payment has settled.
//!
//! ## Features
//!
//! - **Multi-network routes**: every route lists one or more payment options, the
//!   client's `network` field picks one
//! - **Two facilitator protocols**: plain JSON facilitators and HMAC-signed
//!   facilitator APIs, chosen per network
//! - **Settle-before-release**: a failed settlement replaces the handler's
//!   response with a 402, so unpaid content never reaches the caller
//! - **Failure passthrough**: handler errors are returned as-is and never settled
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use axum::{response::Json, routing::get, Router};
//! use x402_gate::middleware::{payment_middleware, GateConfig, PaymentGate};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GateConfig::from_file("gate.json")?;
//!     let gate = PaymentGate::new(config)?;
//!
//!     let app = Router::new()
//!         .route("/premium", get(premium_handler))
//!         .layer(axum::middleware::from_fn_with_state(gate, payment_middleware));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:4021").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//!
//! async fn premium_handler() -> Json<serde_json::Value> {
//!     Json(serde_json::json!({ "data": "premium content" }))
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`types`**: payment options, wire requirements, claims, facilitator envelopes
//! - **`facilitator`**: the [`facilitator::Facilitator`] trait and its two variants
//! - **`middleware`**: gate configuration, the gate state machine, axum and tower glue
//! - **`crypto`**: HMAC request signing for signed facilitators
//! - **`error`**: the error taxonomy and its HTTP mapping

pub mod crypto;
pub mod error;
pub mod facilitator;
pub mod types;

#[cfg(feature = "axum")]
pub mod middleware;

// Re-exports for convenience
pub use error::{Result, X402Error};
pub use types::*;

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
