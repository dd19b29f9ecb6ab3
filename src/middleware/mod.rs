//! Payment gate middleware
//!
//! This module puts x402 payment protection in front of HTTP handlers.
//!
//! # Architecture
//!
//! - [`config`] - Priced routes, recipient and facilitator bindings
//! - [`payment`] - The gate state machine and the axum middleware function
//! - [`service`] - Tower service layer for framework integration
//!
//! # Examples
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use x402_gate::middleware::{payment_middleware, GateConfig, PaymentGate};
//! use x402_gate::types::{FacilitatorBinding, PaymentOption};
//!
//! # fn example() -> x402_gate::Result<()> {
//! let config = GateConfig::new(
//!     "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
//!     FacilitatorBinding::standard("https://x402.org/facilitator"),
//! )
//! .with_route(
//!     "/premium",
//!     vec![PaymentOption::new(
//!         "0.1",
//!         84532,
//!         "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
//!         "base-sepolia",
//!     )],
//! );
//!
//! let gate = PaymentGate::new(config)?;
//! let app: Router = Router::new()
//!     .route("/premium", get(|| async { "Premium content" }))
//!     .layer(axum::middleware::from_fn_with_state(gate, payment_middleware));
//! # Ok(())
//! # }
//! ```
//!
//! # Payment Flow
//!
//! 1. Request to a priced path without `X-Payment` → 402 with every accepted option
//! 2. `X-Payment` present → decode, pick the option by `network`, verify
//! 3. Payment valid → run the handler, holding its response
//! 4. Handler succeeded → settle; release the response with `X-PAYMENT-RESPONSE`
//! 5. Settlement failed → 402, the handler's response is never sent

pub mod config;
pub mod payment;
pub mod service;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::{select_option, GateConfig};
pub use payment::{
    payment_middleware, resource_url, DeferredResponse, GateOutcome, PaymentGate,
};
pub use service::{PaymentService, PaymentServiceLayer};
