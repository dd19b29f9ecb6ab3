//! Cryptographic utilities for facilitator authentication
//!
//! # Architecture
//!
//! - [`hmac`] - HMAC-SHA256 request signing for the signed facilitator API
//!
//! # Examples
//!
//! ```
//! use x402_gate::crypto::hmac;
//!
//! # fn example() -> x402_gate::Result<()> {
//! let timestamp = hmac::format_timestamp(chrono::Utc::now());
//! let signature = hmac::sign_request(
//!     "secret_key",
//!     &timestamp,
//!     "POST",
//!     "/api/v6/x402/verify",
//!     r#"{"x402Version":1}"#,
//! )?;
//! println!("OK-ACCESS-SIGN: {}", signature);
//! # Ok(())
//! # }
//! ```

pub mod hmac;

pub use self::hmac::{format_timestamp, sign_request};
