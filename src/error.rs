//! Error types for the payment gate
//!
//! Every failure the gate can surface maps onto one [`X402Error`] variant, and each
//! variant carries its own HTTP status. Handler failures are deliberately absent:
//! the protected handler's own response is passed through untouched.

use http::StatusCode;
use serde_json::json;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, X402Error>;

/// Errors produced while gating a request
#[derive(Debug, thiserror::Error)]
pub enum X402Error {
    /// The `X-Payment` header is not base64 → UTF-8 → JSON object
    #[error("Invalid payment header: {message}")]
    Decode { message: String },

    /// The decoded claim carries no usable `network` selector
    #[error("Payment claim is missing the network field")]
    Selection,

    /// The claim selects a network this route does not accept
    #[error("Unsupported network: {network}")]
    UnsupportedNetwork { network: String },

    /// Operator misconfiguration (no facilitator for a network, bad binding, ...)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Transport-level failure talking to the facilitator
    #[error("Facilitator unreachable: {message}")]
    FacilitatorUnreachable { message: String },

    /// The facilitator answered with a non-2xx status or an unreadable body
    #[error("Facilitator rejected request with status {status}: {body}")]
    FacilitatorRejected { status: u16, body: String },

    /// The facilitator judged the claim invalid
    #[error("Payment verification failed: {reason}")]
    VerificationInvalid { reason: String },

    /// Settlement did not go through
    #[error("Settlement failed: {reason}")]
    SettlementFailed { reason: String },

    /// Anything unexpected; reported as 500 with the raw message
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl X402Error {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn unsupported_network(network: impl Into<String>) -> Self {
        Self::UnsupportedNetwork {
            network: network.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn facilitator_unreachable(message: impl Into<String>) -> Self {
        Self::FacilitatorUnreachable {
            message: message.into(),
        }
    }

    pub fn facilitator_rejected(status: u16, body: impl Into<String>) -> Self {
        Self::FacilitatorRejected {
            status,
            body: body.into(),
        }
    }

    pub fn verification_invalid(reason: impl Into<String>) -> Self {
        Self::VerificationInvalid {
            reason: reason.into(),
        }
    }

    pub fn settlement_failed(reason: impl Into<String>) -> Self {
        Self::SettlementFailed {
            reason: reason.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status this error is surfaced with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Decode { .. } | Self::Selection | Self::UnsupportedNetwork { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Configuration { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::FacilitatorUnreachable { .. }
            | Self::FacilitatorRejected { .. }
            | Self::VerificationInvalid { .. }
            | Self::SettlementFailed { .. } => StatusCode::PAYMENT_REQUIRED,
        }
    }

    /// Short, stable label for the `error` field of response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "Invalid payment header",
            Self::Selection => "Missing network in payment",
            Self::UnsupportedNetwork { .. } => "Unsupported network",
            Self::Configuration { .. } => "Payment gate misconfigured",
            Self::FacilitatorUnreachable { .. } => "Facilitator unreachable",
            Self::FacilitatorRejected { .. } => "Facilitator rejected request",
            Self::VerificationInvalid { .. } => "Payment verification failed",
            Self::SettlementFailed { .. } => "Settlement failed",
            Self::Internal { .. } => "Internal error",
        }
    }

    /// JSON body sent to the caller
    pub fn to_body(&self) -> serde_json::Value {
        json!({
            "x402Version": crate::X402_VERSION,
            "error": self.kind(),
            "details": self.to_string(),
        })
    }

    /// Whether the caller (rather than the operator or facilitator) caused this error
    pub fn is_client_error(&self) -> bool {
        self.status_code() == StatusCode::BAD_REQUEST
    }
}

impl From<serde_json::Error> for X402Error {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", err))
    }
}

impl From<base64::DecodeError> for X402Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::decode(format!("malformed base64: {}", err))
    }
}

impl From<reqwest::Error> for X402Error {
    fn from(err: reqwest::Error) -> Self {
        Self::facilitator_unreachable(err.to_string())
    }
}

impl From<std::io::Error> for X402Error {
    fn from(err: std::io::Error) -> Self {
        Self::config(format!("I/O error: {}", err))
    }
}

#[cfg(feature = "axum")]
impl X402Error {
    /// Render as a JSON response without consuming the error
    pub fn to_response(&self) -> axum::response::Response {
        use axum::response::IntoResponse;
        (self.status_code(), axum::Json(self.to_body())).into_response()
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for X402Error {
    fn into_response(self) -> axum::response::Response {
        self.to_response()
    }
}
