//! Facilitator clients for payment verification and settlement
//!
//! A facilitator verifies payment claims and settles them on-chain on behalf of
//! the gate. Two protocol variants are supported, each as one implementation of
//! the [`Facilitator`] trait:
//!
//! - [`standard`] - plain JSON `POST {url}/verify` and `POST {url}/settle`
//! - [`signed`] - `POST {url}/api/v6/x402/verify|settle`, authenticated with
//!   HMAC-SHA256 request signatures
//!
//! Each variant also owns the shape of the envelope it is sent, so adding a
//! variant never touches the gate.
//!
//! # Examples
//!
//! ```no_run
//! use x402_gate::facilitator::FacilitatorRegistry;
//! use x402_gate::types::{FacilitatorBinding, FacilitatorBindings};
//!
//! # fn example() -> x402_gate::Result<()> {
//! let bindings = FacilitatorBindings::from(FacilitatorBinding::standard(
//!     "https://x402.org/facilitator",
//! ));
//! let registry = FacilitatorRegistry::from_bindings(&bindings)?;
//! let facilitator = registry.resolve("base-sepolia")?;
//! println!("Using {:?}", facilitator);
//! # Ok(())
//! # }
//! ```

use crate::types::{
    FacilitatorBinding, FacilitatorBindings, FacilitatorEnvelope, FacilitatorKind,
    PaymentClaim, PaymentOption, PaymentRequirements, SettleResult, VerifyResult,
};
use crate::{Result, X402Error};
use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub mod signed;
pub mod standard;


pub use signed::SignedFacilitator;
pub use standard::StandardFacilitator;

/// A facilitator protocol variant
#[async_trait::async_trait]
pub trait Facilitator: std::fmt::Debug + Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Shape the verify/settle request body for this variant
    fn build_envelope(
        &self,
        claim: &PaymentClaim,
        option: &PaymentOption,
        requirements: PaymentRequirements,
    ) -> FacilitatorEnvelope;

    /// Verify a payment without executing it
    async fn verify(&self, envelope: &FacilitatorEnvelope) -> Result<VerifyResult>;

    /// Settle a verified payment
    async fn settle(&self, envelope: &FacilitatorEnvelope) -> Result<SettleResult>;
}

impl FacilitatorBinding {
    /// Build the facilitator client for this binding
    pub fn connect(&self) -> Result<Arc<dyn Facilitator>> {
        self.validate()?;

        let facilitator: Arc<dyn Facilitator> = match self.kind {
            FacilitatorKind::Standard => {
                Arc::new(StandardFacilitator::new(&self.url, self.timeout())?)
            }
            FacilitatorKind::Signed => {
                let credentials = self.credentials.clone().ok_or_else(|| {
                    X402Error::config(format!(
                        "Signed facilitator {} requires credentials",
                        self.url
                    ))
                })?;
                Arc::new(SignedFacilitator::new(&self.url, credentials, self.timeout())?)
            }
        };

        Ok(facilitator)
    }
}

/// Facilitators resolved from configuration, shared read-only across requests
#[derive(Debug, Clone)]
pub enum FacilitatorRegistry {
    /// One facilitator for every network
    Single(Arc<dyn Facilitator>),
    /// One facilitator per network
    PerNetwork(HashMap<String, Arc<dyn Facilitator>>),
}

impl FacilitatorRegistry {
    /// Connect every configured binding
    pub fn from_bindings(bindings: &FacilitatorBindings) -> Result<Self> {
        match bindings {
            FacilitatorBindings::Single(binding) => Ok(Self::Single(binding.connect()?)),
            FacilitatorBindings::PerNetwork(map) => {
                let mut facilitators = HashMap::with_capacity(map.len());
                for (network, binding) in map {
                    facilitators.insert(network.clone(), binding.connect()?);
                }
                Ok(Self::PerNetwork(facilitators))
            }
        }
    }

    /// Use the same facilitator for every network
    pub fn single(facilitator: Arc<dyn Facilitator>) -> Self {
        Self::Single(facilitator)
    }

    /// Resolve the facilitator for a network
    pub fn resolve(&self, network: &str) -> Result<Arc<dyn Facilitator>> {
        match self {
            Self::Single(facilitator) => Ok(facilitator.clone()),
            Self::PerNetwork(map) => map.get(network).cloned().ok_or_else(|| {
                X402Error::config(format!("No facilitator configured for network {}", network))
            }),
        }
    }
}

/// Build the shared HTTP client
pub(crate) fn http_client(timeout: Option<Duration>) -> Result<Client> {
    let mut client_builder = Client::builder();

    if let Some(timeout) = timeout {
        client_builder = client_builder.timeout(timeout);
    }

    client_builder
        .build()
        .map_err(|e| X402Error::config(format!("Failed to create HTTP client: {}", e)))
}

/// Send a facilitator request and parse its JSON response.
///
/// Transport failures become `FacilitatorUnreachable`; non-2xx statuses and
/// unparseable bodies become `FacilitatorRejected` with the raw body attached.
pub(crate) async fn send_json<T>(request: RequestBuilder, endpoint: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let response = request.send().await.map_err(|e| {
        tracing::error!(endpoint, error = %e, "Facilitator request failed");
        X402Error::facilitator_unreachable(format!("{}: {}", endpoint, e))
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        X402Error::facilitator_unreachable(format!("{}: failed to read response: {}", endpoint, e))
    })?;

    if !status.is_success() {
        tracing::error!(
            endpoint,
            status = status.as_u16(),
            response_body = %body,
            "Facilitator returned an error status"
        );
        return Err(X402Error::facilitator_rejected(status.as_u16(), body));
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(endpoint, error = %e, response_body = %body, "Unreadable facilitator response");
        X402Error::facilitator_rejected(status.as_u16(), body)
    })
}
