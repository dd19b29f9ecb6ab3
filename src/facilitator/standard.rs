//! Plain JSON facilitator

use super::{http_client, send_json, Facilitator};
use crate::types::{
    FacilitatorEnvelope, PaymentClaim, PaymentOption, PaymentRequirements, SettleResponse,
    SettleResult, VerifyResponse, VerifyResult,
};
use crate::Result;
use reqwest::Client;
use std::time::Duration;

/// Facilitator speaking the plain x402 JSON API without authentication
#[derive(Clone)]
pub struct StandardFacilitator {
    /// Base URL of the facilitator service
    url: String,
    /// HTTP client
    client: Client,
}

impl std::fmt::Debug for StandardFacilitator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardFacilitator")
            .field("url", &self.url)
            .finish()
    }
}

impl StandardFacilitator {
    /// Create a new standard facilitator client
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let url = url.into().trim_end_matches('/').to_string();
        Ok(Self {
            url,
            client: http_client(timeout)?,
        })
    }

    /// Get the base URL of this facilitator
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl Facilitator for StandardFacilitator {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn build_envelope(
        &self,
        claim: &PaymentClaim,
        _option: &PaymentOption,
        requirements: PaymentRequirements,
    ) -> FacilitatorEnvelope {
        // Standard facilitators read the chain from `network` on both halves.
        FacilitatorEnvelope::new(claim.as_json().clone(), requirements)
    }

    async fn verify(&self, envelope: &FacilitatorEnvelope) -> Result<VerifyResult> {
        let endpoint = format!("{}/verify", self.url);
        tracing::debug!(endpoint = %endpoint, "Sending verify request");

        let request = self.client.post(&endpoint).json(envelope);
        let response: VerifyResponse = send_json(request, &endpoint).await?;
        Ok(response.into())
    }

    async fn settle(&self, envelope: &FacilitatorEnvelope) -> Result<SettleResult> {
        let endpoint = format!("{}/settle", self.url);
        tracing::debug!(endpoint = %endpoint, "Sending settle request");

        let request = self.client.post(&endpoint).json(envelope);
        let response: SettleResponse = send_json(request, &endpoint).await?;
        Ok(response.into())
    }
}
