//! HMAC-authenticated facilitator

use super::{http_client, send_json, Facilitator};
use crate::crypto::hmac;
use crate::types::constants::{headers, SIGNED_API_PREFIX};
use crate::types::{
    FacilitatorEnvelope, PaymentClaim, PaymentOption, PaymentRequirements, SettleResponse,
    SettleResult, SignedCredentials, SignedResponse, VerifyResponse, VerifyResult,
};
use crate::Result;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;

/// Facilitator behind the signed API: every call carries an access key, a
/// passphrase and an HMAC-SHA256 signature over `timestamp + method + path + body`.
#[derive(Clone)]
pub struct SignedFacilitator {
    url: String,
    client: Client,
    credentials: SignedCredentials,
    clock: fn() -> DateTime<Utc>,
}

impl std::fmt::Debug for SignedFacilitator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedFacilitator")
            .field("url", &self.url)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl SignedFacilitator {
    /// Create a new signed facilitator client
    pub fn new(
        url: impl Into<String>,
        credentials: SignedCredentials,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let url = url.into().trim_end_matches('/').to_string();
        Ok(Self {
            url,
            client: http_client(timeout)?,
            credentials,
            clock: Utc::now,
        })
    }

    /// Replace the clock used for request timestamps
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Get the base URL of this facilitator
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Authentication headers for one request
    pub fn auth_headers(&self, request_path: &str, body: &str) -> Result<Vec<(&'static str, String)>> {
        let timestamp = hmac::format_timestamp((self.clock)());
        let signature = hmac::sign_request(
            &self.credentials.secret_key,
            &timestamp,
            "POST",
            request_path,
            body,
        )?;

        let mut auth = vec![
            (headers::OK_ACCESS_KEY, self.credentials.api_key.clone()),
            (headers::OK_ACCESS_SIGN, signature),
            (headers::OK_ACCESS_TIMESTAMP, timestamp),
            (headers::OK_ACCESS_PASSPHRASE, self.credentials.passphrase.clone()),
        ];
        if let Some(project) = &self.credentials.project {
            auth.push((headers::OK_ACCESS_PROJECT, project.clone()));
        }

        Ok(auth)
    }

    async fn post<T>(&self, action: &str, envelope: &FacilitatorEnvelope) -> Result<SignedResponse<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let request_path = format!("{}/{}", SIGNED_API_PREFIX, action);
        let endpoint = format!("{}{}", self.url, request_path);
        // The signature covers these exact bytes, so serialize once and send them as-is.
        let body = serde_json::to_string(envelope)?;

        tracing::debug!(
            endpoint = %endpoint,
            chain_index = ?envelope.chain_index,
            "Sending signed {} request",
            action
        );

        let mut request = self
            .client
            .post(&endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        for (name, value) in self.auth_headers(&request_path, &body)? {
            request = request.header(name, value);
        }

        send_json(request.body(body), &endpoint).await
    }
}

#[async_trait::async_trait]
impl Facilitator for SignedFacilitator {
    fn name(&self) -> &'static str {
        "signed"
    }

    fn build_envelope(
        &self,
        claim: &PaymentClaim,
        option: &PaymentOption,
        mut requirements: PaymentRequirements,
    ) -> FacilitatorEnvelope {
        // The chain travels only as the top-level chainIndex.
        requirements.network = None;
        let mut envelope = FacilitatorEnvelope::new(claim.without_network(), requirements);
        envelope.chain_index = Some(option.chain_id.to_string());
        envelope
    }

    async fn verify(&self, envelope: &FacilitatorEnvelope) -> Result<VerifyResult> {
        let response: SignedResponse<VerifyResponse> = self.post("verify", envelope).await?;
        Ok(match response.into_data() {
            Ok(data) => data.into(),
            Err(msg) => {
                tracing::warn!(reason = %msg, "Signed facilitator rejected verify");
                VerifyResult::invalid(msg)
            }
        })
    }

    async fn settle(&self, envelope: &FacilitatorEnvelope) -> Result<SettleResult> {
        let response: SignedResponse<SettleResponse> = self.post("settle", envelope).await?;
        Ok(match response.into_data() {
            Ok(data) => data.into(),
            Err(msg) => {
                tracing::warn!(reason = %msg, "Signed facilitator rejected settle");
                SettleResult::failed(msg)
            }
        })
    }
}
