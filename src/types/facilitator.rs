//! Facilitator configuration and response types

use super::payment::{PaymentRequirements, X402_VERSION};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Facilitator protocol variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacilitatorKind {
    /// Plain JSON `POST {url}/verify|settle`
    Standard,
    /// HMAC-authenticated `POST {url}/api/v6/x402/verify|settle`
    Signed,
}

/// API credentials for the signed facilitator variant
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedCredentials {
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl std::fmt::Debug for SignedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedCredentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .field("project", &self.project)
            .finish()
    }
}

impl SignedCredentials {
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            passphrase: passphrase.into(),
            project: None,
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Load credentials from `OKX_API_KEY`, `OKX_SECRET_KEY`, `OKX_PASSPHRASE`
    /// and the optional `OKX_PROJECT_ID`
    pub fn from_env() -> crate::Result<Self> {
        let api_key = env::var("OKX_API_KEY").unwrap_or_default();
        let secret_key = env::var("OKX_SECRET_KEY").unwrap_or_default();
        let passphrase = env::var("OKX_PASSPHRASE").unwrap_or_default();

        if api_key.is_empty() || secret_key.is_empty() || passphrase.is_empty() {
            return Err(crate::X402Error::config(
                "Missing credentials: OKX_API_KEY, OKX_SECRET_KEY and OKX_PASSPHRASE must be set",
            ));
        }

        let project = env::var("OKX_PROJECT_ID").ok().filter(|p| !p.is_empty());

        Ok(Self {
            api_key,
            secret_key,
            passphrase,
            project,
        })
    }
}

/// How to reach the facilitator for a network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorBinding {
    /// Base URL of the facilitator service
    pub url: String,
    #[serde(rename = "type")]
    pub kind: FacilitatorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<SignedCredentials>,
    /// Transport timeout for facilitator calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl FacilitatorBinding {
    /// Binding to a plain JSON facilitator
    pub fn standard(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: FacilitatorKind::Standard,
            credentials: None,
            timeout_seconds: None,
        }
    }

    /// Binding to an HMAC-authenticated facilitator
    pub fn signed(url: impl Into<String>, credentials: SignedCredentials) -> Self {
        Self {
            url: url.into(),
            kind: FacilitatorKind::Signed,
            credentials: Some(credentials),
            timeout_seconds: None,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_seconds = Some(timeout.as_secs());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    /// Validate the binding
    pub fn validate(&self) -> crate::Result<()> {
        if self.url.is_empty() {
            return Err(crate::X402Error::config("Facilitator URL cannot be empty"));
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(crate::X402Error::config(
                "Facilitator URL must start with http:// or https://",
            ));
        }

        url::Url::parse(&self.url).map_err(|e| {
            crate::X402Error::config(format!("Invalid facilitator URL {}: {}", self.url, e))
        })?;

        if self.kind == FacilitatorKind::Signed && self.credentials.is_none() {
            return Err(crate::X402Error::config(format!(
                "Signed facilitator {} requires credentials",
                self.url
            )));
        }

        Ok(())
    }
}

/// Facilitator bindings: one for every network, or one per network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacilitatorBindings {
    Single(FacilitatorBinding),
    PerNetwork(HashMap<String, FacilitatorBinding>),
}

impl FacilitatorBindings {
    /// Iterate over every binding, with its network when per-network
    pub fn iter(&self) -> Box<dyn Iterator<Item = (Option<&str>, &FacilitatorBinding)> + '_> {
        match self {
            Self::Single(binding) => Box::new(std::iter::once((None, binding))),
            Self::PerNetwork(map) => Box::new(
                map.iter()
                    .map(|(network, binding)| (Some(network.as_str()), binding)),
            ),
        }
    }

    /// Fill in missing signed credentials from the environment
    pub fn load_env_credentials(&mut self) -> crate::Result<()> {
        let bindings: Vec<&mut FacilitatorBinding> = match self {
            Self::Single(binding) => vec![binding],
            Self::PerNetwork(map) => map.values_mut().collect(),
        };

        for binding in bindings {
            if binding.kind == FacilitatorKind::Signed && binding.credentials.is_none() {
                binding.credentials = Some(SignedCredentials::from_env()?);
            }
        }

        Ok(())
    }
}

impl From<FacilitatorBinding> for FacilitatorBindings {
    fn from(binding: FacilitatorBinding) -> Self {
        Self::Single(binding)
    }
}

/// Request body sent to a facilitator's verify and settle endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorEnvelope {
    pub x402_version: u32,
    pub payment_payload: Map<String, Value>,
    pub payment_requirements: PaymentRequirements,
    /// Stringified chain id; set only by the signed variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_index: Option<String>,
}

impl FacilitatorEnvelope {
    pub fn new(
        payment_payload: Map<String, Value>,
        payment_requirements: PaymentRequirements,
    ) -> Self {
        Self {
            x402_version: X402_VERSION,
            payment_payload,
            payment_requirements,
            chain_index: None,
        }
    }
}

/// Payment verification result, common to all facilitator variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    pub valid: bool,
    pub reason: Option<String>,
}

impl VerifyResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Payment settlement result, common to all facilitator variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleResult {
    pub success: bool,
    pub tx_hash: Option<String>,
    pub reason: Option<String>,
}

impl SettleResult {
    pub fn settled(tx_hash: impl Into<String>) -> Self {
        Self {
            success: true,
            tx_hash: Some(tx_hash.into()),
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            tx_hash: None,
            reason: Some(reason.into()),
        }
    }
}

/// Verify response of the standard variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    #[serde(rename = "invalidReason", default, skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
}

impl From<VerifyResponse> for VerifyResult {
    fn from(response: VerifyResponse) -> Self {
        Self {
            valid: response.is_valid,
            reason: response.invalid_reason,
        }
    }
}

/// Settle response of the standard variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleResponse {
    pub success: bool,
    #[serde(rename = "txHash", alias = "transaction", default)]
    pub tx_hash: Option<String>,
    #[serde(rename = "errorReason", default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl From<SettleResponse> for SettleResult {
    fn from(response: SettleResponse) -> Self {
        Self {
            success: response.success,
            tx_hash: response.tx_hash.filter(|hash| !hash.is_empty()),
            reason: response.error_reason,
        }
    }
}

/// Response wrapper of the signed variant: `{code, data: [...], msg}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedResponse<T> {
    /// "0" on success; some deployments send it as a number
    pub code: Value,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub msg: String,
}

impl<T> SignedResponse<T> {
    /// The first data entry, or the facilitator's rejection message
    pub fn into_data(self) -> std::result::Result<T, String> {
        let ok = match &self.code {
            Value::String(code) => code == super::constants::SIGNED_OK_CODE,
            Value::Number(code) => code.as_i64() == Some(0),
            _ => false,
        };

        let msg = if self.msg.is_empty() {
            format!("facilitator returned code {}", self.code)
        } else {
            self.msg
        };

        if !ok {
            return Err(msg);
        }

        self.data.into_iter().next().ok_or(msg)
    }
}
