//! Payment-related types

use super::amount::to_minor_units;
use super::constants::{schemes, CHALLENGE_MAX_TIMEOUT_SECONDS, ENFORCED_MAX_TIMEOUT_SECONDS};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// x402 protocol version
pub const X402_VERSION: u32 = 1;

/// A payment method offered for a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOption {
    /// Decimal price in token units (e.g. "0.1")
    pub price: String,
    /// Numeric chain identifier
    pub chain_id: u64,
    /// Token contract address
    pub token: String,
    /// EIP-712 domain name of the token
    pub usdc_name: String,
    /// EIP-712 domain version of the token
    pub usdc_version: String,
    /// Network identifier; unique among the options of one route
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Recipient for this option only; the gate-wide recipient is used otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pay_to: Option<String>,
}

impl PaymentOption {
    /// Create a new payment option
    pub fn new(
        price: impl Into<String>,
        chain_id: u64,
        token: impl Into<String>,
        network: impl Into<String>,
    ) -> Self {
        Self {
            price: price.into(),
            chain_id,
            token: token.into(),
            usdc_name: "USD Coin".to_string(),
            usdc_version: "2".to_string(),
            network: network.into(),
            description: None,
            metadata: None,
            pay_to: None,
        }
    }

    /// Set the token's EIP-712 domain name and version
    pub fn with_token_domain(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.usdc_name = name.into();
        self.usdc_version = version.into();
        self
    }

    /// Set the payment description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach free-form metadata advertised in the challenge
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Override the recipient for this option
    pub fn with_pay_to(mut self, pay_to: impl Into<String>) -> Self {
        self.pay_to = Some(pay_to.into());
        self
    }

    fn base_requirements(
        &self,
        resource: &str,
        default_pay_to: &str,
        max_timeout_seconds: u32,
    ) -> crate::Result<PaymentRequirements> {
        Ok(PaymentRequirements {
            scheme: schemes::EXACT.to_string(),
            network: Some(self.network.clone()),
            max_amount_required: to_minor_units(&self.price)?,
            resource: resource.to_string(),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| "Payment required".to_string()),
            mime_type: None,
            pay_to: self
                .pay_to
                .clone()
                .unwrap_or_else(|| default_pay_to.to_string()),
            max_timeout_seconds,
            asset: self.token.clone(),
            output_schema: None,
            extra: TokenDomain {
                name: self.usdc_name.clone(),
                version: self.usdc_version.clone(),
                metadata: None,
            },
        })
    }

    /// Requirements as advertised in a 402 challenge
    pub fn challenge_requirements(
        &self,
        resource: &str,
        default_pay_to: &str,
    ) -> crate::Result<PaymentRequirements> {
        let mut requirements =
            self.base_requirements(resource, default_pay_to, CHALLENGE_MAX_TIMEOUT_SECONDS)?;
        requirements.mime_type = Some(String::new());
        requirements.output_schema = Some(Value::Object(Map::new()));
        requirements.extra.metadata = self.metadata.clone();
        Ok(requirements)
    }

    /// Requirements sent to the facilitator for verify and settle.
    ///
    /// `extra` carries exactly the token domain name and version, and `network` is
    /// left for the facilitator variant to keep or drop.
    pub fn enforced_requirements(
        &self,
        resource: &str,
        default_pay_to: &str,
    ) -> crate::Result<PaymentRequirements> {
        self.base_requirements(resource, default_pay_to, ENFORCED_MAX_TIMEOUT_SECONDS)
    }
}

/// Token EIP-712 domain echoed in `extra`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDomain {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Payment requirements for a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequirements {
    /// Payment scheme identifier (always "exact")
    pub scheme: String,
    /// Network identifier; absent when the chain travels as `chainIndex`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Required payment amount in minor units
    #[serde(rename = "maxAmountRequired")]
    pub max_amount_required: String,
    /// URL of the protected resource
    pub resource: String,
    /// Human-readable description of the resource
    pub description: String,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Recipient wallet address for the payment
    #[serde(rename = "payTo")]
    pub pay_to: String,
    /// Maximum time allowed for payment completion in seconds
    #[serde(rename = "maxTimeoutSeconds")]
    pub max_timeout_seconds: u32,
    /// Token contract address
    pub asset: String,
    #[serde(rename = "outputSchema", skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    pub extra: TokenDomain,
}

/// Payment requirements response (HTTP 402 body)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequirementsResponse {
    /// Protocol version
    #[serde(rename = "x402Version")]
    pub x402_version: u32,
    /// Human-readable error message
    pub error: String,
    /// Array of acceptable payment methods
    pub accepts: Vec<PaymentRequirements>,
}

impl PaymentRequirementsResponse {
    /// Create a new payment requirements response
    pub fn new(error: impl Into<String>, accepts: Vec<PaymentRequirements>) -> Self {
        Self {
            x402_version: X402_VERSION,
            error: error.into(),
            accepts,
        }
    }
}

/// Body of the `X-PAYMENT-RESPONSE` header after a successful settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    pub settled: bool,
    pub tx_hash: Option<String>,
}

impl SettlementReceipt {
    pub fn settled(tx_hash: Option<String>) -> Self {
        Self {
            settled: true,
            tx_hash,
        }
    }

    /// Encode the receipt to base64
    pub fn to_base64(&self) -> crate::Result<String> {
        use base64::{engine::general_purpose, Engine as _};
        let json = serde_json::to_string(self)?;
        Ok(general_purpose::STANDARD.encode(json))
    }
}
