//! Inbound payment claim decoding

use crate::{Result, X402Error};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{Map, Value};

/// Client-supplied payment claim, untrusted until a facilitator verifies it
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentClaim {
    network: String,
    body: Map<String, Value>,
}

impl PaymentClaim {
    /// Decode the `X-Payment` header value: base64, then UTF-8, then a JSON object
    /// with a non-empty string `network`.
    pub fn decode(header: &str) -> Result<Self> {
        let bytes = general_purpose::STANDARD.decode(header.trim())?;
        let text = String::from_utf8(bytes)
            .map_err(|e| X402Error::decode(format!("payload is not UTF-8: {}", e)))?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| X402Error::decode(format!("payload is not JSON: {}", e)))?;

        let Value::Object(body) = value else {
            return Err(X402Error::decode("payload is not a JSON object"));
        };

        let network = match body.get("network") {
            Some(Value::String(network)) if !network.is_empty() => network.clone(),
            _ => return Err(X402Error::Selection),
        };

        Ok(Self { network, body })
    }

    /// The network this claim selects
    pub fn network(&self) -> &str {
        &self.network
    }

    /// The claim as sent by the client
    pub fn as_json(&self) -> &Map<String, Value> {
        &self.body
    }

    /// The claim with its `network` selector removed
    pub fn without_network(&self) -> Map<String, Value> {
        let mut body = self.body.clone();
        body.remove("network");
        body
    }
}
