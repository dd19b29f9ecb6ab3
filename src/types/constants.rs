//! Protocol constants: headers, schemes, timeouts, facilitator paths

/// Header names used by the 402 flow
pub mod headers {
    /// Inbound payment claim
    pub const X_PAYMENT: &str = "X-Payment";
    /// Outbound settlement receipt
    pub const X_PAYMENT_RESPONSE: &str = "X-PAYMENT-RESPONSE";
    /// Proxy-supplied request scheme
    pub const X_FORWARDED_PROTO: &str = "X-Forwarded-Proto";

    pub const OK_ACCESS_KEY: &str = "OK-ACCESS-KEY";
    pub const OK_ACCESS_SIGN: &str = "OK-ACCESS-SIGN";
    pub const OK_ACCESS_TIMESTAMP: &str = "OK-ACCESS-TIMESTAMP";
    pub const OK_ACCESS_PASSPHRASE: &str = "OK-ACCESS-PASSPHRASE";
    pub const OK_ACCESS_PROJECT: &str = "OK-ACCESS-PROJECT";
}

/// Common payment schemes
pub mod schemes {
    /// Exact payment scheme (EIP-3009)
    pub const EXACT: &str = "exact";
}

/// `maxTimeoutSeconds` advertised in a 402 challenge
pub const CHALLENGE_MAX_TIMEOUT_SECONDS: u32 = 180;

/// `maxTimeoutSeconds` sent to the facilitator for verify and settle
pub const ENFORCED_MAX_TIMEOUT_SECONDS: u32 = 60;

/// Route prefix of the signed facilitator API
pub const SIGNED_API_PREFIX: &str = "/api/v6/x402";

/// Success code in signed facilitator responses
pub const SIGNED_OK_CODE: &str = "0";
