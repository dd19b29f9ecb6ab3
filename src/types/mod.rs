//! Core types for the payment gate
//!
//! # Architecture
//!
//! The types module is organized as follows:
//! - [`amount`] - Decimal price to minor-unit conversion
//! - [`payment`] - Payment options, wire requirements and the 402 body
//! - [`claim`] - Decoding of the inbound `X-Payment` claim
//! - [`facilitator`] - Facilitator bindings, envelopes and results
//! - [`constants`] - Protocol constants (headers, schemes, timeouts)
//!
//! # Examples
//!
//! ```
//! use x402_gate::types::PaymentOption;
//!
//! # fn example() -> x402_gate::Result<()> {
//! let option = PaymentOption::new(
//!     "0.1",                                          // price
//!     196,                                            // chain id
//!     "0x74b7f16337b8972027f6196a17a631ac6de26d22",   // token contract
//!     "xlayer",                                       // network
//! )
//! .with_description("Premium API access");
//!
//! let requirements = option.challenge_requirements("https://api.example.com/premium", "0xpayee")?;
//! assert_eq!(requirements.max_amount_required, "100000");
//! # Ok(())
//! # }
//! ```

pub mod amount;
pub mod claim;
pub mod constants;
pub mod facilitator;
pub mod payment;

// Re-export commonly used types
pub use amount::{to_minor_units, USDC_DECIMALS};
pub use claim::PaymentClaim;
pub use constants::{headers, schemes};
pub use facilitator::{
    FacilitatorBinding, FacilitatorBindings, FacilitatorEnvelope, FacilitatorKind,
    SettleResponse, SettleResult, SignedCredentials, SignedResponse, VerifyResponse,
    VerifyResult,
};
pub use payment::{
    PaymentOption, PaymentRequirements, PaymentRequirementsResponse, SettlementReceipt,
    TokenDomain, X402_VERSION,
};
