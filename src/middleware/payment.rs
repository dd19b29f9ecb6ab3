//! Payment gate state machine
//!
//! ```text
//! no X-Payment  ─────────────────────────────────────────────► Challenged (402)
//! X-Payment ─► decode ─┬─ fails ─────────────────────────────► Rejected (400)
//!                      └─► verify ─┬─ invalid / error ───────► Rejected (402)
//!                                  └─► run handler (held) ─┬─ status ≥ threshold ─► HandlerFailed (as-is)
//!                                                          └─► settle ─┬─ fails ──► SettlementFailed (402)
//!                                                                      └─ ok ─────► Settled (+ X-PAYMENT-RESPONSE)
//! ```

use super::config::{select_option, GateConfig};
use crate::facilitator::{Facilitator, FacilitatorRegistry};
use crate::types::{
    headers, FacilitatorEnvelope, PaymentClaim, PaymentOption, PaymentRequirements,
    PaymentRequirementsResponse, SettleResult, SettlementReceipt,
};
use crate::{Result, X402Error};
use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;

/// Payment gate shared by every request; configuration is read-only
#[derive(Debug, Clone)]
pub struct PaymentGate {
    config: Arc<GateConfig>,
    facilitators: FacilitatorRegistry,
}

/// Terminal state of one gated request
#[derive(Debug)]
pub enum GateOutcome {
    /// The path is not priced; the handler ran without a gate
    Unprotected { response: Response },
    /// No payment presented; 402 with the accepted options
    Challenged { response: Response },
    /// Decode, selection, configuration or verification failed; the handler never ran
    Rejected { error: X402Error, response: Response },
    /// The handler failed; its response is released unmodified and nothing is settled
    HandlerFailed { response: Response },
    /// Settlement failed; the handler's response was discarded
    SettlementFailed { error: X402Error, response: Response },
    /// Payment settled; the handler's response carries the receipt header
    Settled {
        response: Response,
        settlement: SettleResult,
    },
}

impl GateOutcome {
    /// The response to hand to the transport
    pub fn into_response(self) -> Response {
        match self {
            GateOutcome::Unprotected { response }
            | GateOutcome::Challenged { response }
            | GateOutcome::Rejected { response, .. }
            | GateOutcome::HandlerFailed { response }
            | GateOutcome::SettlementFailed { response, .. }
            | GateOutcome::Settled { response, .. } => response,
        }
    }
}

/// Handler response held back until the settlement outcome is known.
///
/// Only the gate can release it to the transport.
#[derive(Debug)]
pub struct DeferredResponse(Response);

impl DeferredResponse {
    pub fn status(&self) -> StatusCode {
        self.0.status()
    }

    fn release(self) -> Response {
        self.0
    }
}

/// A claim the facilitator accepted, ready for settlement
struct Verified {
    facilitator: Arc<dyn Facilitator>,
    envelope: FacilitatorEnvelope,
    network: String,
}

impl PaymentGate {
    /// Create a gate, connecting a facilitator client for every configured binding
    pub fn new(config: GateConfig) -> Result<Self> {
        config.validate()?;
        let facilitators = FacilitatorRegistry::from_bindings(&config.facilitators)?;
        Ok(Self {
            config: Arc::new(config),
            facilitators,
        })
    }

    /// Create a gate with already-built facilitators
    pub fn with_facilitators(config: GateConfig, facilitators: FacilitatorRegistry) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            facilitators,
        })
    }

    /// Get the gate configuration
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Whether `path` is priced
    pub fn is_protected(&self, path: &str) -> bool {
        self.config.options_for(path).is_some()
    }

    /// Run one request through the gate.
    ///
    /// `handler` is the protected operation. Its response is held until settlement
    /// resolves, so a failed settlement can still replace it.
    pub async fn process_payment<F, Fut>(&self, request: Request, handler: F) -> GateOutcome
    where
        F: FnOnce(Request) -> Fut,
        Fut: Future<Output = Response>,
    {
        let path = request.uri().path().to_string();

        let Some(options) = self.config.options_for(&path) else {
            return GateOutcome::Unprotected {
                response: handler(request).await,
            };
        };

        let resource = resource_url(&request);
        let payment_header = request
            .headers()
            .get(headers::X_PAYMENT)
            .map(|value| value.to_str().map(str::to_string));

        let payment_header = match payment_header {
            None => {
                tracing::info!(path = %path, "No payment header; issuing challenge");
                return GateOutcome::Challenged {
                    response: self.challenge_response(
                        options,
                        &resource,
                        "X-PAYMENT header is required",
                    ),
                };
            }
            Some(Err(_)) => {
                return self.reject(
                    X402Error::decode("header is not visible ASCII"),
                    options,
                    &resource,
                )
            }
            Some(Ok(header)) => header,
        };

        let verified = match self.verify(&payment_header, options, &resource).await {
            Ok(verified) => verified,
            Err(error) => return self.reject(error, options, &resource),
        };

        let held = DeferredResponse(handler(request).await);

        let threshold = self.failure_threshold();
        if held.status().as_u16() >= threshold.as_u16() {
            tracing::warn!(
                path = %path,
                status = held.status().as_u16(),
                "Protected handler failed; payment not settled"
            );
            return GateOutcome::HandlerFailed {
                response: held.release(),
            };
        }

        self.settle(verified, held).await
    }

    /// Decode, select, resolve and verify
    async fn verify(
        &self,
        payment_header: &str,
        options: &[PaymentOption],
        resource: &str,
    ) -> Result<Verified> {
        let claim = PaymentClaim::decode(payment_header)?;
        let option = select_option(options, &claim)?;
        tracing::debug!(network = %option.network, "Decoded payment claim");

        let facilitator = self.facilitators.resolve(&option.network)?;
        let requirements = option.enforced_requirements(resource, &self.config.pay_to)?;
        let envelope = facilitator.build_envelope(&claim, option, requirements);

        tracing::debug!(
            network = %option.network,
            facilitator = facilitator.name(),
            "Verifying payment"
        );
        let verification = facilitator.verify(&envelope).await?;
        if !verification.valid {
            return Err(X402Error::verification_invalid(
                verification
                    .reason
                    .unwrap_or_else(|| "payment is invalid".to_string()),
            ));
        }

        tracing::debug!(network = %option.network, "Payment verified");
        Ok(Verified {
            facilitator,
            envelope,
            network: option.network.clone(),
        })
    }

    /// Settle and decide what happens to the held response
    async fn settle(&self, verified: Verified, held: DeferredResponse) -> GateOutcome {
        tracing::debug!(
            network = %verified.network,
            facilitator = verified.facilitator.name(),
            "Settling payment"
        );

        let failure = match verified.facilitator.settle(&verified.envelope).await {
            Ok(settlement) if settlement.success => {
                return self.release_settled(held, settlement, &verified.network)
            }
            Ok(settlement) => X402Error::settlement_failed(
                settlement
                    .reason
                    .unwrap_or_else(|| "settlement was not successful".to_string()),
            ),
            Err(e) => X402Error::settlement_failed(e.to_string()),
        };

        // The handler already produced a response, but it must not reach the caller.
        drop(held);
        tracing::warn!(network = %verified.network, error = %failure, "Settlement failed");
        GateOutcome::SettlementFailed {
            response: failure.to_response(),
            error: failure,
        }
    }

    fn release_settled(
        &self,
        held: DeferredResponse,
        settlement: SettleResult,
        network: &str,
    ) -> GateOutcome {
        let header = SettlementReceipt::settled(settlement.tx_hash.clone())
            .to_base64()
            .and_then(|encoded| {
                HeaderValue::from_str(&encoded)
                    .map_err(|e| X402Error::internal(format!("Invalid receipt header: {}", e)))
            });

        match header {
            Ok(header) => {
                tracing::info!(
                    network = %network,
                    tx_hash = settlement.tx_hash.as_deref().unwrap_or(""),
                    "Payment settled"
                );
                let mut response = held.release();
                response
                    .headers_mut()
                    .insert(headers::X_PAYMENT_RESPONSE, header);
                GateOutcome::Settled {
                    response,
                    settlement,
                }
            }
            Err(error) => {
                tracing::error!(error = %error, "Failed to encode settlement receipt");
                GateOutcome::SettlementFailed {
                    response: error.to_response(),
                    error,
                }
            }
        }
    }

    fn reject(&self, error: X402Error, options: &[PaymentOption], resource: &str) -> GateOutcome {
        match &error {
            X402Error::Configuration { .. } | X402Error::Internal { .. } => {
                tracing::error!(error = %error, "Payment gate failure")
            }
            _ => tracing::warn!(error = %error, "Payment rejected"),
        }

        let response = match &error {
            X402Error::VerificationInvalid { .. } => {
                match accepted_requirements(options, resource, &self.config.pay_to) {
                    Ok(accepts) => {
                        let body = json!({
                            "x402Version": crate::X402_VERSION,
                            "error": error.kind(),
                            "details": error.to_string(),
                            "accepts": accepts,
                        });
                        (error.status_code(), Json(body)).into_response()
                    }
                    Err(e) => e.to_response(),
                }
            }
            _ => error.to_response(),
        };

        GateOutcome::Rejected { error, response }
    }

    /// Build the 402 challenge listing every option of the route
    pub fn challenge_response(
        &self,
        options: &[PaymentOption],
        resource: &str,
        error: &str,
    ) -> Response {
        match accepted_requirements(options, resource, &self.config.pay_to) {
            Ok(accepts) => (
                StatusCode::PAYMENT_REQUIRED,
                Json(PaymentRequirementsResponse::new(error, accepts)),
            )
                .into_response(),
            Err(e) => e.to_response(),
        }
    }

    fn failure_threshold(&self) -> StatusCode {
        self.config
            .failure_status()
            .unwrap_or(StatusCode::BAD_REQUEST)
    }
}

/// Challenge view of every option, in declaration order
pub(super) fn accepted_requirements(
    options: &[PaymentOption],
    resource: &str,
    pay_to: &str,
) -> Result<Vec<PaymentRequirements>> {
    options
        .iter()
        .map(|option| option.challenge_requirements(resource, pay_to))
        .collect::<Result<Vec<_>>>()
        .inspect_err(|e| tracing::error!(error = %e, "Failed to build payment challenge"))
}

/// `scheme://host/path` of the current request
pub fn resource_url(request: &Request) -> String {
    let request_headers = request.headers();

    let scheme = request_headers
        .get(headers::X_FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| request.uri().scheme_str().map(str::to_string))
        .unwrap_or_else(|| "http".to_string());

    let host = request_headers
        .get(http::header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()))
        .unwrap_or_else(|| "localhost".to_string());

    format!("{}://{}{}", scheme, host, request.uri().path())
}

/// Axum middleware function for handling x402 payments
pub async fn payment_middleware(
    State(gate): State<PaymentGate>,
    request: Request,
    next: Next,
) -> Response {
    gate.process_payment(request, move |request| next.run(request))
        .await
        .into_response()
}
