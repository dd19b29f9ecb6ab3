//! Tests for the payment gate

use super::config::{select_option, GateConfig};
use super::payment::{
    accepted_requirements, payment_middleware, resource_url, GateOutcome, PaymentGate,
};
use super::service::PaymentServiceLayer;
use crate::facilitator::{Facilitator, FacilitatorRegistry};
use crate::types::{
    headers, FacilitatorBinding, FacilitatorEnvelope, PaymentClaim, PaymentOption,
    PaymentRequirements, SettleResult, VerifyResult,
};
use crate::X402Error;
use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::{Layer, ServiceExt};

const PAY_TO: &str = "0x209693Bc6afc0C5328bA36FaF03C514EF312287C";
const XLAYER_TOKEN: &str = "0x74b7f16337b8972027f6196a17a631ac6de26d22";
const BASE_SEPOLIA_USDC: &str = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";

/// In-process facilitator that counts calls and records what it was sent
#[derive(Debug)]
struct StubFacilitator {
    verify: VerifyResult,
    verify_failure: Option<fn() -> X402Error>,
    settle: std::result::Result<SettleResult, String>,
    verify_calls: AtomicUsize,
    settle_calls: AtomicUsize,
    envelopes: Mutex<Vec<FacilitatorEnvelope>>,
}

impl StubFacilitator {
    fn accepting() -> Self {
        Self {
            verify: VerifyResult::valid(),
            verify_failure: None,
            settle: Ok(SettleResult::settled("0xabc")),
            verify_calls: AtomicUsize::new(0),
            settle_calls: AtomicUsize::new(0),
            envelopes: Mutex::new(Vec::new()),
        }
    }

    fn rejecting(reason: &str) -> Self {
        Self {
            verify: VerifyResult::invalid(reason),
            ..Self::accepting()
        }
    }

    fn failing_verify(failure: fn() -> X402Error) -> Self {
        Self {
            verify_failure: Some(failure),
            ..Self::accepting()
        }
    }

    fn failing_settlement(reason: &str) -> Self {
        Self {
            settle: Ok(SettleResult::failed(reason)),
            ..Self::accepting()
        }
    }

    fn unreachable_on_settle() -> Self {
        Self {
            settle: Err("connection refused".to_string()),
            ..Self::accepting()
        }
    }

    fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    fn settle_calls(&self) -> usize {
        self.settle_calls.load(Ordering::SeqCst)
    }

    fn last_envelope(&self) -> FacilitatorEnvelope {
        self.envelopes.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait::async_trait]
impl Facilitator for StubFacilitator {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn build_envelope(
        &self,
        claim: &PaymentClaim,
        _option: &PaymentOption,
        requirements: PaymentRequirements,
    ) -> FacilitatorEnvelope {
        FacilitatorEnvelope::new(claim.as_json().clone(), requirements)
    }

    async fn verify(&self, envelope: &FacilitatorEnvelope) -> crate::Result<VerifyResult> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.envelopes.lock().unwrap().push(envelope.clone());
        match self.verify_failure {
            Some(failure) => Err(failure()),
            None => Ok(self.verify.clone()),
        }
    }

    async fn settle(&self, envelope: &FacilitatorEnvelope) -> crate::Result<SettleResult> {
        self.settle_calls.fetch_add(1, Ordering::SeqCst);
        self.envelopes.lock().unwrap().push(envelope.clone());
        self.settle
            .clone()
            .map_err(X402Error::facilitator_unreachable)
    }
}

/// Log sink shared with a test subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn xlayer_option() -> PaymentOption {
    PaymentOption::new("0.1", 196, XLAYER_TOKEN, "xlayer")
        .with_description("Premium content")
        .with_metadata(json!({"tier": "gold"}))
}

fn base_sepolia_option() -> PaymentOption {
    PaymentOption::new("0.01", 84532, BASE_SEPOLIA_USDC, "base-sepolia")
}

fn create_test_config() -> GateConfig {
    GateConfig::new(PAY_TO, FacilitatorBinding::standard("https://x402.org/facilitator"))
        .with_route("/premium", vec![xlayer_option(), base_sepolia_option()])
        .with_route("/broken", vec![xlayer_option()])
        .with_route("/missing", vec![xlayer_option()])
}

fn create_gate(stub: &Arc<StubFacilitator>) -> PaymentGate {
    PaymentGate::with_facilitators(create_test_config(), FacilitatorRegistry::single(stub.clone()))
        .unwrap()
}

/// Router with a counted premium handler, a failing handler and a free route
fn create_app(gate: PaymentGate, handler_calls: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route(
            "/premium",
            get(move || {
                let handler_calls = handler_calls.clone();
                async move {
                    handler_calls.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"data": "premium content"}))
                }
            }),
        )
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "handler exploded") }),
        )
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "no such item") }),
        )
        .route("/free", get(|| async { "free content" }))
        .layer(axum::middleware::from_fn_with_state(gate, payment_middleware))
}

fn encode_claim(claim: &Value) -> String {
    general_purpose::STANDARD.encode(claim.to_string())
}

fn xlayer_claim() -> String {
    encode_claim(&json!({
        "x402Version": 1,
        "scheme": "exact",
        "network": "xlayer",
        "payload": {
            "signature": "0xsig",
            "authorization": {
                "from": "0x857b06519E91e3A54538791bDbb0E22373e36b66",
                "to": PAY_TO,
                "value": "100000"
            }
        }
    }))
}

fn request(path: &str, payment: Option<&str>) -> Request {
    let mut builder = Request::builder()
        .uri(path)
        .header("host", "api.example.com");
    if let Some(payment) = payment {
        builder = builder.header(headers::X_PAYMENT, payment);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_missing_header_returns_challenge() {
    let stub = Arc::new(StubFacilitator::accepting());
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let app = create_app(create_gate(&stub), handler_calls.clone());

    let response = app.oneshot(request("/premium", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let body = body_json(response).await;
    assert_eq!(body["x402Version"], 1);
    assert_eq!(body["error"], "X-PAYMENT header is required");

    let accepts = body["accepts"].as_array().unwrap();
    assert_eq!(accepts.len(), 2);
    assert_eq!(accepts[0]["network"], "xlayer");
    assert_eq!(accepts[0]["scheme"], "exact");
    assert_eq!(accepts[0]["maxAmountRequired"], "100000");
    assert_eq!(accepts[0]["resource"], "http://api.example.com/premium");
    assert_eq!(accepts[0]["payTo"], PAY_TO);
    assert_eq!(accepts[0]["maxTimeoutSeconds"], 180);
    assert_eq!(accepts[0]["mimeType"], "");
    assert_eq!(accepts[0]["outputSchema"], json!({}));
    assert_eq!(accepts[0]["extra"]["metadata"]["tier"], "gold");
    assert_eq!(accepts[1]["network"], "base-sepolia");
    assert_eq!(accepts[1]["maxAmountRequired"], "10000");

    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stub.verify_calls(), 0);
}

#[tokio::test]
async fn test_valid_payment_settles_and_attaches_receipt() {
    let stub = Arc::new(StubFacilitator::accepting());
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let app = create_app(create_gate(&stub), handler_calls.clone());

    let response = app
        .oneshot(request("/premium", Some(&xlayer_claim())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[headers::X_PAYMENT_RESPONSE],
        "eyJzZXR0bGVkIjp0cnVlLCJ0eEhhc2giOiIweGFiYyJ9"
    );
    let body = body_json(response).await;
    assert_eq!(body["data"], "premium content");

    assert_eq!(handler_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stub.verify_calls(), 1);
    assert_eq!(stub.settle_calls(), 1);

    let envelope = stub.last_envelope();
    let requirements = &envelope.payment_requirements;
    assert_eq!(requirements.max_timeout_seconds, 60);
    assert_eq!(requirements.max_amount_required, "100000");
    assert_eq!(requirements.mime_type, None);
    assert_eq!(requirements.output_schema, None);
    assert_eq!(requirements.extra.metadata, None);
    assert_eq!(envelope.payment_payload["network"], "xlayer");
}

#[tokio::test]
async fn test_forwarded_proto_shapes_resource() {
    let stub = Arc::new(StubFacilitator::accepting());
    let app = create_app(create_gate(&stub), Arc::new(AtomicUsize::new(0)));

    let mut req = request("/premium?page=2", Some(&xlayer_claim()));
    req.headers_mut()
        .insert(headers::X_FORWARDED_PROTO, "https".parse().unwrap());

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        stub.last_envelope().payment_requirements.resource,
        "https://api.example.com/premium"
    );
}

#[tokio::test]
async fn test_invalid_payment_never_runs_handler() {
    let stub = Arc::new(StubFacilitator::rejecting("insufficient_funds"));
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let app = create_app(create_gate(&stub), handler_calls.clone());

    let response = app
        .oneshot(request("/premium", Some(&xlayer_claim())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert!(response.headers().get(headers::X_PAYMENT_RESPONSE).is_none());

    let body = body_json(response).await;
    assert_eq!(body["error"], "Payment verification failed");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("insufficient_funds"));
    assert_eq!(body["accepts"].as_array().unwrap().len(), 2);

    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stub.settle_calls(), 0);
}

#[tokio::test]
async fn test_unreachable_facilitator_during_verify_is_payment_required() {
    let stub = Arc::new(StubFacilitator::failing_verify(|| {
        X402Error::facilitator_unreachable("connection refused")
    }));
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let app = create_app(create_gate(&stub), handler_calls.clone());

    let response = app
        .oneshot(request("/premium", Some(&xlayer_claim())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert!(response.headers().get(headers::X_PAYMENT_RESPONSE).is_none());
    let body = body_json(response).await;
    assert_eq!(body["error"], "Facilitator unreachable");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("connection refused"));

    assert_eq!(stub.verify_calls(), 1);
    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stub.settle_calls(), 0);
}

#[tokio::test]
async fn test_facilitator_error_status_during_verify_is_payment_required() {
    let stub = Arc::new(StubFacilitator::failing_verify(|| {
        X402Error::facilitator_rejected(503, "{\"error\":\"maintenance\"}")
    }));
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let app = create_app(create_gate(&stub), handler_calls.clone());

    let response = app
        .oneshot(request("/premium", Some(&xlayer_claim())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Facilitator rejected request");
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("503"));
    assert!(details.contains("maintenance"));

    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stub.settle_calls(), 0);
}

#[tokio::test]
async fn test_failed_settlement_discards_handler_response() {
    let stub = Arc::new(StubFacilitator::failing_settlement("nonce already used"));
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let app = create_app(create_gate(&stub), handler_calls.clone());

    let response = app
        .oneshot(request("/premium", Some(&xlayer_claim())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert!(response.headers().get(headers::X_PAYMENT_RESPONSE).is_none());

    let body = body_text(response).await;
    assert!(!body.contains("premium content"));
    assert!(body.contains("Settlement failed"));
    assert!(body.contains("nonce already used"));

    // The handler ran, but its output never left the gate.
    assert_eq!(handler_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stub.settle_calls(), 1);
}

#[tokio::test]
async fn test_settlement_transport_error_is_settlement_failure() {
    let stub = Arc::new(StubFacilitator::unreachable_on_settle());
    let gate = create_gate(&stub);

    let outcome = gate
        .process_payment(request("/premium", Some(&xlayer_claim())), |_| async {
            "premium content".into_response()
        })
        .await;

    match outcome {
        GateOutcome::SettlementFailed { error, response } => {
            assert!(matches!(error, X402Error::SettlementFailed { .. }));
            assert!(error.to_string().contains("connection refused"));
            assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_handler_failure_is_passed_through_unsettled() {
    let stub = Arc::new(StubFacilitator::accepting());
    let app = create_app(create_gate(&stub), Arc::new(AtomicUsize::new(0)));

    let response = app
        .oneshot(request("/broken", Some(&xlayer_claim())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(headers::X_PAYMENT_RESPONSE).is_none());
    assert_eq!(body_text(response).await, "handler exploded");

    assert_eq!(stub.verify_calls(), 1);
    assert_eq!(stub.settle_calls(), 0);
}

#[tokio::test]
async fn test_failure_threshold_is_configurable() {
    let stub = Arc::new(StubFacilitator::accepting());
    let config = create_test_config().with_failure_threshold(StatusCode::INTERNAL_SERVER_ERROR);
    let gate =
        PaymentGate::with_facilitators(config, FacilitatorRegistry::single(stub.clone())).unwrap();
    let app = create_app(gate, Arc::new(AtomicUsize::new(0)));

    let response = app
        .oneshot(request("/missing", Some(&xlayer_claim())))
        .await
        .unwrap();

    // 404 is below the raised threshold, so it is settled like a success.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(headers::X_PAYMENT_RESPONSE).is_some());
    assert_eq!(stub.settle_calls(), 1);
}

#[tokio::test]
async fn test_default_threshold_treats_client_errors_as_failures() {
    let stub = Arc::new(StubFacilitator::accepting());
    let app = create_app(create_gate(&stub), Arc::new(AtomicUsize::new(0)));

    let response = app
        .oneshot(request("/missing", Some(&xlayer_claim())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(stub.settle_calls(), 0);
}

#[tokio::test]
async fn test_malformed_header_is_bad_request() {
    let stub = Arc::new(StubFacilitator::accepting());
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let app = create_app(create_gate(&stub), handler_calls.clone());

    let response = app
        .oneshot(request("/premium", Some("not base64!!")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid payment header");
    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stub.verify_calls(), 0);
}

#[tokio::test]
async fn test_claim_without_network_is_bad_request() {
    let stub = Arc::new(StubFacilitator::accepting());
    let app = create_app(create_gate(&stub), Arc::new(AtomicUsize::new(0)));

    let claim = encode_claim(&json!({"x402Version": 1, "payload": {}}));
    let response = app
        .oneshot(request("/premium", Some(&claim)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing network in payment");
    assert_eq!(stub.verify_calls(), 0);
}

#[tokio::test]
async fn test_unsupported_network_is_bad_request() {
    let stub = Arc::new(StubFacilitator::accepting());
    let app = create_app(create_gate(&stub), Arc::new(AtomicUsize::new(0)));

    let claim = encode_claim(&json!({"network": "solana", "payload": {}}));
    let response = app
        .oneshot(request("/premium", Some(&claim)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Unsupported network");
    assert!(body["details"].as_str().unwrap().contains("solana"));
    assert_eq!(stub.verify_calls(), 0);
}

#[tokio::test]
async fn test_missing_network_facilitator_is_server_error() {
    let stub = Arc::new(StubFacilitator::accepting());
    let facilitator: Arc<dyn Facilitator> = stub.clone();
    let registry = FacilitatorRegistry::PerNetwork(HashMap::from([(
        "base-sepolia".to_string(),
        facilitator,
    )]));
    let config = create_test_config().with_network_facilitator(
        "base-sepolia",
        FacilitatorBinding::standard("https://x402.org/facilitator"),
    );
    let gate = PaymentGate::with_facilitators(config, registry).unwrap();
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let app = create_app(gate, handler_calls.clone());

    let response = app
        .oneshot(request("/premium", Some(&xlayer_claim())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["details"].as_str().unwrap().contains("xlayer"));
    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stub.verify_calls(), 0);
}

#[tokio::test]
async fn test_unprotected_path_passes_through() {
    let stub = Arc::new(StubFacilitator::accepting());
    let app = create_app(create_gate(&stub), Arc::new(AtomicUsize::new(0)));

    let response = app.oneshot(request("/free", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(headers::X_PAYMENT_RESPONSE).is_none());
    assert_eq!(body_text(response).await, "free content");
    assert_eq!(stub.verify_calls(), 0);
}

#[tokio::test]
async fn test_route_match_is_exact() {
    let stub = Arc::new(StubFacilitator::accepting());
    let gate = create_gate(&stub);

    assert!(gate.is_protected("/premium"));
    assert!(!gate.is_protected("/premium/"));
    assert!(!gate.is_protected("/premium/extra"));

    let outcome = gate
        .process_payment(request("/premium/extra", None), |_| async {
            "sub-resource".into_response()
        })
        .await;
    assert!(matches!(outcome, GateOutcome::Unprotected { .. }));
}

#[tokio::test]
async fn test_tower_layer_gates_requests() {
    let stub = Arc::new(StubFacilitator::accepting());
    let layer = PaymentServiceLayer::new(create_gate(&stub));
    let inner = tower::service_fn(|_req: Request| async {
        Ok::<_, Infallible>(Json(json!({"data": "premium content"})).into_response())
    });
    let service = layer.layer(inner);

    let challenged = service
        .clone()
        .oneshot(request("/premium", None))
        .await
        .unwrap();
    assert_eq!(challenged.status(), StatusCode::PAYMENT_REQUIRED);

    let paid = service
        .oneshot(request("/premium", Some(&xlayer_claim())))
        .await
        .unwrap();
    assert_eq!(paid.status(), StatusCode::OK);
    assert!(paid.headers().get(headers::X_PAYMENT_RESPONSE).is_some());
    assert_eq!(stub.settle_calls(), 1);
}

#[tokio::test]
async fn test_gate_logs_rejections() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let stub = Arc::new(StubFacilitator::rejecting("bad signature"));
    let gate = create_gate(&stub);
    let outcome = gate
        .process_payment(request("/premium", Some(&xlayer_claim())), |_| async {
            "premium content".into_response()
        })
        .await;
    assert!(matches!(outcome, GateOutcome::Rejected { .. }));

    let output = logs.contents();
    assert!(output.contains("Payment rejected"));
    assert!(output.contains("bad signature"));
}

#[test]
fn test_resource_url_defaults() {
    let req = Request::builder()
        .uri("/premium?x=1")
        .body(Body::empty())
        .unwrap();
    assert_eq!(resource_url(&req), "http://localhost/premium");

    let req = Request::builder()
        .uri("https://api.example.com/premium")
        .body(Body::empty())
        .unwrap();
    assert_eq!(resource_url(&req), "https://api.example.com/premium");
}

#[test]
fn test_select_option_by_network() {
    let options = vec![xlayer_option(), base_sepolia_option()];
    let claim =
        PaymentClaim::decode(&encode_claim(&json!({"network": "base-sepolia"}))).unwrap();
    assert_eq!(select_option(&options, &claim).unwrap().chain_id, 84532);

    let claim = PaymentClaim::decode(&encode_claim(&json!({"network": "base"}))).unwrap();
    assert!(matches!(
        select_option(&options, &claim),
        Err(X402Error::UnsupportedNetwork { .. })
    ));
}

#[test]
fn test_config_validation() {
    assert!(create_test_config().validate().is_ok());

    let duplicate = create_test_config().with_route("/dup", vec![xlayer_option(), xlayer_option()]);
    assert!(matches!(
        duplicate.validate(),
        Err(X402Error::Configuration { .. })
    ));

    let relative = create_test_config().with_route("premium", vec![xlayer_option()]);
    assert!(relative.validate().is_err());

    let empty = create_test_config().with_route("/empty", vec![]);
    assert!(empty.validate().is_err());

    let bad_price = create_test_config().with_route(
        "/bad",
        vec![PaymentOption::new("abc", 196, XLAYER_TOKEN, "xlayer")],
    );
    assert!(bad_price.validate().is_err());

    let mut no_recipient = create_test_config();
    no_recipient.pay_to = "  ".to_string();
    assert!(no_recipient.validate().is_err());

    let mut bad_threshold = create_test_config();
    bad_threshold.failure_threshold = 42;
    assert!(bad_threshold.validate().is_err());
    assert!(PaymentGate::with_facilitators(
        bad_threshold,
        FacilitatorRegistry::single(Arc::new(StubFacilitator::accepting()))
    )
    .is_err());
}

#[test]
fn test_config_rejects_price_overflowing_minor_units() {
    let overflowing = create_test_config().with_route(
        "/premium",
        vec![PaymentOption::new(
            "79228162514264337593543950",
            196,
            XLAYER_TOKEN,
            "xlayer",
        )],
    );

    assert!(matches!(
        overflowing.validate(),
        Err(X402Error::Configuration { .. })
    ));
    assert!(PaymentGate::with_facilitators(
        overflowing,
        FacilitatorRegistry::single(Arc::new(StubFacilitator::accepting()))
    )
    .is_err());
}

#[test]
fn test_accepted_requirements_logs_unbuildable_option() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let options = vec![
        xlayer_option(),
        PaymentOption::new("not-a-price", 84532, BASE_SEPOLIA_USDC, "base-sepolia"),
    ];
    let result = accepted_requirements(&options, "https://api.example.com/premium", PAY_TO);

    assert!(matches!(result, Err(X402Error::Configuration { .. })));
    assert!(logs.contents().contains("Failed to build payment challenge"));
}

#[test]
fn test_config_from_file() {
    let json = json!({
        "payTo": PAY_TO,
        "routes": {
            "/premium": [{
                "price": "0.1",
                "chainId": 196,
                "token": XLAYER_TOKEN,
                "usdcName": "USD Coin",
                "usdcVersion": "2",
                "network": "xlayer",
                "payTo": "0x1111111111111111111111111111111111111111"
            }]
        },
        "facilitators": {
            "url": "https://x402.org/facilitator",
            "type": "standard",
            "timeoutSeconds": 10
        }
    });

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.to_string().as_bytes()).unwrap();

    let config = GateConfig::from_file(file.path()).unwrap();
    assert_eq!(config.pay_to, PAY_TO);
    assert_eq!(config.failure_threshold, 400);

    let options = config.options_for("/premium").unwrap();
    assert_eq!(options.len(), 1);
    let requirements = options[0]
        .challenge_requirements("https://api.example.com/premium", &config.pay_to)
        .unwrap();
    assert_eq!(requirements.pay_to, "0x1111111111111111111111111111111111111111");

    let binding = config.facilitators.iter().next().unwrap().1;
    assert_eq!(binding.timeout(), Some(std::time::Duration::from_secs(10)));
}

#[test]
fn test_config_per_network_facilitators_from_json() {
    let json = json!({
        "payTo": PAY_TO,
        "failureThreshold": 500,
        "facilitators": {
            "xlayer": {"url": "https://facilitator.example.com", "type": "standard"},
            "base-sepolia": {"url": "https://x402.org/facilitator", "type": "standard"}
        }
    });

    let config = GateConfig::from_json(&json.to_string()).unwrap();
    assert_eq!(config.failure_threshold, 500);
    assert_eq!(config.facilitators.iter().count(), 2);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_from_missing_file() {
    let err = GateConfig::from_file("/nonexistent/gate.json").unwrap_err();
    assert!(matches!(err, X402Error::Configuration { .. }));
}
