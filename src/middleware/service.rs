//! Tower service layer for the payment gate

use super::payment::PaymentGate;
use axum::extract::Request;
use axum::response::Response;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Tower layer applying a [`PaymentGate`] to a service
#[derive(Debug, Clone)]
pub struct PaymentServiceLayer {
    gate: PaymentGate,
}

impl PaymentServiceLayer {
    pub fn new(gate: PaymentGate) -> Self {
        Self { gate }
    }
}

impl<S> tower::Layer<S> for PaymentServiceLayer {
    type Service = PaymentService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PaymentService {
            inner,
            gate: self.gate.clone(),
        }
    }
}

/// Tower service running each request through a [`PaymentGate`]
#[derive(Debug, Clone)]
pub struct PaymentService<S> {
    inner: S,
    gate: PaymentGate,
}

impl<S> tower::Service<Request> for PaymentService<S>
where
    S: tower::Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let gate = self.gate.clone();
        // Keep the instance that was driven to readiness; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let outcome = gate
                .process_payment(req, move |req| async move {
                    match inner.call(req).await {
                        Ok(response) => response,
                        Err(never) => match never {},
                    }
                })
                .await;
            Ok(outcome.into_response())
        })
    }
}
