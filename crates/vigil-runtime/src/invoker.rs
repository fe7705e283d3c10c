use crate::method::{MethodBody, ProbeMethod};
use crate::types::{Diagnostic, ErrorKind, InvocationState, ProbeOutcome, ProbeResult};
use chrono::Utc;
use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;
use vigil_core::ProbeError;

/// How a probe body finished
enum Completion {
    Returned(Option<String>),
    Raised(ProbeError),
    Panicked(String),
}

/// Runs probe methods of any shape and normalizes the outcome
///
/// Synchronous bodies run on the blocking pool so they cannot stall the async
/// workers. Every error, panic or cancellation is captured in the returned
/// [`ProbeResult`]; nothing propagates to the caller.
#[derive(Debug, Clone, Default)]
pub struct ProbeInvoker;

impl ProbeInvoker {
    pub fn new() -> Self {
        Self
    }

    /// Invoke one method and return its result
    pub async fn invoke(&self, method: &ProbeMethod, token: &CancellationToken) -> ProbeResult {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        let mut state = InvocationState::NotStarted;

        let completion = if token.is_cancelled() {
            Completion::Raised(ProbeError::Cancelled)
        } else {
            advance(&mut state, InvocationState::Running, method);
            tokio::select! {
                biased;
                _ = token.cancelled() => Completion::Raised(ProbeError::Cancelled),
                completion = execute(method.body().clone()) => completion,
            }
        };

        let (outcome, diagnostic) = normalize(completion);
        advance(&mut state, outcome.state(), method);

        match &outcome {
            ProbeOutcome::Passed => {}
            ProbeOutcome::Failed { reason, .. } => {
                warn!("Probe {} failed: {}", method.id(), reason);
            }
            ProbeOutcome::Errored { kind, message } => {
                warn!("Probe {} errored ({}): {}", method.id(), kind, message);
            }
        }

        ProbeResult {
            id,
            probe: method.probe_name().to_string(),
            method: method.name().to_string(),
            outcome,
            diagnostic,
            started_at,
            duration: start.elapsed(),
        }
    }
}

fn advance(state: &mut InvocationState, next: InvocationState, method: &ProbeMethod) {
    if state.can_transition_to(next) {
        debug!("Probe {} {} -> {}", method.id(), state, next);
        *state = next;
    } else {
        warn!(
            "Ignoring invalid state transition for probe {}: {} -> {}",
            method.id(),
            state,
            next
        );
    }
}

async fn execute(body: MethodBody) -> Completion {
    match body {
        MethodBody::Unit(f) => run_blocking(move || f().map(|()| None)).await,
        MethodBody::Diagnostic(f) => run_blocking(move || f().map(Some)).await,
        MethodBody::UnitAsync(f) => run_async(async move { f().await.map(|()| None) }).await,
        MethodBody::DiagnosticAsync(f) => run_async(async move { f().await.map(Some) }).await,
    }
}

async fn run_blocking<F>(body: F) -> Completion
where
    F: FnOnce() -> Result<Option<String>, ProbeError> + Send + 'static,
{
    match tokio::task::spawn_blocking(body).await {
        Ok(Ok(diagnostic)) => Completion::Returned(diagnostic),
        Ok(Err(e)) => Completion::Raised(e),
        Err(e) if e.is_panic() => Completion::Panicked(panic_message(e.into_panic())),
        // The runtime is shutting down
        Err(_) => Completion::Raised(ProbeError::Cancelled),
    }
}

async fn run_async<Fut>(body: Fut) -> Completion
where
    Fut: Future<Output = Result<Option<String>, ProbeError>>,
{
    match AssertUnwindSafe(body).catch_unwind().await {
        Ok(Ok(diagnostic)) => Completion::Returned(diagnostic),
        Ok(Err(e)) => Completion::Raised(e),
        Err(payload) => Completion::Panicked(panic_message(payload)),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "probe panicked".to_string()
    }
}

fn normalize(completion: Completion) -> (ProbeOutcome, Option<Diagnostic>) {
    match completion {
        Completion::Returned(diagnostic) => {
            (ProbeOutcome::Passed, diagnostic.map(Diagnostic::returned))
        }
        Completion::Raised(ProbeError::Assertion(failure)) => {
            let reason = failure.to_string();
            (
                ProbeOutcome::Failed {
                    expected: failure.expected,
                    status: failure.status,
                    reason,
                },
                failure.body_excerpt.map(Diagnostic::from_assertion),
            )
        }
        Completion::Raised(ProbeError::Transport { message }) => (
            ProbeOutcome::Errored {
                kind: ErrorKind::Transport,
                message,
            },
            None,
        ),
        Completion::Raised(ProbeError::Cancelled) => (
            ProbeOutcome::Errored {
                kind: ErrorKind::Cancelled,
                message: "probe invocation was cancelled".to_string(),
            },
            None,
        ),
        Completion::Raised(ProbeError::Logic { kind, message }) => (
            ProbeOutcome::Errored {
                kind: ErrorKind::Logic(kind),
                message,
            },
            None,
        ),
        Completion::Panicked(message) => (
            ProbeOutcome::Errored {
                kind: ErrorKind::Panic,
                message,
            },
            None,
        ),
    }
}
