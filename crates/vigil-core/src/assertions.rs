//! Status assertions over HTTP responses
//!
//! Each check comes in two forms: one for a response already in hand and one
//! for a pending response. The pending form awaits the response first, so a
//! transport error surfaces as-is and only a received response with the wrong
//! status becomes an [`AssertionFailure`].

use crate::error::{AssertionFailure, ProbeError};
use crate::outcome::ExpectedOutcome;
use crate::response::HttpResponseSnapshot;
use futures_util::future::BoxFuture;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

fn check(
    response: &HttpResponseSnapshot,
    expected: ExpectedOutcome,
) -> Result<&HttpResponseSnapshot, AssertionFailure> {
    if expected.is_met_by(response) {
        Ok(response)
    } else {
        debug!(
            "Response status {} does not meet expectation: {}",
            response.status(),
            expected
        );
        Err(AssertionFailure::new(expected, response))
    }
}

/// Fail unless the response status is in the success range
pub fn assert_succeeds(
    response: &HttpResponseSnapshot,
) -> Result<&HttpResponseSnapshot, AssertionFailure> {
    check(response, ExpectedOutcome::Success)
}

/// Fail unless the response status is exactly `expected`
pub fn assert_fails_with(
    response: &HttpResponseSnapshot,
    expected: u16,
) -> Result<&HttpResponseSnapshot, AssertionFailure> {
    check(response, ExpectedOutcome::FailureWith(expected))
}

async fn check_pending<F, E>(
    pending: F,
    expected: ExpectedOutcome,
) -> Result<HttpResponseSnapshot, ProbeError>
where
    F: Future<Output = Result<HttpResponseSnapshot, E>>,
    E: Into<ProbeError>,
{
    let response = pending.await.map_err(Into::into)?;
    check(&response, expected)?;
    Ok(response)
}

/// Await the response, then fail unless its status is in the success range
pub async fn assert_succeeds_async<F, E>(pending: F) -> Result<HttpResponseSnapshot, ProbeError>
where
    F: Future<Output = Result<HttpResponseSnapshot, E>>,
    E: Into<ProbeError>,
{
    check_pending(pending, ExpectedOutcome::Success).await
}

/// Await the response, then fail unless its status is exactly `expected`
pub async fn assert_fails_with_async<F, E>(
    pending: F,
    expected: u16,
) -> Result<HttpResponseSnapshot, ProbeError>
where
    F: Future<Output = Result<HttpResponseSnapshot, E>>,
    E: Into<ProbeError>,
{
    check_pending(pending, ExpectedOutcome::FailureWith(expected)).await
}

async fn check_cancellable<F, E>(
    pending: F,
    expected: ExpectedOutcome,
    token: &CancellationToken,
) -> Result<HttpResponseSnapshot, ProbeError>
where
    F: Future<Output = Result<HttpResponseSnapshot, E>>,
    E: Into<ProbeError>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ProbeError::Cancelled),
        result = check_pending(pending, expected) => result,
    }
}

/// [`assert_succeeds_async`], abandoning the response once `token` is cancelled
pub async fn assert_succeeds_cancellable<F, E>(
    pending: F,
    token: &CancellationToken,
) -> Result<HttpResponseSnapshot, ProbeError>
where
    F: Future<Output = Result<HttpResponseSnapshot, E>>,
    E: Into<ProbeError>,
{
    check_cancellable(pending, ExpectedOutcome::Success, token).await
}

/// [`assert_fails_with_async`], abandoning the response once `token` is cancelled
pub async fn assert_fails_with_cancellable<F, E>(
    pending: F,
    expected: u16,
    token: &CancellationToken,
) -> Result<HttpResponseSnapshot, ProbeError>
where
    F: Future<Output = Result<HttpResponseSnapshot, E>>,
    E: Into<ProbeError>,
{
    check_cancellable(pending, ExpectedOutcome::FailureWith(expected), token).await
}

/// Assertion methods on a response already in hand
pub trait ResponseAssertions {
    fn should_succeed(&self) -> Result<&Self, AssertionFailure>;

    fn should_fail_with(&self, status: u16) -> Result<&Self, AssertionFailure>;
}

impl ResponseAssertions for HttpResponseSnapshot {
    fn should_succeed(&self) -> Result<&Self, AssertionFailure> {
        assert_succeeds(self)
    }

    fn should_fail_with(&self, status: u16) -> Result<&Self, AssertionFailure> {
        assert_fails_with(self, status)
    }
}

/// Assertion methods on a pending response
///
/// ```ignore
/// let page = client.get("/images").should_succeed_async().await?;
/// ```
pub trait PendingResponseAssertions<'a>: Sized {
    fn should_succeed_async(self) -> BoxFuture<'a, Result<HttpResponseSnapshot, ProbeError>>;

    fn should_fail_with_async(
        self,
        status: u16,
    ) -> BoxFuture<'a, Result<HttpResponseSnapshot, ProbeError>>;
}

impl<'a, F, E> PendingResponseAssertions<'a> for F
where
    F: Future<Output = Result<HttpResponseSnapshot, E>> + Send + 'a,
    E: Into<ProbeError> + Send + 'a,
{
    fn should_succeed_async(self) -> BoxFuture<'a, Result<HttpResponseSnapshot, ProbeError>> {
        Box::pin(assert_succeeds_async(self))
    }

    fn should_fail_with_async(
        self,
        status: u16,
    ) -> BoxFuture<'a, Result<HttpResponseSnapshot, ProbeError>> {
        Box::pin(assert_fails_with_async(self, status))
    }
}
