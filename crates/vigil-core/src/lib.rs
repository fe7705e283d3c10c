//! Vigil Core - Response judgment for production health probes
//!
//! This crate provides:
//! - An immutable snapshot of an observed HTTP response
//! - The success/expected-failure status evaluator
//! - Synchronous, asynchronous and cancellable status assertions
//! - The error taxonomy probe bodies raise

pub mod assertions;
pub mod error;
pub mod outcome;
pub mod response;

// Re-export commonly used types
pub use assertions::{
    assert_fails_with, assert_fails_with_async, assert_fails_with_cancellable, assert_succeeds,
    assert_succeeds_async, assert_succeeds_cancellable, PendingResponseAssertions,
    ResponseAssertions,
};
pub use error::{AssertionFailure, ProbeError, Result};
pub use outcome::{is_success, matches, ExpectedOutcome, SUCCESS_STATUS_RANGE};
pub use response::HttpResponseSnapshot;
