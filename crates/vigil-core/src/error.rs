// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use crate::outcome::ExpectedOutcome;
use crate::response::HttpResponseSnapshot;
use miette::Diagnostic;
use thiserror::Error;

/// Longest body excerpt carried by an [`AssertionFailure`], in bytes
pub const MAX_BODY_EXCERPT: usize = 512;

/// A response was observed but its status did not meet the expected outcome
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("Expected {expected} but the response returned status {status}")]
#[diagnostic(
    code(vigil::assertion_failed),
    help("The target answered, but not the way the probe expected. Inspect the body excerpt attached to this failure")
)]
pub struct AssertionFailure {
    /// The contract the response was judged against
    pub expected: ExpectedOutcome,
    /// Status code the response actually carried
    pub status: u16,
    /// Leading part of the response body, if it had one
    pub body_excerpt: Option<String>,
}

impl AssertionFailure {
    /// Build a failure from the offending response
    pub fn new(expected: ExpectedOutcome, response: &HttpResponseSnapshot) -> Self {
        Self {
            expected,
            status: response.status(),
            body_excerpt: excerpt(response.body()),
        }
    }
}

/// Error raised from inside a probe body
#[derive(Error, Debug, Diagnostic)]
pub enum ProbeError {
    /// Response observed, contract violated
    #[error(transparent)]
    #[diagnostic(transparent)]
    Assertion(#[from] AssertionFailure),

    /// The response could not be obtained at all
    #[error("Transport error: {message}")]
    #[diagnostic(
        code(vigil::transport_error),
        help("Check connectivity to the target and the HTTP client timeout")
    )]
    Transport {
        #[allow(unused)]
        message: String,
    },

    /// The invocation was cancelled before it finished
    #[error("Probe cancelled")]
    #[diagnostic(code(vigil::cancelled))]
    Cancelled,

    /// Any other condition raised by the probe body
    #[error("Probe error ({kind}): {message}")]
    #[diagnostic(
        code(vigil::probe_logic_error),
        help("The probe itself is broken, not necessarily the target. Fix the probe body")
    )]
    Logic {
        #[allow(unused)]
        kind: String,
        #[allow(unused)]
        message: String,
    },
}

/// Result type alias for probe bodies and assertions
pub type Result<T> = std::result::Result<T, ProbeError>;

impl ProbeError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn logic(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Logic {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// True when this error is a status-contract violation
    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion(_))
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        Self::logic("serialization", err.to_string())
    }
}

/// Lossy text of the body, cut to [`MAX_BODY_EXCERPT`] bytes on a char boundary
fn excerpt(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }

    let text = String::from_utf8_lossy(body);
    if text.len() <= MAX_BODY_EXCERPT {
        return Some(text.into_owned());
    }

    let mut end = MAX_BODY_EXCERPT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    Some(format!("{}...", &text[..end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_without_body_has_no_excerpt() {
        let response = HttpResponseSnapshot::new(500);
        let failure = AssertionFailure::new(ExpectedOutcome::Success, &response);
        assert_eq!(failure.status, 500);
        assert_eq!(failure.body_excerpt, None);
    }

    #[test]
    fn test_failure_carries_body_excerpt() {
        let response = HttpResponseSnapshot::new(404).with_body("no such page");
        let failure = AssertionFailure::new(ExpectedOutcome::Success, &response);
        assert_eq!(failure.body_excerpt.as_deref(), Some("no such page"));
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        // Two-byte chars put byte 512 in the middle of a char only for odd offsets
        let body = format!("x{}", "é".repeat(600));
        let response = HttpResponseSnapshot::new(500).with_body(body);
        let failure = AssertionFailure::new(ExpectedOutcome::Success, &response);

        let excerpt = failure.body_excerpt.unwrap();
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.len() <= MAX_BODY_EXCERPT + 3);
        assert!(excerpt.starts_with("xé"));
    }

    #[test]
    fn test_failure_message_names_expectation_and_status() {
        let response = HttpResponseSnapshot::new(200);
        let failure = AssertionFailure::new(ExpectedOutcome::FailureWith(403), &response);
        assert_eq!(
            failure.to_string(),
            "Expected status 403 but the response returned status 200"
        );
    }

    #[test]
    fn test_serde_error_maps_to_logic() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let probe_err = ProbeError::from(err);
        assert!(matches!(probe_err, ProbeError::Logic { ref kind, .. } if kind == "serialization"));
        assert!(!probe_err.is_assertion());
    }
}
