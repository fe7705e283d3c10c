use crate::response::HttpResponseSnapshot;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Status codes counted as a successful response
pub const SUCCESS_STATUS_RANGE: RangeInclusive<u16> = 200..=399;

/// True when the response status lies in [`SUCCESS_STATUS_RANGE`]
pub fn is_success(response: &HttpResponseSnapshot) -> bool {
    SUCCESS_STATUS_RANGE.contains(&response.status())
}

/// True when the response status equals `expected` exactly
pub fn matches(response: &HttpResponseSnapshot, expected: u16) -> bool {
    response.status() == expected
}

/// What a probe expects a response to look like
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum ExpectedOutcome {
    /// Any status in the success range
    Success,
    /// Exactly this status
    FailureWith(u16),
}

impl ExpectedOutcome {
    pub fn is_met_by(&self, response: &HttpResponseSnapshot) -> bool {
        match self {
            ExpectedOutcome::Success => is_success(response),
            ExpectedOutcome::FailureWith(code) => matches(response, *code),
        }
    }
}

impl std::fmt::Display for ExpectedOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpectedOutcome::Success => write!(
                f,
                "a success status ({}-{})",
                SUCCESS_STATUS_RANGE.start(),
                SUCCESS_STATUS_RANGE.end()
            ),
            ExpectedOutcome::FailureWith(code) => write!(f, "status {}", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range_boundaries() {
        for status in 200..=399 {
            assert!(is_success(&HttpResponseSnapshot::new(status)), "{}", status);
        }
        for status in [0, 1, 100, 101, 199, 400, 404, 500, 599, 600, 999, u16::MAX] {
            assert!(!is_success(&HttpResponseSnapshot::new(status)), "{}", status);
        }
    }

    #[test]
    fn test_matches_is_exact() {
        let response = HttpResponseSnapshot::new(400);
        assert!(matches(&response, 400));
        assert!(!matches(&response, 401));
        assert!(!matches(&response, 399));

        // Out-of-range codes are judged, not rejected
        assert!(matches(&HttpResponseSnapshot::new(42), 42));
    }

    #[test]
    fn test_expected_outcome_dispatch() {
        let ok = HttpResponseSnapshot::new(302);
        assert!(ExpectedOutcome::Success.is_met_by(&ok));
        assert!(!ExpectedOutcome::FailureWith(403).is_met_by(&ok));
        assert!(ExpectedOutcome::FailureWith(302).is_met_by(&ok));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ExpectedOutcome::Success.to_string(),
            "a success status (200-399)"
        );
        assert_eq!(ExpectedOutcome::FailureWith(403).to_string(), "status 403");
    }
}
