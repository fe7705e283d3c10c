use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;
use vigil_core::ExpectedOutcome;

/// Lifecycle of a single probe method invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationState {
    NotStarted,
    Running,
    /// Returned normally
    Completed,
    /// Raised an assertion failure
    Failed,
    /// Raised anything else, panicked or was cancelled
    Errored,
}

impl InvocationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InvocationState::Completed | InvocationState::Failed | InvocationState::Errored
        )
    }

    pub fn can_transition_to(&self, next: InvocationState) -> bool {
        use InvocationState::*;
        match (self, next) {
            (NotStarted, Running) => true,
            // Cancelled before the body ever ran
            (NotStarted, Errored) => true,
            (Running, Completed | Failed | Errored) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for InvocationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvocationState::NotStarted => write!(f, "not-started"),
            InvocationState::Running => write!(f, "running"),
            InvocationState::Completed => write!(f, "completed"),
            InvocationState::Failed => write!(f, "failed"),
            InvocationState::Errored => write!(f, "errored"),
        }
    }
}

/// Why an invocation errored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum ErrorKind {
    /// The response could not be obtained
    Transport,
    /// The probe body raised some other error; carries its kind
    Logic(String),
    /// The probe body panicked
    Panic,
    /// The invocation was cancelled
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Logic(kind) => write!(f, "logic:{}", kind),
            ErrorKind::Panic => write!(f, "panic"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Normalized outcome of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The method returned without raising
    Passed,
    /// A response was observed that violated the expected outcome
    Failed {
        expected: ExpectedOutcome,
        status: u16,
        reason: String,
    },
    /// The method could not be evaluated
    Errored { kind: ErrorKind, message: String },
}

impl ProbeOutcome {
    /// Terminal invocation state matching this outcome
    pub fn state(&self) -> InvocationState {
        match self {
            ProbeOutcome::Passed => InvocationState::Completed,
            ProbeOutcome::Failed { .. } => InvocationState::Failed,
            ProbeOutcome::Errored { .. } => InvocationState::Errored,
        }
    }
}

/// Where a diagnostic string came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSource {
    /// The value the probe method returned
    Returned,
    /// The body excerpt of the response that failed an assertion
    AssertionFailure,
}

/// Free-form diagnostic text attached to a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub text: String,
    pub source: DiagnosticSource,
}

impl Diagnostic {
    pub fn returned(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: DiagnosticSource::Returned,
        }
    }

    pub fn from_assertion(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: DiagnosticSource::AssertionFailure,
        }
    }
}

/// Result of one probe method invocation
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub id: Uuid,
    pub probe: String,
    pub method: String,
    pub outcome: ProbeOutcome,
    pub diagnostic: Option<Diagnostic>,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl ProbeResult {
    pub fn state(&self) -> InvocationState {
        self.outcome.state()
    }

    pub fn passed(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Passed)
    }

    /// Diagnostic text, whichever source produced it
    pub fn diagnostic_text(&self) -> Option<&str> {
        self.diagnostic.as_ref().map(|d| d.text.as_str())
    }
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Results of one run over the selected probes
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub application: String,
    pub results: Vec<ProbeResult>,
}

impl RunReport {
    pub fn new(application: impl Into<String>, results: Vec<ProbeResult>) -> Self {
        Self {
            application: application.into(),
            results,
        }
    }

    pub fn passed(&self) -> usize {
        self.count(InvocationState::Completed)
    }

    pub fn failed(&self) -> usize {
        self.count(InvocationState::Failed)
    }

    pub fn errored(&self) -> usize {
        self.count(InvocationState::Errored)
    }

    /// True when every result passed (vacuously true for an empty run)
    pub fn is_healthy(&self) -> bool {
        self.results.iter().all(ProbeResult::passed)
    }

    fn count(&self, state: InvocationState) -> usize {
        self.results.iter().filter(|r| r.state() == state).count()
    }
}
