use miette::Diagnostic;
use thiserror::Error;

/// Host-side error type for registry, client and runner setup
#[derive(Error, Debug, Diagnostic)]
pub enum RuntimeError {
    /// A probe with this name is already registered
    #[error("Probe already registered: {probe_name}")]
    #[diagnostic(
        code(vigil::runtime::duplicate_probe),
        help("Probe names must be unique within a registry. Rename one of the probes or register it only once")
    )]
    DuplicateProbe {
        #[allow(unused)]
        probe_name: String,
    },

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {message}")]
    #[diagnostic(
        code(vigil::runtime::http_client),
        help("Check the TLS backend and the client options (timeout, user agent)")
    )]
    HttpClient {
        #[allow(unused)]
        message: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(vigil::runtime::invalid_config), help("{suggestion}"))]
    InvalidConfig {
        #[allow(unused)]
        message: String,
        #[allow(unused)]
        suggestion: String,
    },
}

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

impl RuntimeError {
    pub fn duplicate_probe(probe_name: impl Into<String>) -> Self {
        Self::DuplicateProbe {
            probe_name: probe_name.into(),
        }
    }

    pub fn http_client(message: impl Into<String>) -> Self {
        Self::HttpClient {
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}
