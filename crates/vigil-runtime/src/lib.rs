//! Vigil Runtime - Probe definitions, selection and invocation
//!
//! This crate provides:
//! - The probe trait and its optional capabilities (applicability, tags)
//! - Probe methods in four call shapes behind one invocation abstraction
//! - The invoker that turns any method into a single normalized result
//! - An explicit probe registry and the filters that select from it
//! - An HTTP client for probes and a one-shot runner

// Allow unused assignments for diagnostic fields - they're used by the thiserror/miette macros
#![allow(unused_assignments)]

pub mod client;
pub mod error;
pub mod filter;
pub mod invoker;
pub mod method;
pub mod probe;
pub mod registry;
pub mod runner;
pub mod types;

// Re-export primary types
pub use client::{HttpProbeClient, HttpProbeClientConfig};
pub use error::{Result, RuntimeError};
pub use filter::{
    default_filters, select_probes, ApplicationFilter, FilterResult, ProbeFilter, TagFilter,
    TagMatch,
};
pub use invoker::ProbeInvoker;
pub use method::{MethodShape, ProbeFuture, ProbeMethod, ProbeMethods};
pub use probe::{applies_to, tags_of, AppliesToApplication, HasTags, Probe};
pub use registry::ProbeRegistry;
pub use runner::{ProbeRunner, ProbeRunnerConfig};
pub use types::{
    Diagnostic, DiagnosticSource, ErrorKind, InvocationState, ProbeOutcome, ProbeResult,
    RunReport,
};

// Re-export the core crate for probe authors
pub use vigil_core;
