use crate::method::ProbeMethod;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Trait for probe definitions
///
/// A probe groups one or more [`ProbeMethod`]s that check a deployed
/// application. Beyond its name and methods, a probe may opt into optional
/// capabilities by overriding the `as_*` queries:
///
/// - [`AppliesToApplication`] limits which applications the probe targets.
///   A probe without it applies to every application.
/// - [`HasTags`] labels the probe for tag filtering. A probe without it has
///   no tags.
///
/// Probes are built once by the host, registered, and never mutated after.
pub trait Probe: Send + Sync + 'static {
    /// Unique name of the probe within a registry
    fn name(&self) -> &str;

    /// Enumerate the invocable methods, each bound to this instance
    fn methods(self: Arc<Self>) -> Vec<ProbeMethod>;

    /// Applicability capability, if the probe has one
    fn as_applicability(&self) -> Option<&dyn AppliesToApplication> {
        None
    }

    /// Tagging capability, if the probe has one
    fn as_tagged(&self) -> Option<&dyn HasTags> {
        None
    }
}

/// Capability: the probe only targets some applications
pub trait AppliesToApplication {
    fn applies_to(&self, application: &str) -> bool;
}

/// Capability: the probe carries tags
///
/// Tags compare literally (case-sensitive); order and repeats do not matter.
pub trait HasTags {
    fn tags(&self) -> Vec<&str>;
}

/// Whether `probe` targets `application`
///
/// Probes without the applicability capability target every application.
pub fn applies_to(probe: &dyn Probe, application: &str) -> bool {
    probe
        .as_applicability()
        .map_or(true, |capability| capability.applies_to(application))
}

/// The probe's tag set, empty when it has no tagging capability
pub fn tags_of(probe: &dyn Probe) -> BTreeSet<String> {
    probe
        .as_tagged()
        .map(|capability| capability.tags().into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}
