use crate::probe::{applies_to, tags_of, Probe};
use crate::registry::ProbeRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Result of filtering a probe
#[derive(Debug, Clone)]
pub struct FilterResult {
    /// Probe name
    pub probe_name: String,
    /// Whether the probe passed the filter
    pub passed: bool,
    /// Reason for rejection (if any)
    pub reason: Option<String>,
}

impl FilterResult {
    pub fn pass(probe_name: String) -> Self {
        Self {
            probe_name,
            passed: true,
            reason: None,
        }
    }

    pub fn fail(probe_name: String, reason: String) -> Self {
        Self {
            probe_name,
            passed: false,
            reason: Some(reason),
        }
    }
}

/// Filter predicate trait
pub trait ProbeFilter: Send + Sync {
    /// Decide whether `probe` should run
    fn filter(&self, probe: &dyn Probe) -> FilterResult;

    /// Name of the filter
    fn name(&self) -> &str;
}

/// Keeps probes that target the given application
///
/// Probes without the applicability capability always pass.
pub struct ApplicationFilter {
    application: String,
}

impl ApplicationFilter {
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            application: application.into(),
        }
    }
}

impl ProbeFilter for ApplicationFilter {
    fn filter(&self, probe: &dyn Probe) -> FilterResult {
        let probe_name = probe.name().to_string();
        if applies_to(probe, &self.application) {
            FilterResult::pass(probe_name)
        } else {
            FilterResult::fail(
                probe_name,
                format!("probe does not apply to application '{}'", self.application),
            )
        }
    }

    fn name(&self) -> &str {
        "ApplicationFilter"
    }
}

/// How a probe's tags are matched against the required set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagMatch {
    /// At least one required tag is present
    #[default]
    Any,
    /// Every required tag is present
    All,
}

impl std::str::FromStr for TagMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(TagMatch::Any),
            "all" => Ok(TagMatch::All),
            other => Err(format!("unknown tag match mode '{}', expected any or all", other)),
        }
    }
}

/// Keeps probes whose tags match the required set
///
/// An empty required set keeps every probe.
pub struct TagFilter {
    required: BTreeSet<String>,
    mode: TagMatch,
}

impl TagFilter {
    pub fn new(required: BTreeSet<String>, mode: TagMatch) -> Self {
        Self { required, mode }
    }
}

impl ProbeFilter for TagFilter {
    fn filter(&self, probe: &dyn Probe) -> FilterResult {
        let probe_name = probe.name().to_string();
        if self.required.is_empty() {
            return FilterResult::pass(probe_name);
        }

        let tags = tags_of(probe);
        let matched = match self.mode {
            TagMatch::Any => self.required.iter().any(|t| tags.contains(t)),
            TagMatch::All => self.required.iter().all(|t| tags.contains(t)),
        };

        if matched {
            FilterResult::pass(probe_name)
        } else {
            let mode = match self.mode {
                TagMatch::Any => "any of",
                TagMatch::All => "all of",
            };
            FilterResult::fail(
                probe_name,
                format!(
                    "probe tags {:?} do not contain {} {:?}",
                    tags, mode, self.required
                ),
            )
        }
    }

    fn name(&self) -> &str {
        "TagFilter"
    }
}

/// Standard filter chain for a target application and tag requirement
pub fn default_filters(
    application: &str,
    required_tags: &BTreeSet<String>,
    mode: TagMatch,
) -> Vec<Box<dyn ProbeFilter>> {
    vec![
        Box::new(ApplicationFilter::new(application)),
        Box::new(TagFilter::new(required_tags.clone(), mode)),
    ]
}

/// Probes from `registry` that pass every filter
pub fn select_probes(
    registry: &ProbeRegistry,
    filters: &[Box<dyn ProbeFilter>],
) -> Vec<Arc<dyn Probe>> {
    registry
        .probes()
        .filter(|probe| {
            filters.iter().all(|f| {
                let result = f.filter(probe.as_ref());
                if !result.passed {
                    debug!(
                        "Probe {} rejected by {}: {}",
                        result.probe_name,
                        f.name(),
                        result.reason.as_deref().unwrap_or("no reason given")
                    );
                }
                result.passed
            })
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::ProbeMethod;
    use crate::probe::{AppliesToApplication, HasTags};

    struct Untargeted;

    impl Probe for Untargeted {
        fn name(&self) -> &str {
            "untargeted"
        }

        fn methods(self: Arc<Self>) -> Vec<ProbeMethod> {
            Vec::new()
        }
    }

    struct LiveSite;

    impl Probe for LiveSite {
        fn name(&self) -> &str {
            "live-site"
        }

        fn methods(self: Arc<Self>) -> Vec<ProbeMethod> {
            Vec::new()
        }

        fn as_applicability(&self) -> Option<&dyn AppliesToApplication> {
            Some(self)
        }

        fn as_tagged(&self) -> Option<&dyn HasTags> {
            Some(self)
        }
    }

    impl AppliesToApplication for LiveSite {
        fn applies_to(&self, application: &str) -> bool {
            application == "bing"
        }
    }

    impl HasTags for LiveSite {
        fn tags(&self) -> Vec<&str> {
            vec!["LiveSite", "NonSideEffecting"]
        }
    }

    fn tags(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_application_filter_open_default() {
        for application in ["bing", "unknown-app", ""] {
            let result = ApplicationFilter::new(application).filter(&Untargeted);
            assert!(result.passed, "{:?}", application);
        }
    }

    #[test]
    fn test_application_filter_scoped() {
        assert!(ApplicationFilter::new("bing").filter(&LiveSite).passed);

        let result = ApplicationFilter::new("contoso").filter(&LiveSite);
        assert!(!result.passed);
        assert!(result.reason.unwrap().contains("contoso"));
    }

    #[test]
    fn test_tag_filter_any_of() {
        let filter = TagFilter::new(tags(&["LiveSite"]), TagMatch::Any);
        assert!(filter.filter(&LiveSite).passed);

        let filter = TagFilter::new(tags(&["Unrelated"]), TagMatch::Any);
        assert!(!filter.filter(&LiveSite).passed);

        let filter = TagFilter::new(tags(&["Unrelated", "NonSideEffecting"]), TagMatch::Any);
        assert!(filter.filter(&LiveSite).passed);
    }

    #[test]
    fn test_tag_filter_all_of() {
        let filter = TagFilter::new(tags(&["LiveSite", "NonSideEffecting"]), TagMatch::All);
        assert!(filter.filter(&LiveSite).passed);

        let filter = TagFilter::new(tags(&["LiveSite", "Unrelated"]), TagMatch::All);
        assert!(!filter.filter(&LiveSite).passed);
    }

    #[test]
    fn test_tag_filter_is_case_sensitive() {
        let filter = TagFilter::new(tags(&["livesite"]), TagMatch::Any);
        assert!(!filter.filter(&LiveSite).passed);
    }

    #[test]
    fn test_empty_required_tags_keep_untagged_probes() {
        let filter = TagFilter::new(BTreeSet::new(), TagMatch::Any);
        assert!(filter.filter(&Untargeted).passed);

        // An untagged probe never satisfies a non-empty requirement
        let filter = TagFilter::new(tags(&["LiveSite"]), TagMatch::Any);
        assert!(!filter.filter(&Untargeted).passed);
    }

    #[test]
    fn test_tag_match_from_str() {
        assert_eq!("any".parse::<TagMatch>().unwrap(), TagMatch::Any);
        assert_eq!("ALL".parse::<TagMatch>().unwrap(), TagMatch::All);
        assert!("some".parse::<TagMatch>().is_err());
    }

    #[test]
    fn test_select_probes_applies_all_filters() {
        let mut registry = ProbeRegistry::new();
        registry.register(Arc::new(Untargeted)).unwrap();
        registry.register(Arc::new(LiveSite)).unwrap();

        let names = |selected: Vec<Arc<dyn Probe>>| -> Vec<String> {
            selected.iter().map(|p| p.name().to_string()).collect()
        };

        let selected = select_probes(
            &registry,
            &default_filters("bing", &BTreeSet::new(), TagMatch::Any),
        );
        assert_eq!(names(selected), vec!["live-site", "untargeted"]);

        let selected = select_probes(
            &registry,
            &default_filters("contoso", &BTreeSet::new(), TagMatch::Any),
        );
        assert_eq!(names(selected), vec!["untargeted"]);

        let selected = select_probes(
            &registry,
            &default_filters("bing", &tags(&["LiveSite"]), TagMatch::Any),
        );
        assert_eq!(names(selected), vec!["live-site"]);
    }
}
