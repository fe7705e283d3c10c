use crate::error::{Result, RuntimeError};
use crate::filter::{default_filters, select_probes, ProbeFilter, TagMatch};
use crate::invoker::ProbeInvoker;
use crate::method::ProbeMethod;
use crate::probe::Probe;
use crate::registry::ProbeRegistry;
use crate::types::RunReport;
use futures_util::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Configuration for a probe run
#[derive(Debug, Clone)]
pub struct ProbeRunnerConfig {
    /// Application the probes are run against
    pub application: String,
    /// Tags a probe must carry to run; empty means no tag requirement
    pub required_tags: BTreeSet<String>,
    /// How `required_tags` is matched
    pub tag_match: TagMatch,
    /// Maximum number of methods in flight at once
    pub max_concurrency: usize,
}

impl Default for ProbeRunnerConfig {
    fn default() -> Self {
        Self {
            application: String::new(),
            required_tags: BTreeSet::new(),
            tag_match: TagMatch::Any,
            max_concurrency: 4,
        }
    }
}

/// Selects probes for one application and runs every method once
///
/// There is no scheduling loop and no retry: each call to [`ProbeRunner::run`]
/// produces exactly one result per selected method.
pub struct ProbeRunner {
    registry: Arc<ProbeRegistry>,
    config: ProbeRunnerConfig,
    filters: Vec<Box<dyn ProbeFilter>>,
    invoker: ProbeInvoker,
}

impl ProbeRunner {
    pub fn new(registry: Arc<ProbeRegistry>, config: ProbeRunnerConfig) -> Result<Self> {
        if config.max_concurrency == 0 {
            return Err(RuntimeError::invalid_config(
                "max_concurrency must be at least 1",
                "Set max_concurrency to 1 to run probe methods one at a time",
            ));
        }

        let filters = default_filters(&config.application, &config.required_tags, config.tag_match);
        Ok(Self {
            registry,
            config,
            filters,
            invoker: ProbeInvoker::new(),
        })
    }

    pub fn config(&self) -> &ProbeRunnerConfig {
        &self.config
    }

    /// Probes that pass the application and tag filters
    pub fn selected_probes(&self) -> Vec<Arc<dyn Probe>> {
        select_probes(&self.registry, &self.filters)
    }

    /// Every method of every selected probe
    pub fn selected_methods(&self) -> Vec<ProbeMethod> {
        self.selected_probes()
            .into_iter()
            .flat_map(|probe| probe.methods())
            .collect()
    }

    /// Invoke each selected method once
    ///
    /// Results are ordered by probe name, then method name.
    pub async fn run(&self, token: &CancellationToken) -> RunReport {
        let methods = self.selected_methods();
        info!(
            "Running {} probe methods for application '{}' (concurrency: {})",
            methods.len(),
            self.config.application,
            self.config.max_concurrency
        );

        let invoker = &self.invoker;
        let mut results: Vec<_> = stream::iter(methods.iter())
            .map(|method| invoker.invoke(method, token))
            .buffer_unordered(self.config.max_concurrency)
            .collect()
            .await;

        results.sort_by(|a, b| (&a.probe, &a.method).cmp(&(&b.probe, &b.method)));

        let report = RunReport::new(self.config.application.clone(), results);
        info!(
            "Probe run finished: {} passed, {} failed, {} errored",
            report.passed(),
            report.failed(),
            report.errored()
        );
        report
    }
}
