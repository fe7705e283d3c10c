use crate::error::{Result, RuntimeError};
use crate::probe::Probe;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Explicit set of probe definitions owned by the host
///
/// Probes are keyed by name; iteration order is by name.
#[derive(Default)]
pub struct ProbeRegistry {
    probes: BTreeMap<String, Arc<dyn Probe>>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a probe. Fails if a probe with the same name is already present.
    pub fn register(&mut self, probe: Arc<dyn Probe>) -> Result<()> {
        let name = probe.name().to_string();
        if self.probes.contains_key(&name) {
            return Err(RuntimeError::duplicate_probe(name));
        }

        debug!("Registered probe {}", name);
        self.probes.insert(name, probe);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Probe>> {
        self.probes.get(name)
    }

    pub fn probes(&self) -> impl Iterator<Item = &Arc<dyn Probe>> {
        self.probes.values()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

impl std::fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("probes", &self.probes.keys().collect::<Vec<_>>())
            .finish()
    }
}
