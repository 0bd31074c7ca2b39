//! Lookup of the built-in flows by id.

use super::{listing, tenant, vendor, Flow, FlowError, FlowManifest};
use std::sync::Arc;

/// Built-in flows, in the order they are listed.
pub struct FlowRegistry {
    flows: Vec<Arc<dyn Flow>>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self {
            flows: vec![
                Arc::new(vendor::flow()),
                Arc::new(tenant::flow()),
                Arc::new(listing::flow()),
            ],
        }
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn Flow>, FlowError> {
        self.flows
            .iter()
            .find(|f| f.manifest().id == id)
            .cloned()
            .ok_or_else(|| FlowError::UnknownFlow(id.to_string()))
    }

    pub fn manifests(&self) -> Vec<FlowManifest> {
        self.flows.iter().map(|f| f.manifest().clone()).collect()
    }
}

impl Default for FlowRegistry {
    fn default() -> Self {
        Self::new()
    }
}
