use std::sync::Arc;

use super::SimGraph;
use crate::MemoryProbe;
use crate::NameResolver;
use crate::NoNameResolver;
use crate::PollContext;
use crate::RegistryNameResolver;
use crate::StringTable;
use crate::ValidityGate;

/// A [`SimGraph`] plus everything a [`PollContext`] borrows.
pub struct SimWorld {
    pub graph: Arc<SimGraph>,
    pub gate: ValidityGate,
    pub strings: StringTable,
    pub resolver: Box<dyn NameResolver>,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    pub fn new() -> Self {
        let graph = Arc::new(SimGraph::new());
        Self {
            gate: ValidityGate::new(Some(graph.clone() as Arc<dyn MemoryProbe>)),
            graph,
            strings: StringTable::default(),
            resolver: Box::new(NoNameResolver),
        }
    }

    /// Resolve pilot names through the registry under the graph root.
    pub fn with_pilot_registry(mut self) -> Self {
        self.resolver = Box::new(RegistryNameResolver::pilots(self.graph.clone()));
        self
    }

    pub fn ctx(
        &self,
        may_search: bool,
    ) -> PollContext<'_> {
        PollContext {
            graph: self.graph.as_ref(),
            gate: &self.gate,
            localizer: &self.strings,
            resolver: self.resolver.as_ref(),
            may_search,
        }
    }
}
