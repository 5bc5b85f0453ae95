use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::utils::guard::contain;
use crate::utils::text::clean_rich_text;
use crate::ForeignError;
use crate::ForeignGraph;
use crate::ForeignGraphExt;

/// Looks up display names of referenced entities (pilots, units).
#[cfg_attr(test, automock)]
pub trait NameResolver {
    fn display_name(
        &self,
        id: &str,
    ) -> Result<Option<String>, ForeignError>;
}

/// Resolve `id`, falling back to `id` itself on any failure. Never panics.
pub fn resolve_display_name(
    resolver: &dyn NameResolver,
    id: &str,
) -> String {
    if id.is_empty() {
        return String::new();
    }

    match contain(|| resolver.display_name(id)) {
        Some(Ok(Some(name))) => {
            let name = clean_rich_text(&name);
            if name.is_empty() {
                id.to_string()
            } else {
                name
            }
        }
        Some(Ok(None)) => id.to_string(),
        Some(Err(e)) => {
            debug!("resolve_display_name({}) failed: {}", id, e);
            id.to_string()
        }
        None => {
            debug!("resolve_display_name({}) panicked", id);
            id.to_string()
        }
    }
}

/// Resolver for environments without a name registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNameResolver;

impl NameResolver for NoNameResolver {
    fn display_name(
        &self,
        _id: &str,
    ) -> Result<Option<String>, ForeignError> {
        Ok(None)
    }
}

/// Where a registry of named entries lives in the foreign graph.
#[derive(Debug, Clone, Copy)]
pub struct RegistryLayout {
    /// Object hops from the root to the registry
    pub path: &'static [&'static str],
    /// List field holding the entries
    pub entries: &'static str,
    pub id_field: &'static str,
    pub name_field: &'static str,
}

/// Pilot registry: `root -> prpManager -> pilots[] { referenceId, name }`.
pub const PILOT_REGISTRY: RegistryLayout = RegistryLayout {
    path: &["prpManager"],
    entries: "pilots",
    id_field: "referenceId",
    name_field: "name",
};

/// Resolves names by scanning a registry list in the foreign graph.
pub struct RegistryNameResolver<G: ForeignGraph + ?Sized> {
    graph: Arc<G>,
    layout: RegistryLayout,
}

impl<G: ForeignGraph + ?Sized> RegistryNameResolver<G> {
    pub fn new(
        graph: Arc<G>,
        layout: RegistryLayout,
    ) -> Self {
        Self { graph, layout }
    }

    pub fn pilots(graph: Arc<G>) -> Self {
        Self::new(graph, PILOT_REGISTRY)
    }
}

impl<G: ForeignGraph + ?Sized> NameResolver for RegistryNameResolver<G> {
    fn display_name(
        &self,
        id: &str,
    ) -> Result<Option<String>, ForeignError> {
        let graph = self.graph.as_ref();
        let registry = graph.navigate(graph.root()?, self.layout.path)?;

        for entry in graph.read_list(registry, self.layout.entries)? {
            if entry.is_null() {
                continue;
            }
            // One broken entry must not hide the others.
            match graph.read_text(entry, self.layout.id_field) {
                Ok(entry_id) if entry_id == id => {
                    return graph.read_text(entry, self.layout.name_field).map(Some);
                }
                _ => continue,
            }
        }
        Ok(None)
    }
}
