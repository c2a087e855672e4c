//! Filter registry for managing available transforms.

use crate::core::transform::{Category, FilterMetadata, Identity, Transform};
use indexmap::IndexMap;
use log::warn;
use std::sync::Arc;

/// Registry entry containing metadata and the shared transform.
#[derive(Clone)]
pub struct RegistryEntry {
    /// The transform itself.
    pub transform: Arc<dyn Transform>,
    /// Cached metadata (avoids rebuilding it on every lookup).
    pub metadata: FilterMetadata,
}

/// Registry for all available filters, keyed by display name.
///
/// Lookups by name never fail: an unknown name resolves to the identity,
/// so one bad step cannot abort a pipeline.
pub struct FilterRegistry {
    /// Filters indexed by their name, in registration order.
    filters: IndexMap<String, RegistryEntry>,
    /// Identity, used for names that are not registered.
    fallback: Arc<dyn Transform>,
}

impl FilterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            filters: IndexMap::new(),
            fallback: Arc::new(Identity),
        }
    }

    /// Create a registry pre-populated with built-in filters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::filters::builtin::register_all(&mut registry);
        registry
    }

    /// Register a transform under its metadata name.
    ///
    /// Registering a name twice replaces the earlier entry.
    pub fn register<T>(&mut self, transform: T)
    where
        T: Transform + 'static,
    {
        self.register_shared(Arc::new(transform));
    }

    /// Register an already shared transform.
    pub fn register_shared(&mut self, transform: Arc<dyn Transform>) {
        let metadata = transform.metadata();
        self.filters
            .insert(metadata.name.clone(), RegistryEntry { transform, metadata });
    }

    /// Resolve a name to a transform, falling back for unknown names.
    pub fn resolve(&self, name: &str) -> Arc<dyn Transform> {
        match self.filters.get(name) {
            Some(entry) => Arc::clone(&entry.transform),
            None => {
                warn!("Unknown filter '{}', using identity", name);
                Arc::clone(&self.fallback)
            }
        }
    }

    /// Get a transform only if it is registered.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Transform>> {
        self.filters.get(name).map(|e| Arc::clone(&e.transform))
    }

    /// Get metadata for a filter.
    pub fn get_metadata(&self, name: &str) -> Option<&FilterMetadata> {
        self.filters.get(name).map(|e| &e.metadata)
    }

    /// Check if a filter is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Search filters by name or description.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();

        self.filters
            .iter()
            .filter(|(_, entry)| {
                entry.metadata.name.to_lowercase().contains(&query)
                    || entry.metadata.description.to_lowercase().contains(&query)
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Get the total number of registered filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Get filters grouped by category for display.
    pub fn grouped_by_category(&self) -> IndexMap<Category, Vec<&FilterMetadata>> {
        let mut grouped: IndexMap<Category, Vec<&FilterMetadata>> = IndexMap::new();

        for entry in self.filters.values() {
            grouped.entry(entry.metadata.category).or_default().push(&entry.metadata);
        }

        for filters in grouped.values_mut() {
            filters.sort_by(|a, b| a.name.cmp(&b.name));
        }

        grouped
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
