//! Resolved-route cache.

use dashmap::DashMap;
use std::sync::Arc;

use super::{RoutingData, ViewTarget};

/// A path resolved to its view.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub routing: RoutingData,
    pub target: ViewTarget,
}

/// Resolved routes keyed by raw request path.
///
/// Entries live until [`clear`](Self::clear) or process exit. The router
/// skips the cache entirely in debug mode.
#[derive(Debug, Default)]
pub struct RouteCache {
    routes: DashMap<String, Arc<ResolvedRoute>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Arc<ResolvedRoute>> {
        self.routes.get(path).map(|entry| Arc::clone(entry.value()))
    }

    pub fn insert(&self, path: impl Into<String>, route: Arc<ResolvedRoute>) {
        self.routes.insert(path.into(), route);
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn clear(&self) {
        self.routes.clear();
    }
}
