//! Invalidation of server-derived state that depends on the wallet snapshot.

use parking_lot::RwLock;
use std::{collections::HashMap, fmt, sync::Arc};

/// What an invalidation scope covers below its path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Only the page at exactly this path.
    Page,
    /// This path and everything rendered beneath it.
    Layout,
}

/// A set of routes whose server-derived state can be marked stale together.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InvalidationScope {
    path: String,
    kind: ScopeKind,
}

impl InvalidationScope {
    pub fn new(path: impl Into<String>, kind: ScopeKind) -> Self {
        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        if path.len() > 1 && path.ends_with('/') {
            path.pop();
        }
        Self { path, kind }
    }

    /// The root layout: every route of the application.
    pub fn app() -> Self {
        Self::new("/", ScopeKind::Layout)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Whether state rendered for `route` falls under this scope.
    pub fn covers(&self, route: &str) -> bool {
        let route = route.split(['?', '#']).next().unwrap_or_default();
        let route = if route.len() > 1 { route.trim_end_matches('/') } else { route };
        match self.kind {
            ScopeKind::Page => route == self.path,
            ScopeKind::Layout => {
                self.path == "/"
                    || route == self.path
                    || route.strip_prefix(self.path.as_str()).is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

impl fmt::Display for InvalidationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ScopeKind::Page => "page",
            ScopeKind::Layout => "layout",
        };
        write!(f, "{} ({kind})", self.path)
    }
}

/// Receives the one-way "everything under this scope is stale" signal.
///
/// Invalidation is fire-and-forget: implementations must not block on recomputation, and a
/// repeated signal for a scope that is already stale must be harmless.
pub trait Invalidator: Send + Sync {
    fn invalidate(&self, scope: &InvalidationScope);
}

impl<T: Invalidator + ?Sized> Invalidator for Arc<T> {
    fn invalidate(&self, scope: &InvalidationScope) {
        (**self).invalidate(scope)
    }
}

impl<T: Invalidator + ?Sized> Invalidator for &T {
    fn invalidate(&self, scope: &InvalidationScope) {
        (**self).invalidate(scope)
    }
}

/// Tracks a generation counter per scope, which renderers consult to decide whether a cached
/// view is still fresh.
///
/// A view rendered at [`generation_for`](Self::generation_for) `g` is stale once the generation
/// for its route moves past `g`.
#[derive(Clone, Debug, Default)]
pub struct RevalidationRegistry {
    scopes: Arc<RwLock<HashMap<InvalidationScope, u64>>>,
}

impl RevalidationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `scope` itself was invalidated.
    pub fn generation(&self, scope: &InvalidationScope) -> u64 {
        self.scopes.read().get(scope).copied().unwrap_or_default()
    }

    /// Combined generation of every scope covering `route`.
    pub fn generation_for(&self, route: &str) -> u64 {
        self.scopes
            .read()
            .iter()
            .filter(|(scope, _)| scope.covers(route))
            .map(|(_, generation)| *generation)
            .sum()
    }

    /// Whether a view of `route` rendered at `generation` may still be served.
    pub fn is_fresh(&self, route: &str, generation: u64) -> bool {
        self.generation_for(route) == generation
    }
}

impl Invalidator for RevalidationRegistry {
    fn invalidate(&self, scope: &InvalidationScope) {
        let mut scopes = self.scopes.write();
        let generation = scopes.entry(scope.clone()).or_default();
        *generation += 1;
        debug!(%scope, generation, "invalidated");
    }
}
