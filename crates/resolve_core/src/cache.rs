//! The pluggable memoization interface a [`crate::resolver::ResolverSpec`]
//! may opt into (spec.md §5).
//!
//! This crate defines only the trait: a [`crate::resolver::ResolverSpec`]
//! needs `Option<Arc<dyn CachePolicy>>` as a field, but the concrete SQLite
//! and content-addressed file backends live in the sibling `resolve_cache`
//! crate, which depends on `resolve_core` rather than the reverse.

use std::fmt;

use crate::resolver::ResolverOutput;

/// A cache key, opaque to the engine. Concrete [`CachePolicy`] implementations
/// derive it from a resolver's name and its declared inputs; a fact absent
/// from the context at key-construction time is simply omitted from the key
/// rather than treated as an error (spec.md §9: this is a known quirk of the
/// original cache-key scheme, preserved rather than "fixed").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey(pub String);

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolver-scoped memoization policy.
///
/// Implementations are expected to be cheap to clone (typically an `Arc`
/// around a connection pool or a directory handle) and safe to share across
/// resolvers, since a single policy instance may back more than one
/// [`crate::resolver::ResolverSpec`].
///
/// Both methods return `None`/swallow their own I/O errors into a miss
/// rather than propagating them through [`crate::error::EngineError`]:
/// cache unavailability is never fatal to a resolution (spec.md §5).
pub trait CachePolicy: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Vec<ResolverOutput>>;

    fn put(&self, key: &CacheKey, outputs: &[ResolverOutput]);
}

/// A policy that never hits. Used as the default for resolvers that don't
/// opt into caching, so call sites never need to special-case `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl CachePolicy for NoCache {
    fn get(&self, _key: &CacheKey) -> Option<Vec<ResolverOutput>> {
        None
    }

    fn put(&self, _key: &CacheKey, _outputs: &[ResolverOutput]) {}
}
