//! Structural error kinds (spec.md §7).
//!
//! Transient cache I/O is deliberately *not* a variant here: spec.md treats
//! cache corruption as advisory, and both cache policies swallow it into a
//! cache-miss return rather than bubbling an error up through this enum.

use std::fmt;

use crate::types::FactId;

/// Error surfaced when a resolver's `run` fails.
#[derive(Debug)]
pub struct ResolverError(pub String);

impl fmt::Display for ResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ResolverError {}

impl From<&str> for ResolverError {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ResolverError {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The engine's structural error kinds.
///
/// Not derived via `derive_more::From`: `FactId` is the payload of two
/// distinct variants here, which a blanket `From<FactId>` derive can't
/// disambiguate. Named constructors below take its place.
#[derive(Debug)]
pub enum EngineError {
    /// Re-registering a [`FactId`] that already has a schema.
    SchemaAlreadyRegistered(FactId),
    /// Merge received an output for an unregistered `FactId`.
    UnknownFact(FactId),
    /// Two resolvers registered under the same name.
    DuplicateResolver(String),
    /// A [`crate::resolver::ResolverSpec`] violated one of its own invariants
    /// (`cost <= 0`) at registration time.
    InvalidResolverSpec { name: String, reason: &'static str },
    /// A resolver's `run` raised. Carries the trace accumulated by the
    /// planner up to the point of failure (spec.md §7 leaves surfacing the
    /// partial trace as an implementation choice; this implementation keeps
    /// it, since it costs nothing and callers may ignore it).
    ResolverFailure {
        resolver: String,
        source: ResolverError,
        partial_trace: Vec<String>,
    },
}

impl EngineError {
    #[must_use]
    pub fn schema_already_registered(fact_id: FactId) -> Self {
        Self::SchemaAlreadyRegistered(fact_id)
    }

    #[must_use]
    pub fn unknown_fact(fact_id: FactId) -> Self {
        Self::UnknownFact(fact_id)
    }

    #[must_use]
    pub fn duplicate_resolver(name: impl Into<String>) -> Self {
        Self::DuplicateResolver(name.into())
    }

    #[must_use]
    pub fn invalid_resolver_spec(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidResolverSpec {
            name: name.into(),
            reason,
        }
    }

    #[must_use]
    pub fn resolver_failure(
        resolver: impl Into<String>,
        source: impl Into<ResolverError>,
        partial_trace: Vec<String>,
    ) -> Self {
        Self::ResolverFailure {
            resolver: resolver.into(),
            source: source.into(),
            partial_trace,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaAlreadyRegistered(fid) => {
                write!(f, "schema for {fid} already registered")
            }
            Self::UnknownFact(fid) => write!(f, "no schema registered for fact {fid}"),
            Self::DuplicateResolver(name) => {
                write!(f, "resolver {name} already registered")
            }
            Self::InvalidResolverSpec { name, reason } => {
                write!(f, "invalid resolver spec for {name}: {reason}")
            }
            Self::ResolverFailure {
                resolver, source, ..
            } => write!(f, "resolver {resolver} failed: {source}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ResolverFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
