//! Errors from opening or administering a cache backend.
//!
//! Derived via `derive_more::From`: unlike `resolve_core::error::EngineError`,
//! every variant here wraps a distinct foreign type, so a blanket
//! `From<T>`-per-variant derive has nothing to disambiguate.

use std::fmt;

use derive_more::From;

#[derive(Debug, From)]
pub enum CacheError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "sqlite cache error: {e}"),
            Self::Io(e) => write!(f, "cache i/o error: {e}"),
            Self::Serde(e) => write!(f, "cache serialization error: {e}"),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Serde(e) => Some(e),
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
