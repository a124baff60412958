//! Concrete [`resolve_core::cache::CachePolicy`] implementations (spec.md §5).
//!
//! Two policies are provided, mirroring the two storage shapes a resolver's
//! outputs commonly take:
//!
//! - [`sqlite::SqliteCache`] -- a single SQLite table keyed by cache key,
//!   for resolvers whose outputs are small and JSON-serializable.
//! - [`file::FileCache`] -- a content-addressed directory on disk with
//!   mtime-based LRU eviction, for resolvers whose outputs are large enough
//!   that a database row is the wrong shape.
//!
//! Both swallow their own I/O failures into a cache miss rather than
//! propagating an error, per [`resolve_core::cache::CachePolicy`]'s contract;
//! [`CacheError`] exists so the few operations that *can't* silently
//! degrade (opening the backing store, enforcing a size limit) still report
//! a real error to their caller.

mod error;
pub mod file;
pub mod sqlite;

pub use error::CacheError;
pub use file::FileCache;
pub use sqlite::SqliteCache;
