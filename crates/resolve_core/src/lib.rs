//! A fact-resolution engine.
//!
//! Callers supply a partial set of facts and a set of required facts; this
//! crate schedules and runs registered *resolvers* -- functions that consume
//! some facts and produce others -- until every required fact is present in
//! a shared [`ResolutionContext`], or until no further progress is possible.
//!
//! # Pieces
//!
//! - [`schema`] -- per-fact type, normalization, and ambiguity policy.
//! - [`types`] -- the fact value container and its status.
//! - [`context`] -- the per-resolution mutable store.
//! - [`merge`] -- the algebra that folds a resolver's outputs into a context.
//! - [`resolver`] -- the resolver capability, its declarative spec, and the
//!   registry binding names to implementations.
//! - [`cache`] -- the pluggable memoization interface a [`resolver::ResolverSpec`]
//!   may opt into. Concrete policies live in the sibling `resolve_cache` crate.
//! - [`planner`] -- the greedy benefit/cost scheduler that drives resolvers
//!   until the caller's required facts are satisfied.
//!
//! # Entry point
//!
//! ```
//! use resolve_core::{
//!     context::ResolutionContext,
//!     merge,
//!     planner::Planner,
//!     resolver::{execute, Resolver, ResolverOutput, ResolverRegistry, ResolverSpec},
//!     schema::{FactSchema, SchemaRegistry},
//!     types::{FactId, FactType, FactValueData},
//! };
//!
//! let foo = FactId::from("demo.foo");
//! let mut schemas = SchemaRegistry::new();
//! schemas
//!     .register(FactSchema::new(foo.clone(), FactType::Str, "a demo fact"))
//!     .unwrap();
//!
//! let mut ctx = ResolutionContext::new();
//! merge::merge(
//!     &mut ctx,
//!     &schemas,
//!     [ResolverOutput::new(foo.clone(), FactValueData::from("seed")).with_source("input")],
//! )
//! .unwrap();
//!
//! assert!(ctx.state.contains_key(&foo));
//! ```
//!
//! This crate does not perform parallel resolver execution, constraint
//! propagation, backtracking, or persistence of the [`ResolutionContext`]
//! itself; see the workspace-level `SPEC_FULL.md` for the full rationale.

pub mod cache;
pub mod context;
pub mod error;
pub mod merge;
pub mod planner;
pub mod resolver;
pub mod schema;
pub mod types;

pub use context::ResolutionContext;
pub use error::EngineError;
pub use planner::{Planner, PlannerResult};
pub use resolver::{execute, Resolver, ResolverOutput, ResolverRegistry, ResolverSpec};
pub use schema::{FactSchema, SchemaRegistry};
pub use types::{FactId, FactStatus, FactType, FactValue, FactValueData};
