//! Worked fact-resolution scenarios.
//!
//! Each demo module registers its own fact schemas and resolvers and
//! exposes a [`Demo`] describing a reasonable set of seed inputs and
//! required facts to drive resolution end to end. [`catalog`] lists every
//! demo by name, for `resolve_cli`'s `--demo` flag.
//!
//! A fourth demo from the scenario this crate is modeled on -- one that
//! resolves a dataframe-shaped fact produced by an external columnar query
//! engine -- is intentionally not ported here: no such engine appears
//! anywhere in this workspace's dependency stack, and `resolve_core`'s
//! `Opaque` fact value already demonstrates that the engine itself is
//! storage-agnostic.

pub mod support_triage;
pub mod user_system;
pub mod weather_planner;

use resolve_core::resolver::ResolverRegistry;
use resolve_core::schema::SchemaRegistry;
use resolve_core::types::{FactId, FactValueData};

/// A runnable scenario: its schemas, resolvers, seed inputs, and the facts
/// a caller should ask the planner to resolve.
pub struct Demo {
    pub name: &'static str,
    pub description: &'static str,
    pub schemas: SchemaRegistry,
    pub resolvers: ResolverRegistry,
    pub seed_inputs: Vec<(FactId, FactValueData)>,
    pub required: Vec<FactId>,
}

/// Every demo, in a stable order, for listing and `--demo <name>` lookup.
#[must_use]
pub fn catalog() -> Vec<Demo> {
    vec![
        user_system::build(),
        support_triage::build(),
        weather_planner::build(),
    ]
}

/// Looks up a single demo by [`Demo::name`].
#[must_use]
pub fn by_name(name: &str) -> Option<Demo> {
    catalog().into_iter().find(|demo| demo.name == name)
}
