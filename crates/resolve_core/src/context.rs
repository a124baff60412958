//! The per-resolution mutable store (spec.md §4.3).

use std::collections::BTreeMap;

use crate::types::{FactId, FactValue};

/// The shared state a single resolution run folds outputs into.
///
/// `state` is keyed by [`FactId`] in a [`BTreeMap`] rather than a hash map so
/// that iteration order -- and therefore trace and snapshot output -- is
/// deterministic without an explicit sort at every call site.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    pub state: BTreeMap<FactId, FactValue>,
    /// An append-only log of resolver names, in the order they ran. Callers
    /// that drive resolvers directly (the planner, `execute`'s callers) push
    /// to this themselves; nothing reads it back to decide what runs next --
    /// the planner's no-rerun guarantee comes entirely from its own
    /// `pending` set, scoped to a single [`crate::planner::Planner::run`]
    /// call (spec.md §4.6).
    pub trace: Vec<String>,
}

impl ResolutionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the context from externally supplied facts, each recorded with
    /// `source = "input"` and full confidence. Returns an error if any
    /// `fact_id` is not present in `schemas`.
    pub fn seed(
        &mut self,
        schemas: &crate::schema::SchemaRegistry,
        inputs: impl IntoIterator<Item = (FactId, crate::types::FactValueData)>,
    ) -> crate::error::EngineResult<()> {
        let outputs = inputs.into_iter().map(|(fact_id, value)| {
            crate::resolver::ResolverOutput::new(fact_id, value).with_source("input")
        });
        crate::merge::merge(self, schemas, outputs)
    }

    #[must_use]
    pub fn get(&self, fact_id: &FactId) -> Option<&FactValue> {
        self.state.get(fact_id)
    }

    #[must_use]
    pub fn has(&self, fact_id: &FactId) -> bool {
        self.state.contains_key(fact_id)
    }

    /// Whether every fact in `required` is present, regardless of status.
    /// The planner's stopping condition (spec.md §4.6) uses this literally:
    /// an `Ambiguous` or `Conflict` fact still counts as "present".
    #[must_use]
    pub fn satisfies<'a>(&self, required: impl IntoIterator<Item = &'a FactId>) -> bool {
        required.into_iter().all(|fact_id| self.has(fact_id))
    }

    /// `required` facts not yet present.
    pub fn missing<'a>(
        &self,
        required: impl IntoIterator<Item = &'a FactId>,
    ) -> Vec<FactId> {
        required
            .into_iter()
            .filter(|fact_id| !self.has(fact_id))
            .cloned()
            .collect()
    }
}
