//! The greedy benefit/cost scheduler that drives resolvers until the
//! caller's required facts are satisfied (spec.md §4.6).

use std::collections::BTreeSet;

use hashbrown::HashMap;

use crate::context::ResolutionContext;
use crate::error::EngineResult;
use crate::resolver::ResolverRegistry;
use crate::schema::SchemaRegistry;
use crate::types::FactId;

/// Why a [`Planner::run`] call stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerResult {
    /// Every required fact is present in the context.
    Satisfied,
    /// No registered resolver is both eligible (inputs present) and useful
    /// (has at least one declared output not yet present) -- further
    /// progress is impossible without new input.
    Stalled,
    /// The iteration safety cap was hit before either of the above. Present
    /// as a distinct outcome rather than silently returning `Stalled` so
    /// callers can tell a genuine dead end from a runaway resolver set
    /// (spec.md §9).
    MaxIterationsReached,
}

/// Drives resolvers from `registry` against `ctx` until `required` is
/// satisfied or no further progress is possible.
pub struct Planner<'a> {
    registry: &'a ResolverRegistry,
    schemas: &'a SchemaRegistry,
}

impl<'a> Planner<'a> {
    #[must_use]
    pub fn new(registry: &'a ResolverRegistry, schemas: &'a SchemaRegistry) -> Self {
        Self { registry, schemas }
    }

    /// Runs the greedy loop (spec.md §4.6):
    ///
    /// ```text
    /// pending <- set of all registered resolver names
    /// loop:
    ///   if required is non-empty and required subset-of keys(ctx.state): stop
    ///   eligible <- { r for names in pending : r.is_eligible(ctx) }
    ///   if eligible is empty: stop
    ///   pick best = argmax score(r) over eligible, tie-break (-score, name)
    ///   remove best.name from pending
    ///   outputs <- best.run(ctx)   # run, not execute -- no provided_inputs, no cache
    ///   merge(ctx, outputs)
    ///   append best.name to trace
    /// ```
    ///
    /// A resolver's name is removed from `pending` the moment it is picked,
    /// regardless of whether its outputs fully land in `ctx` -- so each
    /// resolver runs at most once per call, which bounds the loop at
    /// `|resolvers|` iterations. An empty `required` does not trigger the
    /// stop condition: the loop keeps going until no pending resolver is
    /// eligible, i.e. it runs every resolver whose inputs ever become
    /// available (spec.md §4.6, scenario 4).
    pub fn run(&self, ctx: &mut ResolutionContext, required: &[FactId]) -> EngineResult<PlannerResult> {
        self.run_with_priority(ctx, required, &HashMap::new())
    }

    /// As [`Self::run`], but scores resolvers with a caller-supplied
    /// `user_priority` weighting (spec.md §4.6: `score(r) = sum(impact(fid) *
    /// user_priority.get(fid, 1.0) for fid in r.outputs) / r.cost`). A fact
    /// absent from `user_priority` defaults to weight `1.0`.
    pub fn run_with_priority(
        &self,
        ctx: &mut ResolutionContext,
        required: &[FactId],
        user_priority: &HashMap<FactId, f64>,
    ) -> EngineResult<PlannerResult> {
        let mut pending: BTreeSet<&str> = self.registry.iter().map(crate::resolver::ResolverSpec::name).collect();
        let max_iterations = pending.len();

        for _ in 0..max_iterations {
            if !required.is_empty() && ctx.satisfies(required) {
                return Ok(PlannerResult::Satisfied);
            }

            let Some(best) = self.select_best(ctx, &pending, user_priority) else {
                return Ok(PlannerResult::Stalled);
            };
            let name = best.name().to_owned();
            pending.remove(name.as_str());

            tracing::debug!(resolver = %name, score = best.score(user_priority), "planner selected resolver");

            let outputs = best.resolver().run(ctx).map_err(|source| {
                crate::error::EngineError::resolver_failure(name.clone(), source, ctx.trace.clone())
            })?;

            crate::merge::merge(ctx, self.schemas, outputs)?;
            ctx.trace.push(name);
        }

        Ok(if required.is_empty() || ctx.satisfies(required) {
            PlannerResult::Satisfied
        } else {
            PlannerResult::MaxIterationsReached
        })
    }

    fn select_best<'b>(
        &'b self,
        ctx: &ResolutionContext,
        pending: &BTreeSet<&'b str>,
        user_priority: &HashMap<FactId, f64>,
    ) -> Option<&'b crate::resolver::ResolverSpec> {
        self.registry
            .iter()
            .filter(|spec| pending.contains(spec.name()) && spec.is_eligible(ctx))
            .max_by(|a, b| {
                let by_score = a.score(user_priority).total_cmp(&b.score(user_priority));
                by_score.then_with(|| b.name().cmp(a.name()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ResolverOutput, ResolverRegistry, ResolverSpec};
    use crate::schema::{FactSchema, SchemaRegistry};
    use crate::types::{FactType, FactValueData};

    fn schemas() -> SchemaRegistry {
        let mut s = SchemaRegistry::new();
        for id in ["a", "b", "c"] {
            s.register(FactSchema::new(id, FactType::Str, id)).unwrap();
        }
        s
    }

    #[test]
    fn stops_as_soon_as_required_facts_are_present() {
        let schemas = schemas();
        let mut registry = ResolverRegistry::new();
        registry
            .register(ResolverSpec::new(
                "r1",
                [],
                [FactId::from("a")],
                1.0,
                |_ctx: &ResolutionContext| Ok(vec![ResolverOutput::new("a", "v")]),
            ))
            .unwrap();

        let mut ctx = ResolutionContext::new();
        let planner = Planner::new(&registry, &schemas);
        let result = planner.run(&mut ctx, &[FactId::from("a")]).unwrap();

        assert_eq!(result, PlannerResult::Satisfied);
        assert_eq!(ctx.trace, vec!["r1".to_owned()]);
    }

    #[test]
    fn follows_a_dependency_chain() {
        let schemas = schemas();
        let mut registry = ResolverRegistry::new();
        registry
            .register(ResolverSpec::new(
                "make_a",
                [],
                [FactId::from("a")],
                1.0,
                |_ctx: &ResolutionContext| Ok(vec![ResolverOutput::new("a", "av")]),
            ))
            .unwrap();
        registry
            .register(ResolverSpec::new(
                "make_b",
                [FactId::from("a")],
                [FactId::from("b")],
                1.0,
                |_ctx: &ResolutionContext| Ok(vec![ResolverOutput::new("b", "bv")]),
            ))
            .unwrap();

        let mut ctx = ResolutionContext::new();
        let planner = Planner::new(&registry, &schemas);
        let result = planner.run(&mut ctx, &[FactId::from("b")]).unwrap();

        assert_eq!(result, PlannerResult::Satisfied);
        assert_eq!(ctx.trace, vec!["make_a".to_owned(), "make_b".to_owned()]);
    }

    #[test]
    fn stalls_when_no_resolver_is_eligible() {
        let schemas = schemas();
        let mut registry = ResolverRegistry::new();
        registry
            .register(ResolverSpec::new(
                "needs_c",
                [FactId::from("c")],
                [FactId::from("a")],
                1.0,
                |_ctx: &ResolutionContext| Ok(vec![ResolverOutput::new("a", "v")]),
            ))
            .unwrap();

        let mut ctx = ResolutionContext::new();
        let planner = Planner::new(&registry, &schemas);
        let result = planner.run(&mut ctx, &[FactId::from("a")]).unwrap();

        assert_eq!(result, PlannerResult::Stalled);
        assert!(ctx.trace.is_empty());
    }

    #[test]
    fn prefers_higher_scoring_resolver_among_equally_eligible_ones() {
        let schemas = schemas();
        let mut registry = ResolverRegistry::new();
        registry
            .register(ResolverSpec::new(
                "cheap",
                [],
                [FactId::from("a")],
                1.0,
                |_ctx: &ResolutionContext| Ok(vec![ResolverOutput::new("a", "cheap_v")]),
            ))
            .unwrap();
        registry
            .register(ResolverSpec::new(
                "expensive",
                [],
                [FactId::from("a")],
                10.0,
                |_ctx: &ResolutionContext| Ok(vec![ResolverOutput::new("a", "expensive_v")]),
            ))
            .unwrap();

        let mut ctx = ResolutionContext::new();
        let planner = Planner::new(&registry, &schemas);
        let result = planner.run(&mut ctx, &[FactId::from("a")]).unwrap();

        assert_eq!(result, PlannerResult::Satisfied);
        assert_eq!(ctx.trace, vec!["cheap".to_owned()]);
    }

    #[test]
    fn deterministic_tie_break_prefers_lexicographically_smaller_name() {
        let schemas = schemas();
        let mut registry = ResolverRegistry::new();
        for name in ["beta", "alpha"] {
            registry
                .register(ResolverSpec::new(
                    name,
                    [],
                    [FactId::from("a")],
                    1.0,
                    |_ctx: &ResolutionContext| Ok(vec![ResolverOutput::new("a", "v")]),
                ))
                .unwrap();
        }

        let mut ctx = ResolutionContext::new();
        let planner = Planner::new(&registry, &schemas);
        planner.run(&mut ctx, &[FactId::from("a")]).unwrap();

        assert_eq!(ctx.trace, vec!["alpha".to_owned()]);
    }

    #[test]
    fn user_priority_weights_the_score_per_output_fact() {
        // spec.md §8 scenario 2, generalized: ResA (cost=1, impact=0.5) beats
        // ResB (cost=10, impact=0.6) under a neutral priority (0.5 vs 0.06),
        // but a caller-supplied priority that favors "bar" enough can flip
        // the ranking because the two resolvers produce different facts.
        let schemas = schemas();
        let mut registry = ResolverRegistry::new();
        registry
            .register(
                ResolverSpec::new(
                    "res_a",
                    [],
                    [FactId::from("a")],
                    1.0,
                    |_ctx: &ResolutionContext| Ok(vec![ResolverOutput::new("a", "av")]),
                )
                .with_impact(FactId::from("a"), 0.5),
            )
            .unwrap();
        registry
            .register(
                ResolverSpec::new(
                    "res_b",
                    [],
                    [FactId::from("b")],
                    10.0,
                    |_ctx: &ResolutionContext| Ok(vec![ResolverOutput::new("b", "bv")]),
                )
                .with_impact(FactId::from("b"), 0.6),
            )
            .unwrap();

        let mut ctx = ResolutionContext::new();
        let planner = Planner::new(&registry, &schemas);
        let mut priority = HashMap::new();
        priority.insert(FactId::from("b"), 100.0);
        let result = planner
            .run_with_priority(&mut ctx, &[FactId::from("a"), FactId::from("b")], &priority)
            .unwrap();

        assert_eq!(result, PlannerResult::Satisfied);
        assert_eq!(ctx.trace, vec!["res_b".to_owned(), "res_a".to_owned()]);
    }
}
