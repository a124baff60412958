//! The resolver capability, its declarative spec, and the registry binding
//! names to implementations (spec.md §4.4).

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, OnceLock};

use hashbrown::HashMap;

use crate::cache::{CacheKey, CachePolicy, NoCache};
use crate::context::ResolutionContext;
use crate::error::{EngineError, EngineResult};
use crate::types::{FactId, FactValueData};

/// A single `(fact_id, value)` a resolver produces, along with optional
/// provenance the merge algebra folds in (spec.md §4.2).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverOutput {
    pub fact_id: FactId,
    pub value: FactValueData,
    pub source: Option<String>,
    pub note: Option<String>,
    pub confidence: f64,
}

impl ResolverOutput {
    pub fn new(fact_id: impl Into<FactId>, value: impl Into<FactValueData>) -> Self {
        Self {
            fact_id: fact_id.into(),
            value: value.into(),
            source: None,
            note: None,
            confidence: 1.0,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// The capability a resolver implements: given the facts currently known,
/// produce zero or more new ones.
///
/// Implementations should be pure functions of `ctx`'s visible state -- no
/// hidden global mutation -- since the planner may call `run` on the same
/// resolver more than once across a resolution if its outputs were not all
/// accepted by the merge algebra (e.g. a prior run only produced a subset of
/// its declared outputs).
pub trait Resolver: Send + Sync {
    fn run(&self, ctx: &ResolutionContext) -> Result<Vec<ResolverOutput>, crate::error::ResolverError>;
}

impl<F> Resolver for F
where
    F: Fn(&ResolutionContext) -> Result<Vec<ResolverOutput>, crate::error::ResolverError> + Send + Sync,
{
    fn run(&self, ctx: &ResolutionContext) -> Result<Vec<ResolverOutput>, crate::error::ResolverError> {
        self(ctx)
    }
}

/// The declarative metadata the planner schedules on, plus the resolver
/// implementation itself (spec.md §4.4 / §4.6).
#[derive(Clone)]
pub struct ResolverSpec {
    name: String,
    description: String,
    inputs: BTreeSet<FactId>,
    outputs: BTreeSet<FactId>,
    /// Per-output-fact relative importance, used by the planner's benefit
    /// term. A fact in `outputs` with no entry here defaults to weight `1.0`.
    impact: HashMap<FactId, f64>,
    cost: f64,
    cache: Option<Arc<dyn CachePolicy>>,
    resolver: Arc<dyn Resolver>,
}

impl ResolverSpec {
    /// Builds a spec. `cost` must be strictly positive (spec.md §4.6: cost
    /// is a scoring denominator); violating this is rejected at
    /// [`ResolverRegistry::register`] time rather than here, so construction
    /// itself never fails.
    pub fn new(
        name: impl Into<String>,
        inputs: impl IntoIterator<Item = FactId>,
        outputs: impl IntoIterator<Item = FactId>,
        cost: f64,
        resolver: impl Resolver + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            inputs: inputs.into_iter().collect(),
            outputs: outputs.into_iter().collect(),
            impact: HashMap::new(),
            cost,
            cache: None,
            resolver: Arc::new(resolver),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_impact(mut self, fact_id: FactId, weight: f64) -> Self {
        self.impact.insert(fact_id, weight);
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CachePolicy>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn inputs(&self) -> &BTreeSet<FactId> {
        &self.inputs
    }

    #[must_use]
    pub fn outputs(&self) -> &BTreeSet<FactId> {
        &self.outputs
    }

    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// The resolver implementation itself, for callers (namely
    /// [`crate::planner::Planner`]) that need to invoke `run` directly
    /// rather than through [`execute`]'s cache-aware path.
    #[must_use]
    pub fn resolver(&self) -> &dyn Resolver {
        &*self.resolver
    }

    fn impact_weight(&self, fact_id: &FactId) -> f64 {
        self.impact.get(fact_id).copied().unwrap_or(1.0)
    }

    /// Declared outputs with no matching `impact` entry, i.e. ones that will
    /// silently score at the default weight of `1.0`. Surfaces spec.md §3's
    /// "should" invariant that every `output_facts` entry appears as a key
    /// in `impact`; not enforced at registration, since the spec only says
    /// "should" rather than "must".
    #[must_use]
    pub fn outputs_missing_impact(&self) -> Vec<&FactId> {
        self.outputs
            .iter()
            .filter(|fact_id| !self.impact.contains_key(*fact_id))
            .collect()
    }

    /// Whether every declared input is already present in `ctx`.
    #[must_use]
    pub fn is_eligible(&self, ctx: &ResolutionContext) -> bool {
        self.inputs.iter().all(|fact_id| ctx.has(fact_id))
    }

    /// `sum(impact(f) * user_priority.get(f, 1.0) for f in outputs) / cost`
    /// (spec.md §4.6). Depends on `ctx` not at all -- only on `user_priority`,
    /// a caller-supplied weighting of facts by `FactId` (spec.md §6: the
    /// planner is invoked with `user_priority = {}` by the external `run()`
    /// contract, defaulting every fact to weight `1.0`) -- and ranges over
    /// every declared output rather than only those still missing from a
    /// given context.
    #[must_use]
    pub fn score(&self, user_priority: &HashMap<FactId, f64>) -> f64 {
        let benefit: f64 = self
            .outputs
            .iter()
            .map(|fact_id| self.impact_weight(fact_id) * user_priority.get(fact_id).copied().unwrap_or(1.0))
            .sum();
        benefit / self.cost
    }

    fn cache_key(&self, ctx: &ResolutionContext) -> CacheKey {
        let mut parts = Vec::with_capacity(self.inputs.len() + 1);
        parts.push(self.name.clone());
        for fact_id in &self.inputs {
            if let Some(fv) = ctx.get(fact_id) {
                parts.push(format!("{fact_id}={}", fv.external_value()));
            }
        }
        CacheKey(parts.join("|"))
    }
}

/// The name -> spec binding (spec.md §4.4).
#[derive(Default)]
pub struct ResolverRegistry {
    specs: HashMap<String, ResolverSpec>,
}

impl ResolverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `spec`. Fails with [`EngineError::DuplicateResolver`] if its
    /// name is already taken, or [`EngineError::InvalidResolverSpec`] if its
    /// cost is not strictly positive.
    pub fn register(&mut self, spec: ResolverSpec) -> EngineResult<()> {
        if spec.cost <= 0.0 {
            return Err(EngineError::invalid_resolver_spec(
                spec.name,
                "cost must be strictly positive",
            ));
        }
        if self.specs.contains_key(&spec.name) {
            return Err(EngineError::duplicate_resolver(spec.name));
        }
        tracing::debug!(resolver = %spec.name, inputs = ?spec.inputs, outputs = ?spec.outputs, "registered resolver");
        self.specs.insert(spec.name.clone(), spec);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResolverSpec> {
        self.specs.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolverSpec> {
        self.specs.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// A descriptor for every registered resolver, for an external caller
    /// (spec.md §6: `explain()`).
    #[must_use]
    pub fn explain(&self) -> Vec<ResolverDescriptor> {
        let mut descriptors: Vec<_> = self.specs.values().map(ResolverDescriptor::from).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }
}

/// A process-wide default registry, guarded by a mutex (spec.md §9: the
/// source exposes a resolver-name -> resolver global alongside the schema
/// one; [`crate::schema::global`] is this type's counterpart). Prefer an
/// explicit [`ResolverRegistry`] passed to [`crate::planner::Planner`]
/// wherever tests require isolation.
#[must_use]
pub fn global() -> &'static Mutex<ResolverRegistry> {
    static GLOBAL: OnceLock<Mutex<ResolverRegistry>> = OnceLock::new();
    GLOBAL.get_or_init(|| Mutex::new(ResolverRegistry::new()))
}

/// A resolver's declarative metadata, rendered for an external caller
/// (spec.md §6: `explain()` returns `{name, description, inputs, outputs,
/// impact, cost}` per resolver, with `inputs`/`outputs` sorted fact-id lists
/// and `impact` sorted by key).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverDescriptor {
    pub name: String,
    pub description: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub impact: std::collections::BTreeMap<String, f64>,
    pub cost: f64,
}

impl From<&ResolverSpec> for ResolverDescriptor {
    fn from(spec: &ResolverSpec) -> Self {
        Self {
            name: spec.name.clone(),
            description: spec.description.clone(),
            inputs: spec.inputs.iter().map(ToString::to_string).collect(),
            outputs: spec.outputs.iter().map(ToString::to_string).collect(),
            impact: spec
                .outputs
                .iter()
                .map(|fact_id| (fact_id.to_string(), spec.impact_weight(fact_id)))
                .collect(),
            cost: spec.cost,
        }
    }
}

/// Runs `spec` once (spec.md §4.4): `provided_inputs`, if non-empty, are
/// injected directly into `ctx` as `Solid` facts -- bypassing the merge
/// algebra entirely, overwriting whatever cell (if any) was already there --
/// before the cache is consulted. This lets a caller probe a resolver
/// ad-hoc, without first driving the merge algebra to populate its inputs.
///
/// A cache hit short-circuits straight to the cached outputs; a miss calls
/// `spec`'s resolver and (if caching is configured) stores its outputs
/// under this call's key. Either way, any `provided_inputs` fact that is
/// also one of `spec`'s declared outputs is then removed from `ctx` again,
/// so that a settled value only lands once the caller merges `outputs`
/// back in through the normal algebra.
///
/// This function never calls [`crate::merge::merge`] and never touches
/// `ctx.trace` itself -- spec.md §4.4 describes only inject/cache-check/
/// run/cleanup, and leaves merging the returned outputs (and recording a
/// trace entry, if the caller wants one) to whoever calls `execute`. This
/// is the call-site consumers reach for on-demand execution outside of
/// [`crate::planner::Planner`]; the planner itself deliberately bypasses
/// this function for its own scheduling loop (spec.md §4.6), which merges
/// and traces inline instead.
pub fn execute(
    spec: &ResolverSpec,
    ctx: &mut ResolutionContext,
    schemas: &crate::schema::SchemaRegistry,
    provided_inputs: impl IntoIterator<Item = ResolverOutput>,
) -> EngineResult<Vec<ResolverOutput>> {
    let mut provided_ids = BTreeSet::new();
    for output in provided_inputs {
        let schema = schemas
            .get(&output.fact_id)
            .ok_or_else(|| EngineError::unknown_fact(output.fact_id.clone()))?;
        let value = schema.apply_normalization(output.value);
        let fact_id = output.fact_id.clone();
        ctx.state.insert(
            fact_id.clone(),
            crate::types::FactValue::solid(fact_id.clone(), value, output.source, output.note, output.confidence),
        );
        provided_ids.insert(fact_id);
    }

    let cache: Arc<dyn CachePolicy> = spec.cache.clone().unwrap_or_else(|| Arc::new(NoCache));
    let key = spec.cache_key(ctx);

    let outputs = if let Some(cached) = cache.get(&key) {
        tracing::trace!(resolver = %spec.name, %key, "cache hit");
        cached
    } else {
        tracing::debug!(resolver = %spec.name, %key, "cache miss, running resolver");
        let produced = spec.resolver.run(ctx).map_err(|source| {
            EngineError::resolver_failure(spec.name.clone(), source, ctx.trace.clone())
        })?;
        cache.put(&key, &produced);
        produced
    };

    for fact_id in &provided_ids {
        if spec.outputs.contains(fact_id) {
            ctx.state.remove(fact_id);
        }
    }

    Ok(outputs)
}
