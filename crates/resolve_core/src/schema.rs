//! Per-fact typing, normalization, and ambiguity policy (spec.md §4.1).

use std::sync::{Arc, Mutex, OnceLock};

use hashbrown::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::types::{FactId, FactType, FactValueData};

type Normalizer = Arc<dyn Fn(FactValueData) -> FactValueData + Send + Sync>;
type ValueEq = Arc<dyn Fn(&FactValueData, &FactValueData) -> bool + Send + Sync>;

/// Declares a fact's type, description, optional normalizer, and whether the
/// engine should tolerate disagreement on it.
#[derive(Clone)]
pub struct FactSchema {
    fact_id: FactId,
    fact_type: FactType,
    description: String,
    allow_ambiguity: bool,
    normalize: Option<Normalizer>,
    value_eq: Option<ValueEq>,
}

impl FactSchema {
    pub fn new(fact_id: impl Into<FactId>, fact_type: FactType, description: impl Into<String>) -> Self {
        Self {
            fact_id: fact_id.into(),
            fact_type,
            description: description.into(),
            allow_ambiguity: false,
            normalize: None,
            value_eq: None,
        }
    }

    #[must_use]
    pub fn allow_ambiguity(mut self, allow: bool) -> Self {
        self.allow_ambiguity = allow;
        self
    }

    /// Attach a normalizer. Must be total for in-domain inputs and
    /// idempotent after one application (spec.md §4.1).
    #[must_use]
    pub fn with_normalizer(
        mut self,
        normalize: impl Fn(FactValueData) -> FactValueData + Send + Sync + 'static,
    ) -> Self {
        self.normalize = Some(Arc::new(normalize));
        self
    }

    /// Attach a custom equality comparator, used in place of structural
    /// equality when deciding whether an incoming value reinforces or
    /// diverges from the existing one. Primarily useful for `Opaque` facts
    /// whose default identity comparison is too strict (spec.md §9).
    #[must_use]
    pub fn with_value_eq(
        mut self,
        value_eq: impl Fn(&FactValueData, &FactValueData) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.value_eq = Some(Arc::new(value_eq));
        self
    }

    #[must_use]
    pub fn fact_id(&self) -> &FactId {
        &self.fact_id
    }

    #[must_use]
    pub fn fact_type(&self) -> FactType {
        self.fact_type
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn is_ambiguity_allowed(&self) -> bool {
        self.allow_ambiguity
    }

    /// Returns `normalize(value)` if a normalizer is set, else `value`
    /// unchanged.
    #[must_use]
    pub fn apply_normalization(&self, value: FactValueData) -> FactValueData {
        self.normalize
            .as_ref()
            .map_or_else(|| value.clone(), |f| f(value))
    }

    /// Whether `a` and `b` should be treated as the same observed value.
    #[must_use]
    pub fn values_equal(&self, a: &FactValueData, b: &FactValueData) -> bool {
        self.value_eq.as_ref().map_or_else(|| a == b, |f| f(a, b))
    }
}

/// A snapshot entry for `get_schema()`-style external consumers.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    pub description: String,
    pub type_name: String,
}

/// The `FactId -> FactSchema` mapping (spec.md §4.1).
///
/// Explicit struct rather than a process global (spec.md §9 "process-wide
/// registries" design note); [`global`] retains a conventional default
/// instance for ergonomic single-process use.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: HashMap<FactId, FactSchema>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `schema`. Fails with [`EngineError::SchemaAlreadyRegistered`]
    /// if its `fact_id` is already present.
    pub fn register(&mut self, schema: FactSchema) -> EngineResult<()> {
        if self.schemas.contains_key(&schema.fact_id) {
            return Err(EngineError::schema_already_registered(schema.fact_id));
        }
        tracing::debug!(fact_id = %schema.fact_id, fact_type = %schema.fact_type, "registered fact schema");
        self.schemas.insert(schema.fact_id.clone(), schema);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, fact_id: &FactId) -> Option<&FactSchema> {
        self.schemas.get(fact_id)
    }

    #[must_use]
    pub fn contains(&self, fact_id: &FactId) -> bool {
        self.schemas.contains_key(fact_id)
    }

    /// Removes every registered schema. Must never be called while a
    /// resolution is in flight (spec.md §4.1); intended for test fixtures.
    pub fn clear(&mut self) {
        self.schemas.clear();
    }

    /// A snapshot of the registry, keyed by fact-id string -- the shape
    /// `get_schema()` (spec.md §6) returns to an external caller.
    #[must_use]
    pub fn snapshot(&self) -> std::collections::BTreeMap<String, SchemaDescriptor> {
        self.schemas
            .values()
            .map(|schema| {
                (
                    schema.fact_id.to_string(),
                    SchemaDescriptor {
                        description: schema.description.clone(),
                        type_name: schema.fact_type.to_string(),
                    },
                )
            })
            .collect()
    }
}

/// A process-wide default registry, guarded by a mutex.
///
/// Provided purely for ergonomics (spec.md §9); prefer an explicit
/// [`SchemaRegistry`] passed through [`crate::merge::merge`] and
/// [`crate::planner::Planner::run`] wherever tests require isolation.
#[must_use]
pub fn global() -> &'static Mutex<SchemaRegistry> {
    static GLOBAL: OnceLock<Mutex<SchemaRegistry>> = OnceLock::new();
    GLOBAL.get_or_init(|| Mutex::new(SchemaRegistry::new()))
}
