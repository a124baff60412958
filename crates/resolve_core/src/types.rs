//! The fact value container and its status.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Opaque, orderable identifier of a fact.
///
/// Equality and ordering are by canonical string form. Domain code typically
/// defines its own fact-id enum and converts into a `FactId` via `From`/`Into`
/// rather than constructing one directly; the string projection is what the
/// engine actually sorts, hashes, and serializes on.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactId(Cow<'static, str>);

impl FactId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for FactId {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for FactId {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declared logical type of a fact, used by [`crate::schema::FactSchema`] and
/// surfaced to callers via `get_schema()`-style snapshots.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactType {
    Str,
    Int,
    Float,
    Bool,
    List,
    /// An opaque n-ary relation (e.g. a database cursor, a dataframe).
    Relation,
    /// An external object the engine never inspects.
    Opaque,
}

impl fmt::Display for FactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Relation => "relation",
            Self::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// A type-erased handle to an external object (spec.md §9: "dynamic fact
/// values" design note). Equality is by `Arc` identity unless the owning
/// schema supplies its own comparator.
#[derive(Clone)]
pub struct OpaqueHandle {
    inner: Arc<dyn Any + Send + Sync>,
    label: &'static str,
}

impl OpaqueHandle {
    pub fn new<T: Any + Send + Sync>(label: &'static str, value: T) -> Self {
        Self {
            inner: Arc::new(value),
            label,
        }
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl fmt::Debug for OpaqueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Opaque").field(&self.label).finish()
    }
}

impl PartialEq for OpaqueHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// The payload carried by a fact.
///
/// Modeled as a tagged variant keyed by the schema's declared [`FactType`]
/// rather than an untyped blob (spec.md §9). `List` holds distinct observed
/// values for `Ambiguous`/`Conflict` facts as well as genuine list-typed
/// facts; the two uses are disambiguated by the owning [`crate::schema::FactSchema`],
/// not by this type.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum FactValueData {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<FactValueData>),
    #[cfg_attr(feature = "serde", serde(skip))]
    Relation(OpaqueHandle),
    #[cfg_attr(feature = "serde", serde(skip))]
    Opaque(OpaqueHandle),
}

impl From<&str> for FactValueData {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for FactValueData {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for FactValueData {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FactValueData {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FactValueData {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for FactValueData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Relation(h) | Self::Opaque(h) => write!(f, "<{}>", h.label()),
        }
    }
}

/// Agreement status of a [`FactValue`].
///
/// Never transitions back to `Solid` once it leaves that state within a
/// single resolution (spec.md §3).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactStatus {
    /// A single agreed value.
    Solid,
    /// Multiple values; the schema permits disagreement.
    Ambiguous,
    /// Multiple values; the schema forbids disagreement.
    Conflict,
}

/// The cell stored in a [`crate::context::ResolutionContext`].
///
/// `values` is always non-empty. `status == Solid` iff it holds exactly one
/// distinct value; otherwise it holds every distinct disagreeing value, in
/// insertion order (spec.md §9: "merge's mutable-sequence trick").
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FactValue {
    pub fact_id: FactId,
    values: Vec<FactValueData>,
    pub status: FactStatus,
    pub provenance: Vec<String>,
    pub notes: Vec<String>,
    pub confidence: f64,
}

impl FactValue {
    pub(crate) fn solid(
        fact_id: FactId,
        value: FactValueData,
        source: Option<String>,
        note: Option<String>,
        confidence: f64,
    ) -> Self {
        Self {
            fact_id,
            values: vec![value],
            status: FactStatus::Solid,
            provenance: source.into_iter().collect(),
            notes: note.into_iter().collect(),
            confidence,
        }
    }

    /// The distinct observed values, in insertion order. Length 1 iff
    /// `status == Solid`.
    #[must_use]
    pub fn values(&self) -> &[FactValueData] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut Vec<FactValueData> {
        &mut self.values
    }

    /// The canonical value for a `Solid` fact. Panics if the fact is not
    /// `Solid` -- callers that may be dealing with ambiguous/conflicting
    /// facts should use [`Self::values`] or [`Self::external_value`].
    #[must_use]
    pub fn solid_value(&self) -> &FactValueData {
        assert!(
            self.status == FactStatus::Solid,
            "solid_value() called on a non-Solid FactValue"
        );
        &self.values[0]
    }

    /// The representation an external caller sees (spec.md §6): the scalar
    /// value when `Solid`, or the full list of disagreeing values otherwise.
    #[must_use]
    pub fn external_value(&self) -> FactValueData {
        if self.status == FactStatus::Solid {
            self.values[0].clone()
        } else {
            FactValueData::List(self.values.clone())
        }
    }
}
