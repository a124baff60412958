//! The algebra that folds a resolver's outputs into a [`ResolutionContext`]
//! (spec.md §4.2).
//!
//! Every output is handled independently and in the order given. For a
//! single `(fact_id, value)` pair exactly one of three cases applies:
//!
//! - **Insertion** -- the fact is absent: insert it `Solid` with the given
//!   value, provenance, note, and confidence.
//! - **Reinforcement** -- the fact is present and (post-normalization) equal
//!   to the incoming value: keep the stored value, append the incoming
//!   source/note, and raise confidence to `max(old, new)`.
//! - **Divergence** -- the fact is present and differs: append the incoming
//!   value to the stored value set and move status to `Ambiguous` (if the
//!   schema allows disagreement on this fact) or `Conflict` (if it doesn't).
//!   A fact that is already `Ambiguous`/`Conflict` and receives yet another
//!   distinct value stays in diverging territory -- `Ambiguous` can still
//!   escalate to `Conflict` if a later output disagrees under a
//!   non-ambiguity-tolerant schema, but nothing ever moves back to `Solid`.

use crate::error::{EngineError, EngineResult};
use crate::schema::SchemaRegistry;
use crate::types::FactStatus;

use super::context::ResolutionContext;
use super::resolver::ResolverOutput;

/// Folds `outputs` into `ctx`, one at a time, normalizing each value against
/// its fact's schema first. Fails fast on the first output whose fact has no
/// registered schema; outputs already folded before that point remain in
/// `ctx` (spec.md §9: merge does not roll back on a mid-batch error).
pub fn merge(
    ctx: &mut ResolutionContext,
    schemas: &SchemaRegistry,
    outputs: impl IntoIterator<Item = ResolverOutput>,
) -> EngineResult<()> {
    for output in outputs {
        merge_one(ctx, schemas, output)?;
    }
    Ok(())
}

fn merge_one(
    ctx: &mut ResolutionContext,
    schemas: &SchemaRegistry,
    output: ResolverOutput,
) -> EngineResult<()> {
    let schema = schemas
        .get(&output.fact_id)
        .ok_or_else(|| EngineError::unknown_fact(output.fact_id.clone()))?;

    let value = schema.apply_normalization(output.value);

    let Some(existing) = ctx.state.get_mut(&output.fact_id) else {
        tracing::trace!(fact_id = %output.fact_id, "inserting new fact");
        ctx.state.insert(
            output.fact_id.clone(),
            crate::types::FactValue::solid(
                output.fact_id,
                value,
                output.source,
                output.note,
                output.confidence,
            ),
        );
        return Ok(());
    };

    let already_seen = existing
        .values()
        .iter()
        .any(|seen| schema.values_equal(seen, &value));

    if already_seen {
        tracing::trace!(fact_id = %output.fact_id, "reinforcing existing fact");
        existing.confidence = existing.confidence.max(output.confidence);
    } else {
        tracing::debug!(fact_id = %output.fact_id, "fact value diverges from existing");
        existing.values_mut().push(value);
        existing.status = if schema.is_ambiguity_allowed() {
            FactStatus::Ambiguous
        } else {
            FactStatus::Conflict
        };
        existing.confidence = existing.confidence.max(output.confidence);
    }

    if let Some(source) = output.source {
        existing.provenance.push(source);
    }
    if let Some(note) = output.note {
        existing.notes.push(note);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FactSchema;
    use crate::types::{FactId, FactType, FactValueData};

    fn schemas_with(fact_id: &'static str, allow_ambiguity: bool) -> SchemaRegistry {
        let mut schemas = SchemaRegistry::new();
        schemas
            .register(
                FactSchema::new(fact_id, FactType::Str, "test fact").allow_ambiguity(allow_ambiguity),
            )
            .unwrap();
        schemas
    }

    #[test]
    fn insertion_creates_a_solid_fact() {
        let schemas = schemas_with("f", false);
        let mut ctx = ResolutionContext::new();
        merge(
            &mut ctx,
            &schemas,
            [ResolverOutput::new(FactId::from("f"), FactValueData::from("a")).with_source("r1")],
        )
        .unwrap();

        let fv = ctx.get(&FactId::from("f")).unwrap();
        assert_eq!(fv.status, FactStatus::Solid);
        assert_eq!(fv.values(), &[FactValueData::from("a")]);
        assert_eq!(fv.provenance, vec!["r1".to_owned()]);
    }

    #[test]
    fn reinforcement_keeps_solid_and_raises_confidence() {
        let schemas = schemas_with("f", false);
        let mut ctx = ResolutionContext::new();
        merge(
            &mut ctx,
            &schemas,
            [ResolverOutput::new(FactId::from("f"), FactValueData::from("a"))
                .with_source("r1")
                .with_confidence(0.5)],
        )
        .unwrap();
        merge(
            &mut ctx,
            &schemas,
            [ResolverOutput::new(FactId::from("f"), FactValueData::from("a"))
                .with_source("r2")
                .with_confidence(0.9)],
        )
        .unwrap();

        let fv = ctx.get(&FactId::from("f")).unwrap();
        assert_eq!(fv.status, FactStatus::Solid);
        assert_eq!(fv.values().len(), 1);
        assert!((fv.confidence - 0.9).abs() < f64::EPSILON);
        assert_eq!(fv.provenance, vec!["r1".to_owned(), "r2".to_owned()]);
    }

    #[test]
    fn divergence_on_ambiguity_tolerant_schema_yields_ambiguous() {
        let schemas = schemas_with("f", true);
        let mut ctx = ResolutionContext::new();
        merge(
            &mut ctx,
            &schemas,
            [ResolverOutput::new(FactId::from("f"), FactValueData::from("a"))],
        )
        .unwrap();
        merge(
            &mut ctx,
            &schemas,
            [ResolverOutput::new(FactId::from("f"), FactValueData::from("b"))],
        )
        .unwrap();

        let fv = ctx.get(&FactId::from("f")).unwrap();
        assert_eq!(fv.status, FactStatus::Ambiguous);
        assert_eq!(fv.values().len(), 2);
    }

    #[test]
    fn divergence_on_strict_schema_yields_conflict() {
        let schemas = schemas_with("f", false);
        let mut ctx = ResolutionContext::new();
        merge(
            &mut ctx,
            &schemas,
            [ResolverOutput::new(FactId::from("f"), FactValueData::from("a"))],
        )
        .unwrap();
        merge(
            &mut ctx,
            &schemas,
            [ResolverOutput::new(FactId::from("f"), FactValueData::from("b"))],
        )
        .unwrap();

        let fv = ctx.get(&FactId::from("f")).unwrap();
        assert_eq!(fv.status, FactStatus::Conflict);
    }

    #[test]
    fn unknown_fact_is_rejected() {
        let schemas = SchemaRegistry::new();
        let mut ctx = ResolutionContext::new();
        let err = merge(
            &mut ctx,
            &schemas,
            [ResolverOutput::new(FactId::from("ghost"), FactValueData::from("a"))],
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::UnknownFact(_)));
    }
}
