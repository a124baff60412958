#![allow(clippy::doc_markdown)]

use resolve_core::error::EngineError;
use resolve_core::planner::{Planner, PlannerResult};
use resolve_core::resolver::{execute, ResolverOutput, ResolverRegistry, ResolverSpec};
use resolve_core::schema::{FactSchema, SchemaRegistry};
use resolve_core::types::{FactId, FactStatus, FactType, FactValueData};
use resolve_core::ResolutionContext;

fn fixture() -> (SchemaRegistry, ResolverRegistry) {
    let mut schemas = SchemaRegistry::new();
    schemas
        .register(FactSchema::new("name", FactType::Str, "a name"))
        .unwrap();
    schemas
        .register(FactSchema::new("greeting", FactType::Str, "a greeting"))
        .unwrap();
    schemas
        .register(
            FactSchema::new("mood", FactType::Str, "an inferred mood").allow_ambiguity(true),
        )
        .unwrap();

    let mut resolvers = ResolverRegistry::new();
    resolvers
        .register(
            ResolverSpec::new(
                "GreeterResolver",
                [FactId::from("name")],
                [FactId::from("greeting")],
                2.0,
                |ctx: &ResolutionContext| {
                    let name = ctx.get(&FactId::from("name")).unwrap().solid_value().to_string();
                    Ok(vec![ResolverOutput::new(
                        "greeting",
                        format!("hello, {name}"),
                    )])
                },
            )
            .with_impact(FactId::from("greeting"), 1.0),
        )
        .unwrap();

    (schemas, resolvers)
}

#[test]
fn planner_satisfies_a_simple_dependency() {
    let (schemas, resolvers) = fixture();
    let mut ctx = ResolutionContext::new();
    ctx.seed(&schemas, [(FactId::from("name"), FactValueData::from("ada"))])
        .unwrap();

    let planner = Planner::new(&resolvers, &schemas);
    let result = planner.run(&mut ctx, &[FactId::from("greeting")]).unwrap();

    assert_eq!(result, PlannerResult::Satisfied);
    assert_eq!(
        ctx.get(&FactId::from("greeting")).unwrap().solid_value(),
        &FactValueData::from("hello, ada")
    );
}

#[test]
fn execute_is_idempotent_under_caching() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use resolve_core::cache::{CacheKey, CachePolicy};

    #[derive(Default)]
    struct CountingCache {
        store: std::sync::Mutex<hashbrown::HashMap<CacheKey, Vec<ResolverOutput>>>,
        hits: AtomicUsize,
    }

    impl CachePolicy for CountingCache {
        fn get(&self, key: &CacheKey) -> Option<Vec<ResolverOutput>> {
            let hit = self.store.lock().unwrap().get(key).cloned();
            if hit.is_some() {
                self.hits.fetch_add(1, Ordering::SeqCst);
            }
            hit
        }

        fn put(&self, key: &CacheKey, outputs: &[ResolverOutput]) {
            self.store.lock().unwrap().insert(key.clone(), outputs.to_vec());
        }
    }

    let mut schemas = SchemaRegistry::new();
    schemas
        .register(FactSchema::new("name", FactType::Str, "a name"))
        .unwrap();
    schemas
        .register(FactSchema::new("greeting", FactType::Str, "a greeting"))
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_resolver = Arc::clone(&calls);
    let cache = Arc::new(CountingCache::default());

    let spec = ResolverSpec::new(
        "GreeterResolver",
        [FactId::from("name")],
        [FactId::from("greeting")],
        1.0,
        move |ctx: &ResolutionContext| {
            calls_in_resolver.fetch_add(1, Ordering::SeqCst);
            let name = ctx.get(&FactId::from("name")).unwrap().solid_value().to_string();
            Ok(vec![ResolverOutput::new("greeting", format!("hi {name}"))])
        },
    )
    .with_cache(cache.clone());

    let mut ctx = ResolutionContext::new();
    ctx.seed(&schemas, [(FactId::from("name"), FactValueData::from("ada"))])
        .unwrap();
    execute(&spec, &mut ctx, &schemas, Vec::new()).unwrap();

    let mut ctx2 = ResolutionContext::new();
    ctx2
        .seed(&schemas, [(FactId::from("name"), FactValueData::from("ada"))])
        .unwrap();
    execute(&spec, &mut ctx2, &schemas, Vec::new()).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1, "second call should hit the cache");
    assert_eq!(cache.hits.load(Ordering::SeqCst), 1);
}

#[test]
fn execute_accepts_ad_hoc_provided_inputs() {
    let mut schemas = SchemaRegistry::new();
    schemas
        .register(FactSchema::new("name", FactType::Str, "a name"))
        .unwrap();
    schemas
        .register(FactSchema::new("greeting", FactType::Str, "a greeting"))
        .unwrap();

    let spec = ResolverSpec::new(
        "GreeterResolver",
        [FactId::from("name")],
        [FactId::from("greeting")],
        1.0,
        |ctx: &ResolutionContext| {
            let name = ctx.get(&FactId::from("name")).unwrap().solid_value().to_string();
            Ok(vec![ResolverOutput::new("greeting", format!("hi {name}"))])
        },
    );

    let mut ctx = ResolutionContext::new();
    let outputs = execute(
        &spec,
        &mut ctx,
        &schemas,
        [ResolverOutput::new("name", "grace")],
    )
    .unwrap();

    assert_eq!(outputs, vec![ResolverOutput::new("greeting", "hi grace")]);
    // execute() returns the outputs but doesn't merge them; the caller does
    // that itself, same as the planner does inline and scenario 5 does via a
    // second `execute` call against the cache.
    assert!(ctx.get(&FactId::from("greeting")).is_none());
    resolve_core::merge::merge(&mut ctx, &schemas, outputs).unwrap();
    assert_eq!(
        ctx.get(&FactId::from("greeting")).unwrap().solid_value(),
        &FactValueData::from("hi grace")
    );
}

#[test]
fn merging_an_output_for_an_unregistered_fact_is_rejected() {
    let schemas = SchemaRegistry::new();
    let mut ctx = ResolutionContext::new();
    let err = resolve_core::merge::merge(
        &mut ctx,
        &schemas,
        [ResolverOutput::new("ghost", FactValueData::from("x"))],
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::UnknownFact(_)));
}

#[test]
fn ambiguity_tolerant_facts_never_become_solid_again() {
    let (schemas, _) = fixture();
    let mut ctx = ResolutionContext::new();
    resolve_core::merge::merge(
        &mut ctx,
        &schemas,
        [ResolverOutput::new("mood", FactValueData::from("curious"))],
    )
    .unwrap();
    resolve_core::merge::merge(
        &mut ctx,
        &schemas,
        [ResolverOutput::new("mood", FactValueData::from("tired"))],
    )
    .unwrap();
    resolve_core::merge::merge(
        &mut ctx,
        &schemas,
        [ResolverOutput::new("mood", FactValueData::from("curious"))],
    )
    .unwrap();

    let fv = ctx.get(&FactId::from("mood")).unwrap();
    assert_eq!(fv.status, FactStatus::Ambiguous);
    assert_eq!(fv.values().len(), 2);
}
