//! A minimal two-hop chain: a name yields an id, an id yields a color.

use resolve_core::resolver::{ResolverOutput, ResolverRegistry, ResolverSpec};
use resolve_core::schema::{FactSchema, SchemaRegistry};
use resolve_core::types::{FactId, FactType, FactValueData};

use crate::Demo;

pub fn user_name() -> FactId {
    FactId::from("demo.user_name")
}

pub fn user_id() -> FactId {
    FactId::from("demo.user_id")
}

pub fn favorite_color() -> FactId {
    FactId::from("demo.favorite_color")
}

fn schemas() -> SchemaRegistry {
    let mut schemas = SchemaRegistry::new();
    schemas
        .register(FactSchema::new(user_name(), FactType::Str, "User name"))
        .unwrap();
    schemas
        .register(FactSchema::new(user_id(), FactType::Int, "User id"))
        .unwrap();
    schemas
        .register(
            FactSchema::new(favorite_color(), FactType::Str, "Favorite color")
                .allow_ambiguity(true),
        )
        .unwrap();
    schemas
}

fn resolvers() -> ResolverRegistry {
    let mut resolvers = ResolverRegistry::new();

    resolvers
        .register(
            ResolverSpec::new(
                "UserIdResolver",
                [user_name()],
                [user_id()],
                1.0,
                |ctx: &resolve_core::ResolutionContext| {
                    let name = ctx.get(&user_name()).unwrap().solid_value().to_string();
                    let id = i64::try_from(name.len()).unwrap_or(i64::MAX);
                    tracing::debug!(%name, id, "derived user id");
                    Ok(vec![ResolverOutput::new(user_id(), id)])
                },
            )
            .with_description("Derives a numeric id from a user's name")
            .with_impact(user_id(), 1.0),
        )
        .unwrap();

    resolvers
        .register(
            ResolverSpec::new(
                "FavoriteColorResolver",
                [user_id()],
                [favorite_color()],
                1.0,
                |ctx: &resolve_core::ResolutionContext| {
                    let uid = match ctx.get(&user_id()).unwrap().solid_value() {
                        FactValueData::Int(n) => *n,
                        other => panic!("user id fact held unexpected value {other:?}"),
                    };
                    let color = if uid % 2 == 0 { "blue" } else { "green" };
                    tracing::debug!(uid, color, "picked favorite color");
                    Ok(vec![ResolverOutput::new(favorite_color(), color)])
                },
            )
            .with_description("Picks a favorite color deterministically from a user id")
            .with_impact(favorite_color(), 0.5),
        )
        .unwrap();

    resolvers
}

#[must_use]
pub fn build() -> Demo {
    Demo {
        name: "user_system",
        description: "Derives a user id from a name, then a favorite color from the id",
        schemas: schemas(),
        resolvers: resolvers(),
        seed_inputs: vec![(user_name(), FactValueData::from("ada"))],
        required: vec![favorite_color()],
    }
}
