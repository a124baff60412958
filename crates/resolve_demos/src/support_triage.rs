//! Classifies a free-text incident summary into severity, impact, an
//! assigned team, and an ETA.

use resolve_core::resolver::{ResolverOutput, ResolverRegistry, ResolverSpec};
use resolve_core::schema::{FactSchema, SchemaRegistry};
use resolve_core::types::{FactId, FactType, FactValueData};
use resolve_core::ResolutionContext;

use crate::Demo;

pub fn incident_summary() -> FactId {
    FactId::from("demo.support.incident_summary")
}

pub fn severity() -> FactId {
    FactId::from("demo.support.severity")
}

pub fn customer_impact() -> FactId {
    FactId::from("demo.support.customer_impact")
}

pub fn assigned_team() -> FactId {
    FactId::from("demo.support.assigned_team")
}

pub fn eta_days() -> FactId {
    FactId::from("demo.support.eta_days")
}

fn schemas() -> SchemaRegistry {
    let mut schemas = SchemaRegistry::new();
    schemas
        .register(FactSchema::new(
            incident_summary(),
            FactType::Str,
            "Short description of the incident submitted by a user",
        ))
        .unwrap();
    schemas
        .register(FactSchema::new(
            severity(),
            FactType::Str,
            "Categorized severity level",
        ))
        .unwrap();
    schemas
        .register(FactSchema::new(
            customer_impact(),
            FactType::Str,
            "Human-readable impact summary",
        ))
        .unwrap();
    schemas
        .register(FactSchema::new(
            assigned_team(),
            FactType::Str,
            "Team that will handle the incident",
        ))
        .unwrap();
    schemas
        .register(FactSchema::new(
            eta_days(),
            FactType::Int,
            "Estimated days until resolution",
        ))
        .unwrap();
    schemas
}

fn classify(summary: &str) -> (&'static str, &'static str) {
    let lowered = summary.to_lowercase();
    if ["outage", "down", "unavailable"]
        .iter()
        .any(|word| lowered.contains(word))
    {
        ("critical", "Widespread impact, service unavailable")
    } else if lowered.contains("slow") || lowered.contains("degraded") {
        ("major", "Performance degradation for some users")
    } else {
        ("minor", "Isolated inconvenience or request")
    }
}

fn assignment(severity: &str) -> (&'static str, i64) {
    match severity {
        "critical" => ("SRE", 1),
        "major" => ("Backend", 3),
        _ => ("Support", 5),
    }
}

fn resolvers() -> ResolverRegistry {
    let mut resolvers = ResolverRegistry::new();

    resolvers
        .register(
            ResolverSpec::new(
                "SeverityClassifierResolver",
                [incident_summary()],
                [severity(), customer_impact()],
                1.0,
                |ctx: &ResolutionContext| {
                    let summary = ctx.get(&incident_summary()).unwrap().solid_value().to_string();
                    let (severity_value, impact) = classify(&summary);
                    tracing::debug!(severity = severity_value, "classified incident");
                    Ok(vec![
                        ResolverOutput::new(severity(), severity_value).with_source("demo.support"),
                        ResolverOutput::new(customer_impact(), impact).with_source("demo.support"),
                    ])
                },
            )
            .with_description("Classifies an incident summary into a severity and impact blurb")
            .with_impact(severity(), 0.6)
            .with_impact(customer_impact(), 0.4),
        )
        .unwrap();

    resolvers
        .register(
            ResolverSpec::new(
                "AssignmentResolver",
                [severity()],
                [assigned_team(), eta_days()],
                1.0,
                |ctx: &ResolutionContext| {
                    let severity_value = ctx.get(&severity()).unwrap().solid_value().to_string();
                    let (team, eta) = assignment(&severity_value);
                    tracing::debug!(team, eta, "routed incident");
                    Ok(vec![
                        ResolverOutput::new(assigned_team(), team).with_source("demo.support"),
                        ResolverOutput::new(eta_days(), eta).with_source("demo.support"),
                    ])
                },
            )
            .with_description("Routes a classified incident to a team with an ETA")
            .with_impact(assigned_team(), 0.5)
            .with_impact(eta_days(), 0.7),
        )
        .unwrap();

    resolvers
}

#[must_use]
pub fn build() -> Demo {
    Demo {
        name: "support_triage",
        description: "Classifies a support ticket's severity and routes it to a team",
        schemas: schemas(),
        resolvers: resolvers(),
        seed_inputs: vec![(
            incident_summary(),
            FactValueData::from("Checkout service is down for all EU customers"),
        )],
        required: vec![assigned_team(), eta_days()],
    }
}
