//! Looks up a forecast for a location, then recommends an outfit and
//! whether to carry an umbrella.

use hashbrown::HashMap;

use resolve_core::resolver::{ResolverOutput, ResolverRegistry, ResolverSpec};
use resolve_core::schema::{FactSchema, SchemaRegistry};
use resolve_core::types::{FactId, FactType, FactValueData};
use resolve_core::ResolutionContext;

use crate::Demo;

pub fn location() -> FactId {
    FactId::from("demo.weather.location")
}

pub fn temperature_f() -> FactId {
    FactId::from("demo.weather.temperature_f")
}

pub fn precip_probability() -> FactId {
    FactId::from("demo.weather.precip_probability")
}

pub fn wardrobe() -> FactId {
    FactId::from("demo.weather.wardrobe")
}

pub fn umbrella_needed() -> FactId {
    FactId::from("demo.weather.umbrella_needed")
}

fn schemas() -> SchemaRegistry {
    let mut schemas = SchemaRegistry::new();
    schemas
        .register(FactSchema::new(
            location(),
            FactType::Str,
            "City or region to look up",
        ))
        .unwrap();
    schemas
        .register(
            FactSchema::new(
                temperature_f(),
                FactType::Float,
                "Forecasted high temperature in Fahrenheit",
            )
            .with_normalizer(|value| match value {
                FactValueData::Float(_) => value,
                FactValueData::Int(n) => FactValueData::Float(n as f64),
                other => other,
            }),
        )
        .unwrap();
    schemas
        .register(
            FactSchema::new(
                precip_probability(),
                FactType::Float,
                "Chance of precipitation as a probability between 0 and 1",
            )
            .with_normalizer(|value| match value {
                FactValueData::Float(n) => FactValueData::Float(n.clamp(0.0, 1.0)),
                FactValueData::Int(n) => FactValueData::Float((n as f64).clamp(0.0, 1.0)),
                other => other,
            }),
        )
        .unwrap();
    schemas
        .register(FactSchema::new(
            wardrobe(),
            FactType::Str,
            "Suggested outfit description based on conditions",
        ))
        .unwrap();
    schemas
        .register(FactSchema::new(
            umbrella_needed(),
            FactType::Bool,
            "Whether to pack an umbrella",
        ))
        .unwrap();
    schemas
}

fn forecast_for(location: &str) -> (f64, f64) {
    let mut table = HashMap::new();
    table.insert("seattle", (58.0, 0.68));
    table.insert("phoenix", (88.0, 0.05));
    table.insert("new york", (72.0, 0.32));
    table
        .get(location.to_lowercase().trim())
        .copied()
        .unwrap_or((70.0, 0.15))
}

fn resolvers() -> ResolverRegistry {
    let mut resolvers = ResolverRegistry::new();

    resolvers
        .register(
            ResolverSpec::new(
                "WeatherLookupResolver",
                [location()],
                [temperature_f(), precip_probability()],
                1.0,
                |ctx: &ResolutionContext| {
                    let location_value = ctx.get(&location()).unwrap().solid_value().to_string();
                    let (temperature, precip) = forecast_for(&location_value);
                    tracing::debug!(location = %location_value, temperature, precip, "looked up forecast");
                    Ok(vec![
                        ResolverOutput::new(temperature_f(), temperature).with_source("demo.weather"),
                        ResolverOutput::new(precip_probability(), precip).with_source("demo.weather"),
                    ])
                },
            )
            .with_description("Looks up a forecast's temperature and precipitation chance")
            .with_impact(temperature_f(), 0.6)
            .with_impact(precip_probability(), 0.4),
        )
        .unwrap();

    resolvers
        .register(
            ResolverSpec::new(
                "WardrobePlannerResolver",
                [temperature_f(), precip_probability()],
                [wardrobe(), umbrella_needed()],
                1.0,
                |ctx: &ResolutionContext| {
                    let temperature = match ctx.get(&temperature_f()).unwrap().solid_value() {
                        FactValueData::Float(n) => *n,
                        other => panic!("temperature fact held unexpected value {other:?}"),
                    };
                    let precip = match ctx.get(&precip_probability()).unwrap().solid_value() {
                        FactValueData::Float(n) => *n,
                        other => panic!("precipitation fact held unexpected value {other:?}"),
                    };
                    let outfit = if temperature < 50.0 {
                        "Warm coat and layers"
                    } else if temperature < 70.0 {
                        "Light jacket"
                    } else {
                        "T-shirt"
                    };
                    let umbrella = precip >= 0.5;
                    tracing::debug!(outfit, umbrella, "planned wardrobe");
                    Ok(vec![
                        ResolverOutput::new(wardrobe(), outfit).with_source("demo.weather"),
                        ResolverOutput::new(umbrella_needed(), umbrella).with_source("demo.weather"),
                    ])
                },
            )
            .with_description("Recommends an outfit and umbrella decision from the forecast")
            .with_impact(wardrobe(), 0.5)
            .with_impact(umbrella_needed(), 0.7),
        )
        .unwrap();

    resolvers
}

#[must_use]
pub fn build() -> Demo {
    Demo {
        name: "weather_planner",
        description: "Looks up a forecast and recommends an outfit and umbrella decision",
        schemas: schemas(),
        resolvers: resolvers(),
        seed_inputs: vec![(location(), FactValueData::from("Seattle"))],
        required: vec![wardrobe(), umbrella_needed()],
    }
}
