use std::process;

use clap::Parser;
use resolve_cli::{App, Command, RunArgs, SchemaArgs};
use resolve_core::planner::{Planner, PlannerResult};
use resolve_core::types::{FactId, FactValueData};
use resolve_core::ResolutionContext;
use resolve_demos::Demo;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let app = App::parse();
    match &app.command {
        Command::List => list(),
        Command::Schema(args) => schema(args),
        Command::Run(args) => run(args, false),
        Command::Trace(args) => run(args, true),
        Command::Resolvers(args) => resolvers(args),
    }
}

fn demo_or_exit(name: &str) -> Demo {
    resolve_demos::by_name(name).unwrap_or_else(|| {
        eprintln!("No such demo: {name}");
        eprintln!(
            "Available demos: {}",
            resolve_demos::catalog()
                .iter()
                .map(|d| d.name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        process::exit(1);
    })
}

fn list() {
    for demo in resolve_demos::catalog() {
        println!("{:<16} {}", demo.name, demo.description);
    }
}

fn schema(args: &SchemaArgs) {
    let demo = demo_or_exit(&args.demo);
    let snapshot = demo.schemas.snapshot();
    let json = serde_json::to_string_pretty(&snapshot).unwrap_or_else(|e| {
        eprintln!("Failed to serialize schema: {e}");
        process::exit(1);
    });
    println!("{json}");
}

fn resolvers(args: &SchemaArgs) {
    let demo = demo_or_exit(&args.demo);
    let descriptors = demo.resolvers.explain();
    let json = serde_json::to_string_pretty(&descriptors).unwrap_or_else(|e| {
        eprintln!("Failed to serialize resolver descriptors: {e}");
        process::exit(1);
    });
    println!("{json}");
}

fn parse_value(raw: &str) -> FactValueData {
    if let Ok(b) = raw.parse::<bool>() {
        FactValueData::Bool(b)
    } else if let Ok(n) = raw.parse::<i64>() {
        FactValueData::Int(n)
    } else if let Ok(n) = raw.parse::<f64>() {
        FactValueData::Float(n)
    } else {
        FactValueData::Str(raw.to_owned())
    }
}

fn run(args: &RunArgs, explain: bool) {
    let demo = demo_or_exit(&args.demo);

    let mut ctx = ResolutionContext::new();
    ctx.seed(&demo.schemas, demo.seed_inputs.clone()).unwrap_or_else(|e| {
        eprintln!("Failed to seed demo inputs: {e}");
        process::exit(1);
    });

    let extra_inputs = args
        .inputs
        .iter()
        .map(|(k, v)| (FactId::from(k.clone()), parse_value(v)));
    ctx.seed(&demo.schemas, extra_inputs).unwrap_or_else(|e| {
        eprintln!("Failed to seed --input facts: {e}");
        process::exit(1);
    });

    let mut required = demo.required.clone();
    required.extend(args.required.iter().cloned().map(FactId::from));

    let user_priority: hashbrown::HashMap<FactId, f64> = args
        .priorities
        .iter()
        .map(|(k, v)| (FactId::from(k.clone()), *v))
        .collect();

    let planner = Planner::new(&demo.resolvers, &demo.schemas);
    let result = planner
        .run_with_priority(&mut ctx, &required, &user_priority)
        .unwrap_or_else(|e| {
            eprintln!("Resolution failed: {e}");
            process::exit(1);
        });

    if !matches!(result, PlannerResult::Satisfied) {
        let missing = ctx.missing(&required);
        eprintln!(
            "Resolution did not complete: {result:?} (still missing: {})",
            missing.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );
    }

    if explain {
        println!("trace: {}", ctx.trace.join(" -> "));
        for fact_id in &required {
            match ctx.get(fact_id) {
                Some(fv) => println!(
                    "{fact_id}: {} [{:?}] confidence={:.2} provenance={:?} notes={:?}",
                    fv.external_value(),
                    fv.status,
                    fv.confidence,
                    fv.provenance,
                    fv.notes
                ),
                None => println!("{fact_id}: <missing>"),
            }
        }
    } else {
        for fact_id in &required {
            match ctx.get(fact_id) {
                Some(fv) => println!("{fact_id}: {}", fv.external_value()),
                None => println!("{fact_id}: <missing>"),
            }
        }
    }

    if !matches!(result, PlannerResult::Satisfied) {
        process::exit(1);
    }
}
