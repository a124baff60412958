//! resolve CLI -- run and inspect the packaged fact-resolution demos.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "resolve", about = "Fact-resolution engine command line")]
pub struct App {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the packaged demo scenarios
    List,
    /// Print a demo's fact schema as JSON
    Schema(SchemaArgs),
    /// Resolve a demo's required facts and print the final values
    Run(RunArgs),
    /// Resolve a demo's required facts and print a full execution trace
    Trace(RunArgs),
    /// Print a demo's registered resolvers as JSON descriptors
    Resolvers(SchemaArgs),
}

#[derive(Debug, Parser)]
pub struct SchemaArgs {
    /// Which packaged demo to inspect
    #[arg(long)]
    pub demo: String,
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Which packaged demo to resolve
    #[arg(long)]
    pub demo: String,
    /// Extra `fact_id=value` inputs, layered on top of the demo's own seed
    /// inputs. May be given more than once.
    #[arg(long = "input", value_parser = parse_input)]
    pub inputs: Vec<(String, String)>,
    /// Extra required facts, layered on top of the demo's own required set.
    /// May be given more than once.
    #[arg(long = "required")]
    pub required: Vec<String>,
    /// Per-fact planner priority weight as `fact_id=weight`, used in the
    /// planner's benefit/cost score. Facts with no entry default to `1.0`.
    /// May be given more than once.
    #[arg(long = "priority", value_parser = parse_priority)]
    pub priorities: Vec<(String, f64)>,
}

fn parse_input(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected fact_id=value, got {raw:?}"))
}

fn parse_priority(raw: &str) -> Result<(String, f64), String> {
    let (fact_id, weight) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected fact_id=weight, got {raw:?}"))?;
    let weight: f64 = weight
        .parse()
        .map_err(|_| format!("expected a numeric weight, got {weight:?}"))?;
    Ok((fact_id.to_owned(), weight))
}
