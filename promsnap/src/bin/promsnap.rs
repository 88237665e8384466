use std::io::Read;

use anyhow::Result;
use clap::Parser;
use itertools::Itertools;

use promsnap::lexer::MetricKind;
use promsnap::{histogram, query};

#[derive(Debug, Parser)]
struct Args {
    /// Exposition document to read, "-" for stdin
    #[clap(short, long, default_value = "-")]
    input: String,

    /// Dump the whole snapshot as JSON instead of a summary
    #[clap(long)]
    json: bool,

    /// Print percentile tables for histogram families
    #[clap(long)]
    histograms: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let data = if args.input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(&args.input)?
    };

    let snapshot = promsnap::parse(&data);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    for (name, family) in snapshot.families.iter().sorted_by_key(|(name, _)| *name) {
        println!("{} ({}, {} samples)", name, family.kind, family.samples.len());
        if !family.help.is_empty() {
            println!("  {}", family.help);
        }

        match family.kind {
            MetricKind::Histogram if args.histograms => {
                for group in histogram::analyze(family)? {
                    println!(
                        "  {{{}}} count={} sum={}",
                        group
                            .labels
                            .iter()
                            .map(|(key, value)| format!("{}=\"{}\"", key, value))
                            .join(","),
                        group.count,
                        group.sum,
                    );
                    for (label, value) in [
                        ("p50", group.p50),
                        ("p90", group.p90),
                        ("p95", group.p95),
                        ("p99", group.p99),
                    ] {
                        println!("    {} {}", label, fmt_percentile(value));
                    }
                }
            }
            MetricKind::Gauge => {
                println!("  value: {}", query::gauge_value(family));
            }
            _ => {
                for sample in family.samples.iter() {
                    println!("  {:?}", sample);
                }
            }
        }
        println!();
    }

    for error in snapshot.parse_errors.iter() {
        eprintln!("{}", error);
    }

    Ok(())
}

fn fmt_percentile(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.4}", value),
        None => "-".to_string(),
    }
}
