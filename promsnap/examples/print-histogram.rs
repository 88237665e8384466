use anyhow::{anyhow, Result};
use indoc::indoc;
use itertools::Itertools;

use promsnap::histogram;
use promsnap::lexer::MetricKind;

fn main() -> Result<()> {
    let scrape = indoc! {r#"
        # HELP request_duration_seconds Time spent serving requests
        # TYPE request_duration_seconds histogram
        request_duration_seconds_bucket{route="/api",le="0.1"} 24
        request_duration_seconds_bucket{route="/api",le="0.5"} 88
        request_duration_seconds_bucket{route="/api",le="1"} 100
        request_duration_seconds_bucket{route="/api",le="+Inf"} 100
        request_duration_seconds_sum{route="/api"} 31.7
        request_duration_seconds_count{route="/api"} 100
    "#};

    let mut args = std::env::args();

    let progname = args.next().ok_or(anyhow!("ARGV[0] was not set??"))?;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" => {
                println!("Usage: {} [--print-exposition]", progname);
                return Ok(());
            }
            "--print-exposition" => {
                println!("Exposition:\n\n{}", scrape);
            }
            arg => return Err(anyhow!("Unknown argument: {}", arg)),
        }
    }

    let snapshot = promsnap::parse(scrape);

    let family = snapshot
        .families
        .get("request_duration_seconds")
        .ok_or(anyhow!("empty exposition?"))?;

    assert_eq!(MetricKind::Histogram, family.kind);

    for group in histogram::analyze(family)? {
        println!(
            "{{{}}}: count={} sum={}s",
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
            match value {
                Some(value) => println!("  {} ≈ {:.4}s", label, value),
                None => println!("  {} undefined (no observations)", label),
            }
        }
    }

    Ok(())
}
