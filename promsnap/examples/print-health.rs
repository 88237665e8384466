use anyhow::{anyhow, Result};
use indoc::indoc;

use promsnap::health::{health_level, MetricThreshold};
use promsnap::query;

fn main() -> Result<()> {
    let scrape = indoc! {r#"
        # HELP queue_depth Messages waiting to be delivered
        # TYPE queue_depth gauge
        queue_depth 42
        # HELP active_workers Workers currently accepting jobs
        # TYPE active_workers gauge
        active_workers 3
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

    // Higher is worse for queue depth, lower is worse for worker count.
    let depth_limits = MetricThreshold {
        warning: 25.,
        critical: 100.,
        unit: "msgs".to_string(),
        inverse: false,
    };
    let worker_limits = MetricThreshold {
        warning: 4.,
        critical: 1.,
        unit: "workers".to_string(),
        inverse: true,
    };

    for (name, limits) in [("queue_depth", depth_limits), ("active_workers", worker_limits)] {
        let family = snapshot
            .families
            .get(name)
            .ok_or(anyhow!("family «{}» went missing?", name))?;
        let value = query::gauge_value(family);

        println!(
            "{} = {} {} [{}]",
            name,
            value,
            limits.unit,
            health_level(value, &limits)
        );
    }

    Ok(())
}
