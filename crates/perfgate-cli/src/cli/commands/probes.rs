use perfgate_core::model::format_number;
use perfgate_core::Orchestrator;
use serde_json::json;

use super::config_or_default;
use crate::cli::args::{OutputFormat, ProbesArgs};
use crate::exit_codes::{EXIT_CONFIG_ERROR, EXIT_SUCCESS};

pub fn run(args: ProbesArgs) -> anyhow::Result<i32> {
    let orchestrator = match config_or_default(args.config.as_deref())
        .and_then(|cfg| Orchestrator::from_config(&cfg))
    {
        Ok(o) => o,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(EXIT_CONFIG_ERROR);
        }
    };

    match args.format {
        OutputFormat::Json => {
            let rows: Vec<_> = orchestrator
                .probes()
                .iter()
                .map(|p| {
                    json!({
                        "name": p.name(),
                        "description": p.probe.description(),
                        "threshold": p.spec.threshold,
                        "warnFactor": p.spec.warn_factor,
                        "criticalFactor": p.spec.critical_factor,
                        "higherIsBetter": p.spec.higher_is_better,
                        "unit": p.spec.unit,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            println!(
                "{:<30} {:>12} {:>6} {:>6}",
                "PROBE", "THRESHOLD", "WARN", "CRIT"
            );
            for p in orchestrator.probes() {
                let cmp = if p.spec.higher_is_better { ">=" } else { "<=" };
                let threshold = format!(
                    "{} {}{}",
                    cmp,
                    format_number(p.spec.threshold),
                    p.spec.unit.suffix()
                );
                println!(
                    "{:<30} {:>12} {:>6} {:>6}",
                    p.name(),
                    threshold,
                    format!("x{}", format_number(p.spec.warn_factor)),
                    format!("x{}", format_number(p.spec.critical_factor)),
                );
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
