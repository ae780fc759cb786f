use std::sync::Arc;

use perfgate_core::baseline::compare;
use perfgate_core::config::Config;
use perfgate_core::report::console::render_baseline;
use perfgate_core::report::json::{read_json, to_json_string, write_json, ReportArtifact};
use perfgate_core::report::junit::write_junit;
use perfgate_core::report::progress::stderr_progress_sink;
use perfgate_core::store::ReplayStore;
use perfgate_core::{CancellationToken, ConfigError, Orchestrator};

use super::config_or_default;
use crate::cli::args::{OutputFormat, RunArgs};
use crate::exit_codes::{EXIT_CONFIG_ERROR, EXIT_SUCCESS, EXIT_UNHEALTHY};

fn effective_config(args: &RunArgs) -> Result<Config, ConfigError> {
    let mut cfg = config_or_default(args.config.as_deref())?;
    if let Some(ms) = args.timeout_ms {
        cfg.settings.timeout_ms = ms;
    }
    if let Some(n) = args.concurrency {
        cfg.settings.concurrency = n;
    }
    Ok(cfg)
}

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let orchestrator = match effective_config(&args).and_then(|cfg| Orchestrator::from_config(&cfg)) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(EXIT_CONFIG_ERROR);
        }
    };

    let store = match ReplayStore::from_path(&args.snapshot) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("snapshot error: {:#}", e);
            return Ok(EXIT_CONFIG_ERROR);
        }
    };

    let baseline = match &args.baseline {
        Some(path) => match read_json(path) {
            Ok(a) => Some(a),
            Err(e) => {
                eprintln!("baseline error: {:#}", e);
                return Ok(EXIT_CONFIG_ERROR);
            }
        },
        None => None,
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping after running probes finish");
                cancel.cancel();
            }
        });
    }

    let progress = if args.no_progress {
        None
    } else {
        stderr_progress_sink(orchestrator.probes().len())
    };
    let report = orchestrator
        .run_with(Arc::new(store), &cancel, progress)
        .await;

    match args.format {
        OutputFormat::Text => print!("{}", report.render()),
        OutputFormat::Json => println!("{}", to_json_string(&report)?),
    }

    if let Some(path) = &args.json_out {
        write_json(&report, path)?;
    }
    if let Some(path) = &args.junit_out {
        write_junit(&report, path)?;
    }

    let mut code = if report.is_healthy() {
        EXIT_SUCCESS
    } else {
        EXIT_UNHEALTHY
    };

    if let Some(previous) = baseline {
        let diff = compare(&previous, &ReportArtifact::from(&report));
        eprint!("{}", render_baseline(&diff));
        if args.strict_baseline && diff.has_regressions() {
            code = EXIT_UNHEALTHY;
        }
    }

    Ok(code)
}
