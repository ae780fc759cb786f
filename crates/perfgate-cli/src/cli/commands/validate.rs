use perfgate_core::Orchestrator;

use crate::cli::args::ValidateArgs;
use crate::exit_codes::{EXIT_CONFIG_ERROR, EXIT_SUCCESS};

pub fn run(args: ValidateArgs) -> i32 {
    let checked = perfgate_core::config::load_config(&args.config)
        .and_then(|cfg| Orchestrator::from_config(&cfg));
    match checked {
        Ok(o) => {
            println!(
                "{}: ok ({} probes enabled, concurrency {}, timeout {} ms)",
                args.config.display(),
                o.probes().len(),
                o.concurrency(),
                o.timeout().as_millis()
            );
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", args.config.display(), e);
            EXIT_CONFIG_ERROR
        }
    }
}
