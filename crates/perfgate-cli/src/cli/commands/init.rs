use perfgate_core::config::write_sample_config;

use crate::cli::args::InitArgs;
use crate::exit_codes::{EXIT_CONFIG_ERROR, EXIT_SUCCESS};

pub fn run(args: InitArgs) -> anyhow::Result<i32> {
    if args.config.exists() && !args.force {
        eprintln!(
            "{} already exists (use --force to overwrite)",
            args.config.display()
        );
        return Ok(EXIT_CONFIG_ERROR);
    }
    write_sample_config(&args.config)?;
    println!("wrote {}", args.config.display());
    Ok(EXIT_SUCCESS)
}
