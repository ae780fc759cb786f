use super::super::args::*;
use crate::exit_codes::EXIT_SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => super::run::run(args).await,
        Command::Probes(args) => super::probes::run(args),
        Command::Validate(args) => Ok(super::validate::run(args)),
        Command::Init(args) => super::init::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(EXIT_SUCCESS)
        }
    }
}
