pub mod dispatch;
pub mod init;
pub mod probes;
pub mod run;
pub mod validate;

pub use dispatch::dispatch;

use perfgate_core::config::{load_config, Config};
use perfgate_core::ConfigError;
use std::path::Path;

/// Config from `path`, or the built-in defaults when no path was given.
pub(crate) fn config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(p) => load_config(p),
        None => Ok(Config::default()),
    }
}
