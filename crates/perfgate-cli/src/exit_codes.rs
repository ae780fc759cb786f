//! Process exit codes. Part of the CLI contract; CI pipelines branch on them.

pub const EXIT_SUCCESS: i32 = 0;
/// At least one FAILED or CRITICAL probe, or a baseline regression with `--strict-baseline`.
pub const EXIT_UNHEALTHY: i32 = 1;
/// Unreadable or invalid config, snapshot or baseline; IO failure writing outputs.
pub const EXIT_CONFIG_ERROR: i32 = 2;
