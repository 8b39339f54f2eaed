use std::io::IsTerminal as _;

use tracing_subscriber::EnvFilter;

const DEBUG_DIRECTIVES: &str = "warn,custbench=debug,custbench_core=debug,custbench_stripe=debug";

/// Installs the stderr subscriber. `RUST_LOG` wins over `--debug` when set.
pub(crate) fn init(debug: bool) {
    let default = if debug { DEBUG_DIRECTIVES } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(debug)
        .try_init();
}
