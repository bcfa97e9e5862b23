//! Tracing subscriber setup
//!
//! `BOMSIM_LOG` takes precedence over `RUST_LOG`; both accept the usual
//! `EnvFilter` directives (e.g. `BOMSIM_LOG=bomsim::core::rollup=debug`).

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable checked before `RUST_LOG`
pub const LOG_ENV: &str = "BOMSIM_LOG";

/// Filter used when no environment variable is set
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    }
}

fn filter(verbose: bool, quiet: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)))
}

/// Install the global subscriber, writing to stderr
///
/// Safe to call more than once; later calls are ignored.
pub fn init(verbose: bool, quiet: bool) {
    let _ = fmt()
        .with_env_filter(filter(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_line_number(verbose)
        .try_init();
}

/// Subscriber for unit tests, captured by the test harness
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
