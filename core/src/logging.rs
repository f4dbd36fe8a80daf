use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize a compact stdout subscriber for binaries.
/// - Respects `RUST_LOG` if set, defaults to `info`
/// - Safe to call more than once; later calls are ignored
pub fn init_logging_default() {
    init_logging("info");
}

/// Same as `init_logging_default` with a caller-chosen fallback filter.
pub fn init_logging(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}
