use tracing_subscriber::EnvFilter;

/// Install the stderr `tracing` subscriber for the binaries.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` (count of `-v` flags)
/// picks warn, info, debug or trace for this crate.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,badge_2048={level}")));
    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
