// Logging setup
//
// Diagnostics go to stderr so stdout stays clean for command output.

use tracing_subscriber::EnvFilter;

/// Default filter for a `-v` count
fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,gpsmodel=info",
        2 => "warn,gpsmodel=debug",
        _ => "warn,gpsmodel=trace",
    }
}

/// Install the global subscriber; `RUST_LOG` wins over `verbosity`
pub fn init(verbosity: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| level_for(verbosity).into());

    // A subscriber may already be installed (tests); keep it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
