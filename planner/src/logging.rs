//! Log subscriber set-up for the snapshot CLI.
//!
//! The library modules only emit records through the `log` facade; the binary
//! installs a `tracing-subscriber` formatter on stderr once at start-up and
//! bridges `log` records into it. `RUST_LOG` refines the level derived from
//! `-v`/`-q`.

use log::LevelFilter;
use tracing_subscriber::filter::{EnvFilter, LevelFilter as SubscriberLevel};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Map CLI verbosity to a level filter.
///
/// `quiet` wins over any verbosity and keeps only errors.
#[must_use]
pub const fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

const fn subscriber_level(level: LevelFilter) -> SubscriberLevel {
    match level {
        LevelFilter::Off => SubscriberLevel::OFF,
        LevelFilter::Error => SubscriberLevel::ERROR,
        LevelFilter::Warn => SubscriberLevel::WARN,
        LevelFilter::Info => SubscriberLevel::INFO,
        LevelFilter::Debug => SubscriberLevel::DEBUG,
        LevelFilter::Trace => SubscriberLevel::TRACE,
    }
}

fn env_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(subscriber_level(level).into())
        .from_env_lossy()
}

/// Install the stderr subscriber and the `log` bridge.
///
/// # Errors
///
/// Returns [`TryInitError`] if a global subscriber or logger is already
/// installed.
pub fn init(verbosity: u8, quiet: bool) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(level_for(verbosity, quiet)))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .try_init()
}
