//! Logging configuration for partstrack.
//!
//! Log lines go to stderr so `--json` output on stdout stays parseable.
//! Tracking sync has its own target: rate limits and lookup failures are
//! already shown to the user as notices, so at normal verbosity the sync
//! module only logs errors. The HTTP stack is held at `warn` until `-vv`.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Target for everything in this crate.
pub const CRATE_TARGET: &str = "partstrack";

/// Target for tracking lookups and the single-flight client.
pub const SYNC_TARGET: &str = "partstrack::sync";

const HTTP_TARGETS: [&str; 3] = ["reqwest", "hyper", "hyper_util"];

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Info and above; sync diagnostics limited to errors.
    #[default]
    Normal,
    /// Debug and above, including refresh policy decisions.
    Verbose,
    /// Everything, including carrier rule matches and HTTP internals.
    Trace,
}

impl Verbosity {
    /// Level for the crate as a whole.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Level for [`SYNC_TARGET`].
    #[must_use]
    pub fn sync_level(&self) -> Level {
        match self {
            Self::Quiet | Self::Normal => Level::ERROR,
            Self::Verbose | Self::Trace => self.to_level_filter(),
        }
    }

    /// Level for reqwest and hyper.
    #[must_use]
    pub fn http_level(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal | Self::Verbose => Level::WARN,
            Self::Trace => Level::DEBUG,
        }
    }
}

fn directive(target: &str, level: Level) -> String {
    format!("{target}={}", level.as_str().to_ascii_lowercase())
}

/// Default `EnvFilter` directives for a verbosity.
#[must_use]
pub fn filter_directives(verbosity: Verbosity) -> String {
    let mut directives = vec![
        directive(CRATE_TARGET, verbosity.to_level_filter()),
        directive(SYNC_TARGET, verbosity.sync_level()),
    ];
    directives.extend(
        HTTP_TARGETS
            .iter()
            .map(|target| directive(target, verbosity.http_level())),
    );
    directives.join(",")
}

/// Initialize the logging system.
///
/// Call once at startup. `RUST_LOG` replaces the default directives.
///
/// # Examples
///
/// ```no_run
/// use partstrack::{init_logging, logging::Verbosity};
///
/// // Show refresh decisions and sync outcomes
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(verbosity)));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(verbosity != Verbosity::Normal)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );

    // Already installed is fine
    let _ = subscriber.try_init();
}

/// Initialize warn-level logging routed to the test writer.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
