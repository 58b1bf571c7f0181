//! Logging and tracing setup.
//!
//! Adapters and the provider emit `tracing` events: `debug` for every remote
//! call, `info` for completed lifecycle operations, `warn` for partial creates
//! and deletes of entities that were already gone. These helpers install a
//! subscriber writing to **stderr**, leaving stdout to the host process.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `hemmer_rest_provider=debug`)
//!
//! ```bash
//! # Trace every remote call made by the adapters
//! RUST_LOG=hemmer_rest_provider::adapter=debug ./my-provider
//! ```

use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter};

/// The level used when `RUST_LOG` is not set.
pub const DEFAULT_LEVEL: &str = "info";

fn subscriber(default_level: &str) -> impl tracing::Subscriber + Send + Sync {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    Registry::default().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    )
}

/// Initialize the default logging subscriber at [`DEFAULT_LEVEL`].
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_LEVEL);
}

/// Initialize logging with a custom default level used when `RUST_LOG` is
/// not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    subscriber(default_level).init();
}

/// Try to initialize logging, returning false if already initialized.
///
/// Integration tests call this from every test, since only the first call in
/// a process can install the subscriber.
pub fn try_init_logging() -> bool {
    subscriber(DEFAULT_LEVEL).try_init().is_ok()
}

#[cfg(test)]
mod tests {
    // The global subscriber can only be set once per process, so only the
    // non-panicking initializer is exercised here.

    use super::*;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new(DEFAULT_LEVEL).is_ok());
        assert!(EnvFilter::try_new("hemmer_rest_provider=debug").is_ok());
        assert!(EnvFilter::try_new("warn,hemmer_rest_provider::adapter=trace").is_ok());
    }

    #[test]
    fn test_try_init_is_repeatable() {
        let _ = try_init_logging();
        assert!(!try_init_logging());
    }
}
