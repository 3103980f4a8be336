//! Logging configuration using tracing
//!
//! Structured logging to stderr, so exports written to stdout stay clean.

use crate::MailDbError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies (the
/// configured `log_level`, normally "warn").
///
/// # Example RUST_LOG values
/// - `RUST_LOG=info` - Show every change made to the database
/// - `RUST_LOG=maildb=debug` - Also show lookups and transaction boundaries
///
/// # Errors
/// Returns an error if the subscriber has already been initialized
pub fn init(default_level: &str) -> crate::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| MailDbError::Config(format!("Failed to initialize tracing: {}", e)))?;

    Ok(())
}

/// Initialize logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init("warn");
}
