use tracing_subscriber::{EnvFilter, fmt};

use crate::app::AppError;

/// Diagnostics go to stderr so that JSON output on stdout stays machine-readable.
pub fn init() -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(AppError::logging_init)
}
