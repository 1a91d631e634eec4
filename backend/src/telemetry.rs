//! Tracing subscriber initialisation.

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppSettings;

/// Install the global tracing subscriber.
///
/// Filtering follows `RUST_LOG`; the output format follows the configured
/// `log_json` flag. A second call warns and keeps the existing subscriber.
pub fn init(settings: &AppSettings) {
    let result = if settings.log_json {
        fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .json()
            .try_init()
    } else {
        fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init()
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}
