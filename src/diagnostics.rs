//! Diagnostics: message formatting and tracing subscriber setup.
//!
//! Everything goes to stderr; stdout is reserved for the rendered document.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Normalize a message for single-line output.
///
/// Messages frequently embed fragments of user documents, which may contain
/// newlines; collapse all whitespace runs so one diagnostic is one line.
pub fn error_message(msg: impl AsRef<str>) -> String {
    msg.as_ref().split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn warn(msg: impl AsRef<str>) {
    tracing::warn!("{}", error_message(msg));
}

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second init (e.g. from tests) is not an error worth surfacing.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
