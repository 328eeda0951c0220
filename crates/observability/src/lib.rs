//! Process-wide logging setup shared by the binaries.

pub mod tracing;

pub use crate::tracing::{LogFormat, LogSettings};

/// Initialise logging from the environment (`RUST_LOG`, `LOG_FORMAT`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    crate::tracing::init(LogSettings::from_env());
}
