//! Process-wide tracing setup shared by binaries and test harnesses.
//!
//! `appfold-infra`'s integration tests call [`init`] before driving controllers.

/// Initialize process-wide tracing with defaults read from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&tracing::TracingConfig::from_env());
}

/// Tracing configuration (filters, output format).
pub mod tracing;
