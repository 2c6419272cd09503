//! Tracing/logging setup shared by storefront binaries.

/// Initialize process-wide tracing with the defaults (JSON, `RUST_LOG` or `info`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    self::tracing::init_with(&self::tracing::TracingConfig::default());
}

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogFormat, LogFormatError, TracingConfig, init_with};
