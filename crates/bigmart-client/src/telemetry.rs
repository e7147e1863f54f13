//! # Tracing Setup
//!
//! ## Log Levels
//! - ERROR: nothing in this crate logs at error; failures go to the caller
//! - WARN: rejected writes, unknown config values, closed subscriptions
//! - INFO: sign-in/out, config loaded, connectivity changes
//! - DEBUG: every store read/write and snapshot applied
//!
//! `RUST_LOG` wins over the configured filter.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "info,bigmart=debug";

/// Installs the global fmt subscriber.
///
/// Returns false if a global subscriber was already installed (for example
/// by a test harness or the host application); the existing one is kept.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing(DEFAULT_FILTER);
        assert!(!init_tracing("not a [valid filter"));
    }
}
