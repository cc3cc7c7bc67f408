//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the level follows `-q`/`-v`.
//! Logs always go to stderr so `--json` output on stdout stays clean.

use crate::config::Verbosity;
use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Filter for the given verbosity, honouring `RUST_LOG`
#[must_use]
pub fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_tracing(verbosity: Verbosity) {
    TRACING_INIT.call_once(|| {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(verbosity == Verbosity::Debug)
            .without_time();

        // A test harness may already own the global subscriber
        let _ = tracing_subscriber::registry()
            .with(layer)
            .with(env_filter(verbosity))
            .try_init();
    });
}
