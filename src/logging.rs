//! Tracing subscriber wiring.
//!
//! Env-filter driven, defaults to `info`, safe to call more than once
//! (subsequent calls are no-ops).

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber reading `FILTMGR_LOG` (falling back
/// to `info`). Idempotent — a second call is ignored rather than panicking.
pub fn init() {
    let filter = EnvFilter::try_from_env("FILTMGR_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
