//! Logging setup for demos, benches and tests.

/// Development helper: initialize tracing subscriber when `RUST_LOG` is set.
///
/// Demos, benches and tests can call `linkmq::dev_tracing::init_tracing()` to
/// see connection lifecycle and transport events. This is a no-op when
/// `RUST_LOG` is not set or when a global subscriber is already installed.
pub fn init_tracing() {
    use std::env;

    if env::var("RUST_LOG").is_ok() {
        // Best-effort: a subscriber may already be installed by the host
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_thread_names(true)
            .try_init();
    }
}
