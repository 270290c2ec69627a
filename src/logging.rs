use std::sync::OnceLock;

use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

static INSTALL_GUARD: OnceLock<()> = OnceLock::new();

/// Install the global subscriber: `RUST_LOG` filtering (default `info`) and a
/// compact formatter. Later calls are no-ops.
pub fn init_tracing() {
    INSTALL_GUARD.get_or_init(|| {
        // `log` records from dependencies; fails only if a logger exists
        let _ = LogTracer::init();

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = fmt::layer()
            .with_timer(SystemTime)
            .with_target(true)
            .with_thread_names(true)
            .with_ansi(false)
            .compact();

        // another subscriber may already be installed by the host application
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();
    });
}
