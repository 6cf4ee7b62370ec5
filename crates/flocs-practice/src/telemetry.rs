//! Tracing subscriber setup
//!
//! `RUST_LOG` controls the filter (default `info,flocs_practice=debug`).
//! `FLOCS_LOG_FORMAT=json` switches to structured JSON lines.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,flocs_practice=debug"));

    let registry = tracing_subscriber::registry().with(filter);

    match std::env::var("FLOCS_LOG_FORMAT").as_deref() {
        Ok("json") => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}
