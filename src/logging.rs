//! # Logging
//! src/logging.rs
//!
//! Subscriber de `tracing` con filtro desde `RUST_LOG` (por defecto `info`).

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Instala el subscriber global. Llamadas repetidas no tienen efecto.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .try_init();
}
