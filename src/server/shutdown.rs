//! # Apagado Ordenado
//! src/server/shutdown.rs
//!
//! El servidor es síncrono; las señales del SO se esperan con `tokio::signal`
//! en un runtime `current_thread` que vive en su propio thread. Al llegar
//! SIGINT, SIGTERM o SIGQUIT (Ctrl-C fuera de Unix) se activa el
//! `ShutdownHandle` y el loop de aceptación deja de aceptar conexiones.

use crate::error::ServerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info};

/// Bandera compartida de apagado
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solicita el apagado. Idempotente.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(name)
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl-C")
}

/// Lanza el thread que espera señales y activa `handle` al recibir una
pub fn spawn_signal_listener(handle: ShutdownHandle) -> Result<JoinHandle<()>, ServerError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ServerError::Signal)?;

    thread::Builder::new()
        .name("signal-listener".to_string())
        .spawn(move || match runtime.block_on(wait_for_shutdown_signal()) {
            Ok(signal) => {
                info!(signal, "shutdown signal received");
                handle.trigger();
            }
            Err(e) => error!(error = %e, "failed to listen for shutdown signals"),
        })
        .map_err(ServerError::Signal)
}
