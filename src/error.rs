//! # Errores del servidor
//! src/error.rs
//!
//! Tipos de error para configuración, registro de tareas y arranque del
//! servidor. Las condiciones normales del ciclo de vida (Failed, not found)
//! no son errores: se reportan como estado o como `Option`.

use thiserror::Error;
use uuid::Uuid;

/// Configuración inválida
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max concurrent tasks must be >= 1")]
    ZeroConcurrency,

    #[error("host must not be empty")]
    EmptyHost,
}

/// Violaciones de precondición del registro de tareas
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("task {0} is already registered")]
    DuplicateId(Uuid),
}

/// Errores fatales del proceso servidor
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("listener error: {0}")]
    Listener(#[source] std::io::Error),

    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
}
