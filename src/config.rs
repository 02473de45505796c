//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI o variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./task_server --port 9000 --max-concurrent-tasks 4
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! PORT=9000 MAX_CONCURRENT_TASKS=4 ./task_server
//! ```

use crate::error::ConfigError;
use crate::tasks::dispatcher::DEFAULT_MAX_CONCURRENT;
use clap::Parser;
use std::time::Duration;
use tracing::info;

/// Configuración del servidor de tareas
#[derive(Debug, Clone, Parser)]
#[command(name = "task_server")]
#[command(about = "Servidor HTTP de tareas asíncronas con concurrencia acotada")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    pub host: String,

    /// Máximo de tareas ejecutando a la vez.
    ///
    /// Valores no numéricos o cero se reemplazan por 10.
    #[arg(
        long = "max-concurrent-tasks",
        default_value = "10",
        env = "MAX_CONCURRENT_TASKS",
        value_parser = parse_concurrency
    )]
    pub max_concurrent_tasks: usize,

    /// Tiempo máximo para que terminen las conexiones abiertas al apagar (ms)
    #[arg(long = "shutdown-grace-ms", default_value = "5000", env = "SHUTDOWN_GRACE_MS")]
    pub shutdown_grace_ms: u64,
}

/// Parser tolerante del límite de concurrencia: nunca falla
fn parse_concurrency(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Ok(DEFAULT_MAX_CONCURRENT),
    }
}

impl Config {
    /// Parsea argumentos CLI y variables de entorno
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección completa para bind (host:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_tasks == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn print_summary(&self) {
        info!(
            address = %self.address(),
            max_concurrent_tasks = self.max_concurrent_tasks,
            shutdown_grace_ms = self.shutdown_grace_ms,
            "configuration loaded"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT,
            shutdown_grace_ms: 5_000,
        }
    }
}
