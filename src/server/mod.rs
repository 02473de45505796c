//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! 1. Enlaza el listener TCP
//! 2. Acepta conexiones, un thread por conexión
//! 3. Parsea el request, lo enruta y escribe la respuesta
//! 4. Se detiene de forma ordenada al recibir una señal

pub mod shutdown;
pub mod state;
pub mod tcp;

pub use shutdown::{spawn_signal_listener, ShutdownHandle};
pub use state::AppState;
pub use tcp::{routes, Server};
