//! # Task Server
//! src/lib.rs
//!
//! Servidor HTTP que acepta tareas de larga duración, las ejecuta en
//! segundo plano con un límite de concurrencia y expone su estado.
//!
//! ## Arquitectura
//!
//! - `tasks`: entidad, registro, pool de admisión, dispatcher y handlers
//! - `http`: parsing de requests y construcción de respuestas
//! - `router`: enrutamiento por método y patrón de path
//! - `server`: listener TCP, estado compartido y apagado ordenado
//! - `metrics`: métricas HTTP
//! - `config`, `logging`, `error`: configuración, logs y errores
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use task_server::config::Config;
//! use task_server::server::{Server, ShutdownHandle};
//! use task_server::tasks::TaskManager;
//!
//! let config = Config::default();
//! let manager = TaskManager::from_config(&config);
//! let server = Server::bind(&config, manager).unwrap();
//! server.run(ShutdownHandle::new()).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod router;
pub mod server;
pub mod tasks;
