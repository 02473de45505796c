//! # Motor de Tareas
//! src/tasks/mod.rs
//!
//! Ciclo de vida de las tareas asíncronas:
//!
//! ```text
//! POST /tasks → TaskManager::submit
//!                 ├─ TaskRegistry::create     (Pending, visible en GET)
//!                 └─ Dispatcher::submit       (thread propio, retorna ya)
//!                       └─ AdmissionPool      (a lo sumo N en InProgress)
//!                             └─ Work::run    (Completed / Failed)
//! ```

pub mod admission;
pub mod dispatcher;
pub mod handlers;
pub mod manager;
pub mod registry;
pub mod task;
pub mod work;

pub use dispatcher::Dispatcher;
pub use manager::TaskManager;
pub use registry::TaskRegistry;
pub use task::{Task, TaskSnapshot, TaskStatus, TaskView};
pub use work::{SimulatedWork, Work, WorkFailure};
