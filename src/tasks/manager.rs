//! # Gestor de Tareas
//! src/tasks/manager.rs
//!
//! Une el registro y el dispatcher: crea la tarea en Pending, la registra y
//! la entrega al dispatcher. Los handlers HTTP solo hablan con este tipo.

use crate::config::Config;
use crate::error::RegistryError;
use crate::tasks::dispatcher::Dispatcher;
use crate::tasks::registry::TaskRegistry;
use crate::tasks::task::{Task, TaskSnapshot};
use crate::tasks::work::{SimulatedWork, Work};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Gestor central de tareas
#[derive(Clone)]
pub struct TaskManager {
    registry: Arc<TaskRegistry>,
    dispatcher: Dispatcher,
}

impl TaskManager {
    /// Crea un gestor con un registro vacío
    pub fn new(max_concurrent: usize, work: Arc<dyn Work>) -> Self {
        Self::with_registry(Arc::new(TaskRegistry::new()), Dispatcher::new(max_concurrent, work))
    }

    pub fn with_registry(registry: Arc<TaskRegistry>, dispatcher: Dispatcher) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    /// Gestor de producción: trabajo simulado y límite tomado de la configuración
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_concurrent_tasks, Arc::new(SimulatedWork::default()))
    }

    /// Crea, registra y despacha una tarea nueva.
    ///
    /// Retorna la instancia compartida; su estado evoluciona en segundo plano.
    pub fn submit(&self) -> Result<Arc<Task>, RegistryError> {
        self.submit_with_snapshot().map(|(task, _)| task)
    }

    /// Como `submit`, pero además retorna el estado tomado antes de
    /// despachar, que siempre es Pending.
    pub fn submit_with_snapshot(&self) -> Result<(Arc<Task>, TaskSnapshot), RegistryError> {
        let task = Arc::new(Task::new());
        self.registry.create(Arc::clone(&task))?;
        let snapshot = task.snapshot();
        self.dispatcher.submit(Arc::clone(&task));
        info!(task_id = %task.id(), "task submitted");
        Ok((task, snapshot))
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Task>> {
        self.registry.get(id)
    }

    pub fn list(&self) -> Vec<Arc<Task>> {
        self.registry.list()
    }

    /// Borra la tarea del registro. Si sigue ejecutando, su thread termina
    /// igual pero ya no es visible.
    pub fn delete(&self, id: &Uuid) -> bool {
        self.registry.delete(id)
    }

    pub fn cancel(&self, id: &Uuid) -> bool {
        self.registry.cancel(id)
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Estadísticas para /metrics
    pub fn stats(&self) -> serde_json::Value {
        let by_status: serde_json::Map<String, serde_json::Value> = self
            .registry
            .status_counts()
            .into_iter()
            .map(|(status, count)| (status.as_str().to_string(), count.into()))
            .collect();

        serde_json::json!({
            "total": self.registry.len(),
            "by_status": by_status,
            "slots": {
                "capacity": self.dispatcher.capacity(),
                "in_use": self.dispatcher.in_flight(),
                "waiting": self.dispatcher.waiting(),
            },
        })
    }
}
