//! # Registro de Tareas
//! src/tasks/registry.rs
//!
//! Almacén en memoria, thread-safe, de todas las tareas conocidas.
//!
//! Escritores (`create`, `delete`, `cancel`) se excluyen entre sí y con los
//! lectores; lectores (`get`, `list`) corren en paralelo. El registro nunca
//! hace I/O.

use crate::error::RegistryError;
use crate::tasks::task::{CancelOutcome, Task, TaskStatus};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Registro de tareas indexado por ID
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<Uuid, Arc<Task>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una tarea nueva.
    ///
    /// El ID no debe existir; si existe, el mapa no se modifica.
    pub fn create(&self, task: Arc<Task>) -> Result<(), RegistryError> {
        let mut tasks = self.tasks.write();
        let id = task.id();
        if tasks.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        tasks.insert(id, task);
        debug!(task_id = %id, "task registered");
        Ok(())
    }

    /// Busca una tarea. Retorna la instancia compartida, no una copia.
    pub fn get(&self, id: &Uuid) -> Option<Arc<Task>> {
        self.tasks.read().get(id).cloned()
    }

    /// Elimina la tarea si existe. Retorna si había algo que borrar.
    pub fn delete(&self, id: &Uuid) -> bool {
        let removed = self.tasks.write().remove(id).is_some();
        if removed {
            debug!(task_id = %id, "task deleted");
        }
        removed
    }

    /// Snapshot de todas las referencias registradas, sin orden garantizado
    pub fn list(&self) -> Vec<Arc<Task>> {
        self.tasks.read().values().cloned().collect()
    }

    /// Cancela la tarea si existe. No interrumpe trabajo en curso.
    ///
    /// Retorna false si el ID no está registrado.
    pub fn cancel(&self, id: &Uuid) -> bool {
        let tasks = self.tasks.write();
        let Some(task) = tasks.get(id) else {
            return false;
        };

        match task.cancel() {
            CancelOutcome::Canceled(previous) => {
                debug!(task_id = %id, from = %previous, "task canceled");
            }
            CancelOutcome::AlreadyCanceled => {
                debug!(task_id = %id, "task already canceled");
            }
            CancelOutcome::AlreadyFinished(status) => {
                debug!(task_id = %id, %status, "cancel ignored, task already finished");
            }
        }
        true
    }

    /// Número de tareas registradas
    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cuenta de tareas por estado, en el orden de `TaskStatus::ALL`
    pub fn status_counts(&self) -> Vec<(TaskStatus, usize)> {
        let tasks = self.tasks.read();
        let mut counts: HashMap<TaskStatus, usize> = HashMap::new();
        for task in tasks.values() {
            *counts.entry(task.status()).or_insert(0) += 1;
        }
        TaskStatus::ALL
            .iter()
            .map(|status| (*status, counts.get(status).copied().unwrap_or(0)))
            .collect()
    }
}
