//! # Dispatcher Acotado
//! src/tasks/dispatcher.rs
//!
//! Ejecuta la función de trabajo de cada tarea exactamente una vez, con a lo
//! sumo `N` ejecuciones simultáneas en todo el proceso.
//!
//! ## Modelo
//!
//! ```text
//! submit(task) ──spawn──► thread "task-<id>"
//!                            │ acquire slot   (Pending, puede bloquear)
//!                            │ mark_started   (InProgress)
//!                            │ work.run()     (bloquea durante la latencia)
//!                            │ mark_completed / mark_failed
//!                            ▼ drop slot      (siempre, incluso en panic)
//! ```
//!
//! `submit` nunca espera: retorna apenas se crea el thread. No hay reintentos
//! ni timeout; una función de trabajo colgada retiene su slot para siempre.

use crate::tasks::admission::AdmissionPool;
use crate::tasks::task::Task;
use crate::tasks::work::{Work, WorkFailure};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

/// Límite de concurrencia por defecto
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Dispatcher con pool de admisión de tamaño fijo
#[derive(Clone)]
pub struct Dispatcher {
    pool: AdmissionPool,
    work: Arc<dyn Work>,
}

impl Dispatcher {
    /// Crea un dispatcher con `capacity` slots y la función de trabajo dada
    pub fn new(capacity: usize, work: Arc<dyn Work>) -> Self {
        Self {
            pool: AdmissionPool::new(capacity),
            work,
        }
    }

    /// Agenda la ejecución de la tarea y retorna inmediatamente.
    ///
    /// El resultado se observa después a través de la propia tarea.
    pub fn submit(&self, task: Arc<Task>) {
        let pool = self.pool.clone();
        let work = Arc::clone(&self.work);
        let worker_task = Arc::clone(&task);

        let spawned = thread::Builder::new()
            .name(format!("task-{}", task.id()))
            .spawn(move || Self::execute(worker_task, pool, work));

        if let Err(e) = spawned {
            error!(task_id = %task.id(), error = %e, "failed to spawn task thread");
            task.mark_rejected(format!("failed to start task: {}", e));
        }
    }

    /// Cuerpo del thread de una tarea
    fn execute(task: Arc<Task>, pool: AdmissionPool, work: Arc<dyn Work>) {
        let id = task.id();
        debug!(task_id = %id, waiting = pool.waiting(), "waiting for admission slot");

        let _slot = pool.acquire();

        if !task.mark_started() {
            info!(task_id = %id, status = %task.status(), "task canceled before start, skipping");
            return;
        }
        info!(task_id = %id, in_flight = pool.in_use(), "task started");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work.run()))
            .unwrap_or_else(|payload| {
                Err(WorkFailure::new(format!(
                    "work function panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });

        match outcome {
            Ok(result) => {
                if task.mark_completed(result) {
                    info!(task_id = %id, "task completed");
                } else {
                    warn!(task_id = %id, status = %task.status(), "task finished after cancel, result discarded");
                }
            }
            Err(failure) => {
                if task.mark_failed(failure.to_string()) {
                    warn!(task_id = %id, error = %failure, "task failed");
                } else {
                    warn!(task_id = %id, error = %failure, "task failed after cancel, error discarded");
                }
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Tareas ejecutando la función de trabajo ahora mismo
    pub fn in_flight(&self) -> usize {
        self.pool.in_use()
    }

    /// Tareas bloqueadas esperando slot
    pub fn waiting(&self) -> usize {
        self.pool.waiting()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
