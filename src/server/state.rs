//! Estado compartido que reciben todos los handlers HTTP.

use crate::metrics::MetricsCollector;
use crate::tasks::TaskManager;

#[derive(Clone)]
pub struct AppState {
    /// Núcleo de tareas: registro y dispatcher
    pub manager: TaskManager,

    /// Métricas HTTP del servidor
    pub metrics: MetricsCollector,
}

impl AppState {
    pub fn new(manager: TaskManager) -> Self {
        Self {
            manager,
            metrics: MetricsCollector::new(),
        }
    }
}
