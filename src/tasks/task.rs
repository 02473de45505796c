//! # Entidad Task
//! src/tasks/task.rs
//!
//! Representa una unidad de trabajo asíncrono con su estado a lo largo del
//! tiempo. La instancia canónica vive en el registro como `Arc<Task>`; el
//! dispatcher recibe un clon del mismo `Arc` y la muta en el lugar.
//!
//! Todos los campos mutables están detrás de un único `Mutex` por entidad,
//! así que la ruta de cancelación y la ruta de ejecución nunca pisan sus
//! escrituras.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Estado de una tarea
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Creada, esperando un slot de admisión
    Pending,

    /// Ejecutando la función de trabajo
    InProgress,

    /// Terminó con éxito (terminal)
    Completed,

    /// La función de trabajo reportó un fallo (terminal)
    Failed,

    /// Cancelada explícitamente (terminal)
    Canceled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Failed,
        TaskStatus::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Failed => "Failed",
            TaskStatus::Canceled => "Canceled",
        }
    }

    /// Completed, Failed y Canceled no tienen transiciones automáticas de salida
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Canceled
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resultado de aplicar `cancel` sobre una tarea
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// La tarea pasó a Canceled desde este estado
    Canceled(TaskStatus),

    /// Ya estaba cancelada
    AlreadyCanceled,

    /// Estaba en Completed o Failed; el estado no se toca
    AlreadyFinished(TaskStatus),
}

/// Datos mutables (protegidos por Mutex)
#[derive(Debug, Clone)]
struct TaskState {
    status: TaskStatus,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    result: Option<String>,
    error: Option<String>,
}

/// Una unidad de trabajo registrada
#[derive(Debug)]
pub struct Task {
    id: Uuid,
    created_at: DateTime<Utc>,
    state: Mutex<TaskState>,
}

impl Task {
    /// Crea una tarea nueva en estado Pending con un UUID v4 fresco
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Crea una tarea con un ID concreto
    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            state: Mutex::new(TaskState {
                status: TaskStatus::Pending,
                started_at: None,
                finished_at: None,
                result: None,
                error: None,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> TaskStatus {
        self.state.lock().status
    }

    /// Copia consistente de todos los campos, tomada bajo el lock
    pub fn snapshot(&self) -> TaskSnapshot {
        let state = self.state.lock();
        TaskSnapshot {
            id: self.id,
            status: state.status,
            created_at: self.created_at,
            started_at: state.started_at,
            finished_at: state.finished_at,
            result: state.result.clone(),
            error: state.error.clone(),
        }
    }

    /// Pending → InProgress. Retorna false si la tarea ya no está Pending
    /// (fue cancelada mientras esperaba slot).
    pub fn mark_started(&self) -> bool {
        let mut state = self.state.lock();
        if state.status != TaskStatus::Pending {
            return false;
        }
        state.status = TaskStatus::InProgress;
        state.started_at = Some(Utc::now().max(self.created_at));
        true
    }

    /// InProgress → Completed con el payload. Retorna false si la tarea
    /// fue cancelada durante la ejecución; en ese caso solo se registra
    /// `finished_at`.
    pub fn mark_completed(&self, result: String) -> bool {
        self.finish(|state| {
            state.status = TaskStatus::Completed;
            state.result = Some(result);
        })
    }

    /// InProgress → Failed con la descripción del fallo
    pub fn mark_failed(&self, error: String) -> bool {
        self.finish(|state| {
            state.status = TaskStatus::Failed;
            state.error = Some(error);
        })
    }

    fn finish(&self, apply: impl FnOnce(&mut TaskState)) -> bool {
        let mut state = self.state.lock();
        if state.finished_at.is_some() {
            return false;
        }
        let floor = state.started_at.unwrap_or(self.created_at);
        state.finished_at = Some(Utc::now().max(floor));

        if state.status != TaskStatus::InProgress {
            return false;
        }
        apply(&mut *state);
        true
    }

    /// Fallo antes de poder ejecutar (p.ej. el SO no creó el thread).
    /// Solo aplica sobre tareas Pending.
    pub(crate) fn mark_rejected(&self, error: String) {
        let mut state = self.state.lock();
        if state.status != TaskStatus::Pending {
            return;
        }
        let now = Utc::now().max(self.created_at);
        state.status = TaskStatus::Failed;
        state.started_at = Some(now);
        state.finished_at = Some(now);
        state.error = Some(error);
    }

    /// Marca la tarea como cancelada si todavía no terminó.
    ///
    /// No interrumpe una función de trabajo en ejecución. Completed y
    /// Failed son finales: se reportan pero no se sobrescriben.
    pub fn cancel(&self) -> CancelOutcome {
        let mut state = self.state.lock();
        match state.status {
            TaskStatus::Pending | TaskStatus::InProgress => {
                let previous = state.status;
                state.status = TaskStatus::Canceled;
                CancelOutcome::Canceled(previous)
            }
            TaskStatus::Canceled => CancelOutcome::AlreadyCanceled,
            finished => CancelOutcome::AlreadyFinished(finished),
        }
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

/// Copia inmutable del estado de una tarea
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub id: Uuid,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl TaskSnapshot {
    /// Tiempo de ejecución, solo si la tarea empezó y terminó
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => (end - start).to_std().ok(),
            _ => None,
        }
    }
}

/// Representación JSON de una tarea para la API HTTP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: Uuid,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<TaskSnapshot> for TaskView {
    fn from(snapshot: TaskSnapshot) -> Self {
        let duration = snapshot.duration().map(format_duration);
        Self {
            id: snapshot.id,
            status: snapshot.status,
            created_at: snapshot.created_at,
            started_at: snapshot.started_at,
            finished_at: snapshot.finished_at,
            duration,
            result: snapshot.result.filter(|r| !r.is_empty()),
            error: snapshot.error.filter(|e| !e.is_empty()),
        }
    }
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        task.snapshot().into()
    }
}

/// Formatea una duración de forma compacta: `1h2m3s`, `1m30.5s`, `250ms`, `0s`
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}µs", trim_fraction(nanos, 1_000));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", trim_fraction(nanos, 1_000_000));
    }

    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = trim_fraction(
        u128::from(total_secs % 60) * 1_000_000_000 + u128::from(d.subsec_nanos()),
        1_000_000_000,
    );

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// `value / unit` con decimales sin ceros a la derecha
fn trim_fraction(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let width = unit.to_string().len() - 1;
    let digits = format!("{:0width$}", frac, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
