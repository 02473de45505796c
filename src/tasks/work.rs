//! # Función de Trabajo
//! src/tasks/work.rs
//!
//! La operación que ejecuta cada tarea. El dispatcher solo conoce el trait
//! `Work`; en producción se usa `SimulatedWork` (latencia de I/O simulada) y
//! en los tests un closure instantáneo.

use crate::tasks::task::format_duration;
use rand::Rng;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Descripción de un fallo reportado por la función de trabajo
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct WorkFailure(pub String);

impl WorkFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Unidad de trabajo reemplazable.
///
/// `run` bloquea el thread que la llama hasta que la operación termina.
pub trait Work: Send + Sync {
    fn run(&self) -> Result<String, WorkFailure>;
}

impl<F> Work for F
where
    F: Fn() -> Result<String, WorkFailure> + Send + Sync,
{
    fn run(&self) -> Result<String, WorkFailure> {
        self()
    }
}

/// Simula una operación I/O-bound: duerme un número aleatorio de segundos
/// enteros dentro de `[min, max]` y siempre tiene éxito.
#[derive(Debug, Clone)]
pub struct SimulatedWork {
    min: Duration,
    max: Duration,
}

impl SimulatedWork {
    /// Entre 1 y 5 minutos
    pub const DEFAULT_MIN: Duration = Duration::from_secs(60);
    pub const DEFAULT_MAX: Duration = Duration::from_secs(300);

    /// Si `min > max` se intercambian
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Elige la duración de una ejecución
    pub fn pick_duration(&self) -> Duration {
        let secs = rand::thread_rng().gen_range(self.min.as_secs()..=self.max.as_secs());
        Duration::from_secs(secs)
    }
}

impl Default for SimulatedWork {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN, Self::DEFAULT_MAX)
    }
}

impl Work for SimulatedWork {
    fn run(&self) -> Result<String, WorkFailure> {
        let duration = self.pick_duration();
        thread::sleep(duration);
        Ok(format!("processed in {}", format_duration(duration)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_work() {
        let ok = || Ok::<_, WorkFailure>("stub-result".to_string());
        assert_eq!(ok.run(), Ok("stub-result".to_string()));

        let fail = || Err::<String, _>(WorkFailure::new("simulated error"));
        assert_eq!(fail.run().unwrap_err().to_string(), "simulated error");
    }

    #[test]
    fn test_default_range() {
        let work = SimulatedWork::default();
        for _ in 0..100 {
            let d = work.pick_duration();
            assert!(d >= Duration::from_secs(60));
            assert!(d <= Duration::from_secs(300));
            assert_eq!(d.subsec_nanos(), 0);
        }
    }

    #[test]
    fn test_swapped_bounds() {
        let work = SimulatedWork::new(Duration::from_secs(3), Duration::from_secs(1));
        for _ in 0..20 {
            let d = work.pick_duration();
            assert!(d >= Duration::from_secs(1) && d <= Duration::from_secs(3));
        }
    }

    #[test]
    fn test_zero_duration_run() {
        let work = SimulatedWork::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(work.run(), Ok("processed in 0s".to_string()));
    }
}
