//! # Pool de Admisión
//! src/tasks/admission.rs
//!
//! Semáforo contador con `N` slots intercambiables. Los threads que esperan
//! toman un ticket y son admitidos en orden de llegada, así que ninguno
//! espera indefinidamente mientras se sigan liberando slots.
//!
//! El slot se devuelve al soltar el `SlotGuard`, incluyendo cuando el
//! thread hace unwind por un panic.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

#[derive(Debug)]
struct PoolState {
    /// Slots libres
    available: usize,

    /// Siguiente ticket a entregar
    next_ticket: u64,

    /// Ticket que tiene el turno para tomar un slot
    now_serving: u64,
}

#[derive(Debug)]
struct PoolInner {
    capacity: usize,
    state: Mutex<PoolState>,
    condvar: Condvar,
}

/// Pool de slots compartido entre threads
#[derive(Debug, Clone)]
pub struct AdmissionPool {
    inner: Arc<PoolInner>,
}

impl AdmissionPool {
    /// Crea un pool con `capacity` slots (mínimo 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(PoolInner {
                capacity,
                state: Mutex::new(PoolState {
                    available: capacity,
                    next_ticket: 0,
                    now_serving: 0,
                }),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Bloquea hasta obtener un slot
    pub fn acquire(&self) -> SlotGuard {
        let mut state = self.inner.state.lock();
        let ticket = state.next_ticket;
        state.next_ticket += 1;

        while !(ticket == state.now_serving && state.available > 0) {
            self.inner.condvar.wait(&mut state);
        }

        state.available -= 1;
        state.now_serving += 1;
        drop(state);

        // El siguiente en la fila puede tener slot libre también
        self.inner.condvar.notify_all();

        SlotGuard {
            pool: Arc::clone(&self.inner),
        }
    }

    /// Intenta obtener un slot sin bloquear. Falla si hay alguien en la fila.
    pub fn try_acquire(&self) -> Option<SlotGuard> {
        let mut state = self.inner.state.lock();
        if state.available == 0 || state.next_ticket != state.now_serving {
            return None;
        }
        state.available -= 1;
        state.next_ticket += 1;
        state.now_serving += 1;
        Some(SlotGuard {
            pool: Arc::clone(&self.inner),
        })
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Slots ocupados en este momento
    pub fn in_use(&self) -> usize {
        self.inner.capacity - self.inner.state.lock().available
    }

    /// Threads bloqueados esperando slot
    pub fn waiting(&self) -> usize {
        let state = self.inner.state.lock();
        (state.next_ticket - state.now_serving) as usize
    }
}

/// Slot tomado del pool; se devuelve al hacer drop
#[derive(Debug)]
pub struct SlotGuard {
    pool: Arc<PoolInner>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let mut state = self.pool.state.lock();
        state.available += 1;
        drop(state);
        self.pool.condvar.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_capacity_clamped() {
        assert_eq!(AdmissionPool::new(0).capacity(), 1);
        assert_eq!(AdmissionPool::new(4).capacity(), 4);
    }

    #[test]
    fn test_acquire_and_release() {
        let pool = AdmissionPool::new(2);
        let a = pool.acquire();
        let b = pool.acquire();
        assert_eq!(pool.in_use(), 2);
        assert!(pool.try_acquire().is_none());

        drop(a);
        assert_eq!(pool.in_use(), 1);
        let c = pool.try_acquire();
        assert!(c.is_some());

        drop(b);
        drop(c);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_blocked_waiter_is_admitted() {
        let pool = AdmissionPool::new(1);
        let held = pool.acquire();

        let waiter = {
            let pool = pool.clone();
            thread::spawn(move || {
                let _slot = pool.acquire();
            })
        };

        let deadline = Instant::now() + Duration::from_secs(2);
        while pool.waiting() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(pool.waiting(), 1);

        drop(held);
        waiter.join().unwrap();
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.waiting(), 0);
    }

    #[test]
    fn test_slot_released_on_panic() {
        let pool = AdmissionPool::new(1);
        let worker = {
            let pool = pool.clone();
            thread::spawn(move || {
                let _slot = pool.acquire();
                panic!("work exploded");
            })
        };
        assert!(worker.join().is_err());
        assert_eq!(pool.in_use(), 0);

        // Sigue siendo utilizable
        assert!(pool.try_acquire().is_some());
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let pool = AdmissionPool::new(3);
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();

        for _ in 0..24 {
            let pool = pool.clone();
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            handles.push(thread::spawn(move || {
                let _slot = pool.acquire();
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
                current.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(pool.in_use(), 0);
    }
}
