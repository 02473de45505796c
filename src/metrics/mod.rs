//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Recolección de métricas HTTP del servidor:
//! - Contadores de requests por código y por ruta
//! - Latencias (p50, p95, p99)
//! - Conexiones activas
//!
//! Las métricas de tareas las aporta `TaskManager::stats` en `/metrics`.

pub mod collector;

pub use collector::{MetricsCollector, MetricsSnapshot};
