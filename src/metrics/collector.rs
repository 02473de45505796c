//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Métricas HTTP del servidor en tiempo real: totales, códigos de estado,
//! rutas, latencias y conexiones activas. El contador de conexiones activas
//! también lo usa el apagado ordenado para saber cuándo terminar.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Máximo de latencias guardadas para calcular percentiles
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Collector de métricas thread-safe
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
    started_at: DateTime<Utc>,
}

#[derive(Default)]
struct MetricsData {
    total_requests: u64,
    status_codes: HashMap<u16, u64>,

    /// Ventana de las últimas latencias, en microsegundos
    latencies: VecDeque<u64>,

    requests_per_path: HashMap<String, u64>,
    active_connections: u64,
}

/// Percentiles de latencia en microsegundos
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Percentiles {
    p50: u64,
    p95: u64,
    p99: u64,
    avg: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData {
                latencies: VecDeque::with_capacity(MAX_LATENCY_SAMPLES),
                ..MetricsData::default()
            })),
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Registra un request atendido.
    ///
    /// `route` debe ser el patrón de la ruta (`/tasks/{id}`), no el path
    /// concreto, para no crear una entrada por cada ID.
    pub fn record_request(&self, route: &str, status_code: u16, latency: Duration) {
        let mut data = self.inner.lock();

        data.total_requests += 1;
        *data.status_codes.entry(status_code).or_insert(0) += 1;

        if data.latencies.len() >= MAX_LATENCY_SAMPLES {
            data.latencies.pop_front();
        }
        data.latencies.push_back(latency.as_micros() as u64);

        *data.requests_per_path.entry(route.to_string()).or_insert(0) += 1;
    }

    pub fn increment_active_connections(&self) {
        self.inner.lock().active_connections += 1;
    }

    pub fn decrement_active_connections(&self) {
        let mut data = self.inner.lock();
        data.active_connections = data.active_connections.saturating_sub(1);
    }

    pub fn active_connections(&self) -> u64 {
        self.inner.lock().active_connections
    }

    /// Métricas HTTP como JSON
    pub fn to_json(&self) -> Value {
        let data = self.inner.lock();
        let latencies: Vec<u64> = data.latencies.iter().copied().collect();
        let percentiles = calculate_percentiles(&latencies);
        let stddev = calculate_stddev(&latencies, percentiles.avg);

        let status_codes: serde_json::Map<String, Value> = data
            .status_codes
            .iter()
            .map(|(code, count)| (code.to_string(), json!(count)))
            .collect();

        // Top 10 rutas más accedidas
        let mut paths: Vec<_> = data.requests_per_path.iter().collect();
        paths.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let top_paths: Vec<Value> = paths
            .into_iter()
            .take(10)
            .map(|(path, count)| json!({ "path": path, "count": count }))
            .collect();

        json!({
            "server": {
                "uptime_seconds": self.start_time.elapsed().as_secs(),
                "started_at": self.started_at,
            },
            "requests": {
                "total": data.total_requests,
                "active_connections": data.active_connections,
                "status_codes": status_codes,
                "top_paths": top_paths,
            },
            "latency_us": {
                "p50": percentiles.p50,
                "p95": percentiles.p95,
                "p99": percentiles.p99,
                "avg": percentiles.avg,
                "stddev": (stddev * 100.0).round() / 100.0,
                "samples": latencies.len(),
            },
        })
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let data = self.inner.lock();
        let latencies: Vec<u64> = data.latencies.iter().copied().collect();
        let percentiles = calculate_percentiles(&latencies);

        MetricsSnapshot {
            total_requests: data.total_requests,
            active_connections: data.active_connections,
            uptime_secs: self.start_time.elapsed().as_secs(),
            latency_p50_us: percentiles.p50,
            latency_p95_us: percentiles.p95,
            latency_p99_us: percentiles.p99,
            latency_avg_us: percentiles.avg,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn calculate_percentiles(latencies: &[u64]) -> Percentiles {
    if latencies.is_empty() {
        return Percentiles::default();
    }

    let mut sorted = latencies.to_vec();
    sorted.sort_unstable();

    let len = sorted.len();
    let sum: u64 = sorted.iter().sum();
    Percentiles {
        p50: sorted[len * 50 / 100],
        p95: sorted[len * 95 / 100],
        p99: sorted[len * 99 / 100],
        avg: sum / len as u64,
    }
}

fn calculate_stddev(latencies: &[u64], avg: u64) -> f64 {
    if latencies.is_empty() {
        return 0.0;
    }

    let variance = latencies
        .iter()
        .map(|&x| {
            let diff = x as f64 - avg as f64;
            diff * diff
        })
        .sum::<f64>()
        / latencies.len() as f64;

    variance.sqrt()
}

/// Snapshot de métricas
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub active_connections: u64,
    pub uptime_secs: u64,
    pub latency_p50_us: u64,
    pub latency_p95_us: u64,
    pub latency_p99_us: u64,
    pub latency_avg_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_requests() {
        let collector = MetricsCollector::new();
        collector.record_request("/tasks", 201, Duration::from_millis(10));
        collector.record_request("/tasks/{id}", 200, Duration::from_millis(20));
        collector.record_request("/tasks/{id}", 404, Duration::from_millis(5));

        assert_eq!(collector.snapshot().total_requests, 3);

        let json = collector.to_json();
        assert_eq!(json["requests"]["total"], 3);
        assert_eq!(json["requests"]["status_codes"]["404"], 1);
        assert_eq!(json["requests"]["top_paths"][0]["path"], "/tasks/{id}");
        assert_eq!(json["requests"]["top_paths"][0]["count"], 2);
    }

    #[test]
    fn test_percentiles() {
        let collector = MetricsCollector::new();
        for i in 1..=100 {
            collector.record_request("/tasks", 200, Duration::from_micros(i));
        }

        let snapshot = collector.snapshot();
        assert!(snapshot.latency_p50_us > 0);
        assert!(snapshot.latency_p95_us > snapshot.latency_p50_us);
        assert!(snapshot.latency_p99_us > snapshot.latency_p95_us);
        assert_eq!(snapshot.latency_avg_us, 50);
    }

    #[test]
    fn test_active_connections_tracking() {
        let collector = MetricsCollector::new();
        assert_eq!(collector.active_connections(), 0);

        collector.increment_active_connections();
        collector.increment_active_connections();
        assert_eq!(collector.active_connections(), 2);

        collector.decrement_active_connections();
        collector.decrement_active_connections();
        collector.decrement_active_connections();
        assert_eq!(collector.active_connections(), 0);
    }

    #[test]
    fn test_empty_metrics() {
        let json = MetricsCollector::new().to_json();
        assert_eq!(json["requests"]["total"], 0);
        assert_eq!(json["latency_us"]["samples"], 0);
        assert_eq!(json["latency_us"]["p99"], 0);
    }

    #[test]
    fn test_latency_window_management() {
        let collector = MetricsCollector::new();
        for i in 0..(MAX_LATENCY_SAMPLES as u64 + 500) {
            collector.record_request("/tasks", 200, Duration::from_micros(i));
        }

        let json = collector.to_json();
        assert_eq!(json["requests"]["total"], MAX_LATENCY_SAMPLES as u64 + 500);
        assert_eq!(json["latency_us"]["samples"], MAX_LATENCY_SAMPLES);
    }
}
