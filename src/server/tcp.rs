//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Un thread por conexión. Cada conexión atiende un request y se cierra.
//!
//! El listener es no bloqueante para poder revisar el `ShutdownHandle` entre
//! intentos de `accept`; los sockets aceptados vuelven a modo bloqueante.
//! Al apagar se deja de aceptar y se espera, hasta el período de gracia, a
//! que terminen las conexiones en curso. Las tareas despachadas no se esperan.

use crate::config::Config;
use crate::error::ServerError;
use crate::http::{Method, Request, Response, StatusCode};
use crate::metrics::MetricsCollector;
use crate::router::{add_common_headers, Router};
use crate::server::shutdown::ShutdownHandle;
use crate::server::state::AppState;
use crate::tasks::handlers;
use crate::tasks::TaskManager;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Tamaño máximo de la cabecera de un request
const MAX_REQUEST_BYTES: usize = 8192;

/// Pausa entre intentos de `accept` cuando no hay conexiones pendientes
const ACCEPT_POLL: Duration = Duration::from_millis(25);

/// Tiempo máximo esperando datos de un cliente
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Tabla de rutas de la API
pub fn routes() -> Router<AppState> {
    let mut router = Router::new();
    router.register(Method::POST, "/tasks", handlers::create_handler);
    router.register(Method::GET, "/tasks", handlers::list_handler);
    router.register(Method::GET, "/tasks/{id}", handlers::get_handler);
    router.register(Method::DELETE, "/tasks/{id}", handlers::delete_handler);
    router.register(Method::POST, "/tasks/{id}/cancel", handlers::cancel_handler);
    router.register(Method::GET, "/metrics", handlers::metrics_handler);
    router.register(Method::GET, "/health", handlers::health_handler);
    router
}

/// Servidor HTTP con listener ya enlazado
pub struct Server {
    listener: TcpListener,
    router: Arc<Router<AppState>>,
    state: AppState,
    grace: Duration,
}

/// Mantiene la cuenta de conexiones activas, incluso si el handler hace panic
struct ConnectionGuard(MetricsCollector);

impl ConnectionGuard {
    fn new(metrics: &MetricsCollector) -> Self {
        metrics.increment_active_connections();
        Self(metrics.clone())
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.decrement_active_connections();
    }
}

impl Server {
    /// Valida la configuración y enlaza el listener
    pub fn bind(config: &Config, manager: TaskManager) -> Result<Self, ServerError> {
        config.validate()?;

        let address = config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;
        listener
            .set_nonblocking(true)
            .map_err(ServerError::Listener)?;

        Ok(Self {
            listener,
            router: Arc::new(routes()),
            state: AppState::new(manager),
            grace: config.shutdown_grace(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(ServerError::Listener)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Acepta conexiones hasta que se active `shutdown`
    pub fn run(self, shutdown: ShutdownHandle) -> Result<(), ServerError> {
        let address = self.local_addr()?;
        info!(%address, "server listening");

        while !shutdown.is_triggered() {
            match self.listener.accept() {
                Ok((stream, peer)) => self.spawn_connection(stream, peer),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        info!("shutdown requested, no longer accepting connections");
        let Server {
            listener,
            state,
            grace,
            ..
        } = self;
        drop(listener);
        drain_connections(&state.metrics, grace);
        info!("server stopped");
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        debug!(%peer, "connection accepted");

        let guard = ConnectionGuard::new(&self.state.metrics);
        let router = Arc::clone(&self.router);
        let state = self.state.clone();

        let spawned = thread::Builder::new()
            .name("http-conn".to_string())
            .spawn(move || {
                let _guard = guard;
                if let Err(e) = prepare_stream(&stream)
                    .and_then(|_| handle_connection(stream, &router, &state))
                {
                    warn!(%peer, error = %e, "connection error");
                }
            });

        // Si el spawn falla el closure (y con él el guard) ya se descartó
        if let Err(e) = spawned {
            error!(%peer, error = %e, "failed to spawn connection thread");
        }
    }
}

/// Espera a que terminen las conexiones abiertas, hasta el período de gracia
fn drain_connections(metrics: &MetricsCollector, grace: Duration) {
    let deadline = Instant::now() + grace;
    loop {
        let active = metrics.active_connections();
        if active == 0 {
            return;
        }
        if Instant::now() >= deadline {
            warn!(active, "grace period elapsed with open connections");
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

fn prepare_stream(stream: &TcpStream) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))
}

/// Lee hasta el fin de la cabecera (`\r\n\r\n`), el cierre del cliente o el
/// límite de tamaño
fn read_request(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    while buffer.len() < MAX_REQUEST_BYTES {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    buffer.truncate(MAX_REQUEST_BYTES);
    Ok(buffer)
}

/// Atiende un request completo sobre `stream`
pub fn handle_connection(
    mut stream: TcpStream,
    router: &Router<AppState>,
    state: &AppState,
) -> io::Result<()> {
    let start = Instant::now();
    let request_id = Uuid::new_v4().simple().to_string();

    let raw = read_request(&mut stream)?;
    if raw.is_empty() {
        debug!(request_id = %request_id, "connection closed without data");
        return Ok(());
    }

    let (mut response, method, path, route) = match Request::parse(&raw) {
        Ok(request) => {
            let route = router
                .pattern_for(request.path())
                .unwrap_or("unmatched")
                .to_string();
            let response = router.route(&request, state);
            (
                response,
                request.method().as_str(),
                request.path().to_string(),
                route,
            )
        }
        Err(e) => {
            let mut response =
                Response::error(StatusCode::BadRequest, &format!("invalid request: {}", e));
            add_common_headers(&mut response);
            (response, "-", "-".to_string(), "invalid".to_string())
        }
    };

    response.add_header("X-Request-Id", &request_id);
    let worker = thread::current()
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", thread::current().id()));
    response.add_header("X-Worker-Thread", &worker);

    stream.write_all(&response.to_bytes())?;
    stream.flush()?;

    let latency = start.elapsed();
    let status = response.status();
    state.metrics.record_request(&route, status.as_u16(), latency);

    info!(
        request_id = %request_id,
        method,
        path = %path,
        status = status.as_u16(),
        latency_ms = latency.as_secs_f64() * 1000.0,
        "request handled"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::work::WorkFailure;
    use std::net::Shutdown;

    fn test_state() -> AppState {
        AppState::new(TaskManager::new(
            2,
            Arc::new(|| Ok::<_, WorkFailure>("fast-result".to_string())),
        ))
    }

    /// Atiende una sola conexión con `handle_connection` y retorna la respuesta cruda
    fn exchange(raw: &[u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let state = test_state();
        let router = routes();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, &router, &state).unwrap();
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(raw).unwrap();
        client.shutdown(Shutdown::Write).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        server.join().unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_health_has_observability_headers() {
        let text = exchange(b"GET /health HTTP/1.0\r\n\r\n");

        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.contains("X-Request-Id: "));
        assert!(text.contains("X-Worker-Thread: "));
        assert!(text.contains("Connection: close"));
        assert!(text.ends_with(r#"{"status":"ok"}"#));
    }

    #[test]
    fn test_post_tasks_created() {
        let text = exchange(b"POST /tasks HTTP/1.1\r\nContent-Length: 0\r\n\r\n");
        assert!(text.starts_with("HTTP/1.0 201 Created\r\n"));
        assert!(text.contains(r#""status":"Pending""#));
    }

    #[test]
    fn test_parse_error_is_bad_request() {
        let text = exchange(b"\x00\x01\x02\x03garbage");
        assert!(text.contains("400 Bad Request"));
        assert!(text.contains("invalid request"));
    }

    #[test]
    fn test_wrong_method() {
        let text = exchange(b"DELETE /tasks HTTP/1.0\r\n\r\n");
        assert!(text.contains("405 Method Not Allowed"));
        assert!(text.contains("Allow: "));
    }

    #[test]
    fn test_peer_closed_immediately() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let state = test_state();
        let router = routes();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, &router, &state).unwrap();
            state
        });

        drop(TcpStream::connect(addr).unwrap());
        let state = server.join().unwrap();
        assert_eq!(state.metrics.snapshot().total_requests, 0);
    }

    #[test]
    fn test_run_stops_on_shutdown() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            shutdown_grace_ms: 200,
            ..Config::default()
        };
        let server = Server::bind(&config, test_state().manager).unwrap();
        let addr = server.local_addr().unwrap();
        let metrics = server.state().metrics.clone();

        let shutdown = ShutdownHandle::new();
        let handle = {
            let shutdown = shutdown.clone();
            thread::spawn(move || server.run(shutdown))
        };

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"GET /health HTTP/1.0\r\n\r\n").unwrap();
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        assert!(String::from_utf8_lossy(&buf).contains("200 OK"));

        shutdown.trigger();
        let started = Instant::now();
        handle.join().unwrap().unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(metrics.snapshot().total_requests, 1);
    }

    #[test]
    fn test_bind_rejects_invalid_config() {
        let config = Config {
            max_concurrent_tasks: 0,
            ..Config::default()
        };
        let result = Server::bind(&config, test_state().manager);
        assert!(matches!(result, Err(ServerError::Config(_))));
    }
}
