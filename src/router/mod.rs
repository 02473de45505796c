//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea `(método, path)` a handlers. Los patrones admiten segmentos
//! variables con la forma `{nombre}`:
//!
//! ```text
//! GET  /tasks/{id}         → get_handler
//! POST /tasks/{id}/cancel  → cancel_handler
//! ```
//!
//! Path desconocido → 404. Path conocido con otro método → 405 con `Allow`.

use crate::http::{Method, Request, Response, StatusCode};
use std::collections::HashMap;

/// Valores de los segmentos variables del path
pub type PathParams = HashMap<String, String>;

/// Un handler recibe el request, los parámetros del path y el estado compartido
pub type Handler<S> = fn(&Request, &PathParams, &S) -> Response;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

struct Route<S> {
    method: Method,
    pattern: String,
    segments: Vec<Segment>,
    handler: Handler<S>,
}

impl<S> Route<S> {
    /// Retorna los parámetros si el path coincide con el patrón
    fn matches(&self, path: &[&str]) -> Option<PathParams> {
        if path.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (segment, part) in self.segments.iter().zip(path) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), (*part).to_string());
                }
            }
        }
        Some(params)
    }
}

/// Router genérico sobre el estado compartido `S`
pub struct Router<S> {
    routes: Vec<Route<S>>,
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

impl<S> Router<S> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta
    pub fn register(&mut self, method: Method, pattern: &str, handler: Handler<S>) {
        let segments = split_path(pattern)
            .into_iter()
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();

        self.routes.push(Route {
            method,
            pattern: pattern.to_string(),
            segments,
            handler,
        });
    }

    /// Patrón registrado que coincide con `path`, sin importar el método.
    ///
    /// Sirve para agrupar métricas por ruta y no por ID concreto.
    pub fn pattern_for(&self, path: &str) -> Option<&str> {
        let path = split_path(path);
        self.routes
            .iter()
            .find(|route| route.matches(&path).is_some())
            .map(|route| route.pattern.as_str())
    }

    /// Ejecuta el handler que corresponda al request
    pub fn route(&self, request: &Request, state: &S) -> Response {
        let path = split_path(request.path());
        let mut allowed: Vec<Method> = Vec::new();

        for route in &self.routes {
            if let Some(params) = route.matches(&path) {
                if route.method == request.method() {
                    let mut response = (route.handler)(request, &params, state);
                    add_common_headers(&mut response);
                    return response;
                }
                if !allowed.contains(&route.method) {
                    allowed.push(route.method);
                }
            }
        }

        let mut response = if allowed.is_empty() {
            Response::error(
                StatusCode::NotFound,
                &format!("route not found: {}", request.path()),
            )
        } else {
            let allow = allowed
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Response::error(StatusCode::MethodNotAllowed, "method not allowed")
                .with_header("Allow", &allow)
        };
        add_common_headers(&mut response);
        response
    }
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Headers comunes a todas las respuestas
pub fn add_common_headers(response: &mut Response) {
    response.add_header("Server", "task-server/0.1");
    response.add_header("Connection", "close");
}
