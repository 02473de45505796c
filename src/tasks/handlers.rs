//! # Handlers HTTP para Tareas
//! src/tasks/handlers.rs
//!
//! Endpoints de la API:
//! - `POST   /tasks`              → crea y despacha una tarea (201)
//! - `GET    /tasks`              → lista todas las tareas
//! - `GET    /tasks/{id}`         → estado de una tarea
//! - `DELETE /tasks/{id}`         → borra una tarea (204)
//! - `POST   /tasks/{id}/cancel`  → cancela una tarea
//! - `GET    /metrics`, `GET /health`

use crate::http::{Request, Response, StatusCode};
use crate::router::PathParams;
use crate::server::AppState;
use crate::tasks::task::TaskView;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

/// Extrae y valida el `{id}` del path
fn task_id(params: &PathParams) -> Result<Uuid, Response> {
    params
        .get("id")
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| Response::error(StatusCode::BadRequest, "invalid task id"))
}

/// `POST /tasks`
///
/// Responde de inmediato con la tarea en Pending; la ejecución sigue en
/// segundo plano.
pub fn create_handler(_req: &Request, _params: &PathParams, state: &AppState) -> Response {
    match state.manager.submit_with_snapshot() {
        Ok((_, snapshot)) => Response::json(StatusCode::Created, &TaskView::from(snapshot)),
        Err(e) => {
            error!(error = %e, "failed to register task");
            Response::error(StatusCode::InternalServerError, "failed to create task")
        }
    }
}

/// `GET /tasks`
pub fn list_handler(_req: &Request, _params: &PathParams, state: &AppState) -> Response {
    let views: Vec<TaskView> = state
        .manager
        .list()
        .iter()
        .map(|task| TaskView::from(task.snapshot()))
        .collect();
    Response::json(StatusCode::Ok, &views)
}

/// `GET /tasks/{id}`
pub fn get_handler(_req: &Request, params: &PathParams, state: &AppState) -> Response {
    let id = match task_id(params) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.manager.get(&id) {
        Some(task) => Response::json(StatusCode::Ok, &TaskView::from(task.snapshot())),
        None => Response::error(StatusCode::NotFound, "task not found"),
    }
}

/// `DELETE /tasks/{id}`
///
/// Borrar un ID inexistente también responde 204.
pub fn delete_handler(_req: &Request, params: &PathParams, state: &AppState) -> Response {
    match task_id(params) {
        Ok(id) => {
            state.manager.delete(&id);
            Response::no_content()
        }
        Err(response) => response,
    }
}

/// `POST /tasks/{id}/cancel`
///
/// No interrumpe la función de trabajo si ya está corriendo.
pub fn cancel_handler(_req: &Request, params: &PathParams, state: &AppState) -> Response {
    let id = match task_id(params) {
        Ok(id) => id,
        Err(response) => return response,
    };

    if !state.manager.cancel(&id) {
        return Response::error(StatusCode::NotFound, "task not found");
    }

    // Puede haberse borrado entre el cancel y esta lectura
    match state.manager.get(&id) {
        Some(task) => Response::json(StatusCode::Ok, &TaskView::from(task.snapshot())),
        None => Response::error(StatusCode::NotFound, "task not found"),
    }
}

/// `GET /metrics`: métricas HTTP más estadísticas de tareas
pub fn metrics_handler(_req: &Request, _params: &PathParams, state: &AppState) -> Response {
    let mut body = state.metrics.to_json();
    body["tasks"] = state.manager.stats();
    Response::json(StatusCode::Ok, &body)
}

/// `GET /health`
pub fn health_handler(_req: &Request, _params: &PathParams, _state: &AppState) -> Response {
    Response::json(StatusCode::Ok, &json!({ "status": "ok" }))
}
