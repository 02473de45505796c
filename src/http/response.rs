//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! ```text
//! HTTP/1.0 201 Created\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 98\r\n
//! X-Request-Id: 0f6c...\r\n
//! \r\n
//! {"id":"...","status":"Pending","created_at":"..."}
//! ```
//!
//! Todos los bodies de la API son JSON y se serializan con `serde_json`.

use super::StatusCode;
use serde::Serialize;
use std::collections::HashMap;
use tracing::error;

/// Respuesta HTTP completa
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// HashMap para evitar headers duplicados
    headers: HashMap<String, String>,

    body: Vec<u8>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl Response {
    /// Respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header; si ya existe se sobrescribe
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Establece el body y su `Content-Length`
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self.headers
            .insert("Content-Length".to_string(), self.body.len().to_string());
        self
    }

    /// Serializa `value` como body JSON.
    ///
    /// Si la serialización falla se responde 500 en su lugar.
    ///
    /// # Ejemplo
    /// ```
    /// use task_server::http::{Response, StatusCode};
    ///
    /// let response = Response::json(StatusCode::Created, &serde_json::json!({"ok": true}));
    /// assert_eq!(response.status(), StatusCode::Created);
    /// assert_eq!(response.body(), br#"{"ok":true}"#);
    /// ```
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status)
                .with_header("Content-Type", "application/json")
                .with_body(body),
            Err(e) => {
                error!(error = %e, "failed to encode response body");
                Self::error(StatusCode::InternalServerError, "failed to encode response")
            }
        }
    }

    /// Respuesta de error: `{"error": "mensaje"}`
    pub fn error(status: StatusCode, message: &str) -> Self {
        // Un struct con un &str siempre se puede serializar
        let body = serde_json::to_vec(&ErrorBody { error: message })
            .unwrap_or_else(|_| br#"{"error":"internal error"}"#.to_vec());
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// 204 sin body
    pub fn no_content() -> Self {
        Self::new(StatusCode::NoContent).with_header("Content-Length", "0")
    }

    /// Bytes listos para escribir en el socket
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(128 + self.body.len());

        result.extend_from_slice(format!("HTTP/1.0 {}\r\n", self.status).as_bytes());
        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        result.extend_from_slice(b"\r\n");
        result.extend_from_slice(&self.body);

        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_response() {
        let response = Response::new(StatusCode::Ok);
        assert_eq!(response.status(), StatusCode::Ok);
        assert!(response.headers().is_empty());
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_with_header_overwrites() {
        let response = Response::new(StatusCode::Ok)
            .with_header("X-Custom", "a")
            .with_header("X-Custom", "b");
        assert_eq!(response.header("X-Custom"), Some("b"));
    }

    #[test]
    fn test_json_response() {
        let response = Response::json(StatusCode::Ok, &vec![1, 2, 3]);

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.header("Content-Length"), Some("7"));
        assert_eq!(response.body(), b"[1,2,3]");
    }

    #[test]
    fn test_error_response_is_escaped() {
        let response = Response::error(StatusCode::BadRequest, r#"bad "id""#);
        assert_eq!(response.status(), StatusCode::BadRequest);

        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["error"], r#"bad "id""#);
    }

    #[test]
    fn test_no_content() {
        let response = Response::no_content();
        assert_eq!(response.status(), StatusCode::NoContent);
        assert!(response.body().is_empty());

        let text = String::from_utf8(response.to_bytes()).unwrap();
        assert!(text.starts_with("HTTP/1.0 204 No Content\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_to_bytes() {
        let response = Response::new(StatusCode::Created)
            .with_header("Content-Type", "text/plain")
            .with_body("Test");

        let text = String::from_utf8(response.to_bytes()).unwrap();
        assert!(text.starts_with("HTTP/1.0 201 Created\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 4\r\n"));
        assert!(text.ends_with("\r\n\r\nTest"));
    }
}
