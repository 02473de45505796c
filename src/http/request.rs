//! # Parsing de Requests HTTP
//! src/http/request.rs
//!
//! Parser mínimo para los requests de la API:
//!
//! ```text
//! POST /tasks HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Content-Length: 0\r\n
//! \r\n
//! ```
//!
//! Se aceptan HTTP/1.0 y HTTP/1.1. La query string se descarta: ninguna
//! ruta la usa. El body se ignora, ya que `POST /tasks` no recibe datos.

use std::collections::HashMap;
use thiserror::Error;

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    POST,
    DELETE,
}

impl Method {
    fn parse(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "DELETE" => Ok(Method::DELETE),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::DELETE => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request HTTP parseado
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path sin query string (ej: "/tasks/3f2c...")
    path: String,

    /// Headers, con el nombre en minúsculas
    headers: HashMap<String, String>,

    version: String,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty request")]
    EmptyRequest,

    #[error("invalid request line")]
    InvalidRequestLine,

    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

impl Request {
    /// Parsea un request desde los bytes leídos del socket
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use task_server::http::{Method, Request};
    ///
    /// let raw = b"DELETE /tasks/abc HTTP/1.1\r\nHost: localhost\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.method(), Method::DELETE);
    /// assert_eq!(request.path(), "/tasks/abc");
    /// assert_eq!(request.header("host"), Some("localhost"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(buffer).map_err(|_| ParseError::InvalidRequestLine)?;

        // Solo interesa la cabecera; lo que venga después de la línea vacía es body
        let head = text.split("\r\n\r\n").next().unwrap_or_default();
        if head.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ParseError::EmptyRequest)?;
        let (method, path, version) = Self::parse_request_line(request_line)?;
        let headers = Self::parse_headers(lines)?;

        Ok(Request {
            method,
            path,
            headers,
            version,
        })
    }

    /// Formato: `METHOD /path?query HTTP/1.x`
    fn parse_request_line(line: &str) -> Result<(Method, String, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::parse(parts[0])?;

        let target = parts[1];
        if !target.starts_with('/') {
            return Err(ParseError::InvalidRequestLine);
        }
        let path = target.split('?').next().unwrap_or(target).to_string();

        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((method, path, version))
    }

    fn parse_headers<'a>(
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();
        for line in lines {
            if line.trim().is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
        Ok(headers)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Busca un header sin distinguir mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_post_tasks() {
        let raw = b"POST /tasks HTTP/1.1\r\nContent-Length: 0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.path(), "/tasks");
        assert_eq!(request.version(), "HTTP/1.1");
        assert_eq!(request.header("Content-Length"), Some("0"));
    }

    #[test]
    fn test_parse_delete() {
        let raw = b"DELETE /tasks/123 HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.method(), Method::DELETE);
        assert_eq!(request.path(), "/tasks/123");
    }

    #[test]
    fn test_query_string_dropped() {
        let raw = b"GET /tasks?limit=10 HTTP/1.1\r\n\r\n";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.path(), "/tasks");
    }

    #[test]
    fn test_headers_case_insensitive() {
        let raw = b"GET / HTTP/1.1\r\nUser-Agent: curl/8.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.header("user-agent"), Some("curl/8.0"));
        assert_eq!(request.header("USER-AGENT"), Some("curl/8.0"));
    }

    #[test]
    fn test_body_ignored() {
        let raw = b"POST /tasks HTTP/1.1\r\nContent-Length: 7\r\n\r\nnothing";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.path(), "/tasks");
    }

    #[test]
    fn test_unsupported_method() {
        let result = Request::parse(b"PATCH /tasks HTTP/1.1\r\n\r\n");
        assert_eq!(result.unwrap_err(), ParseError::UnsupportedMethod("PATCH".into()));
    }

    #[test]
    fn test_invalid_version() {
        let result = Request::parse(b"GET / HTTP/2.0\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidHttpVersion(_))));
    }

    #[test]
    fn test_empty_request() {
        assert_eq!(Request::parse(b"").unwrap_err(), ParseError::EmptyRequest);
    }

    #[test]
    fn test_invalid_request_line() {
        assert_eq!(
            Request::parse(b"GET\r\n\r\n").unwrap_err(),
            ParseError::InvalidRequestLine
        );
        assert_eq!(
            Request::parse(b"GET tasks HTTP/1.1\r\n\r\n").unwrap_err(),
            ParseError::InvalidRequestLine
        );
    }

    #[test]
    fn test_invalid_header() {
        let result = Request::parse(b"GET / HTTP/1.1\r\nbroken header\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidHeader(_))));
    }
}
