//! # Módulo HTTP
//!
//! Adaptador HTTP escrito a mano sobre `std::net`:
//!
//! - Parsing del request line y headers
//! - Construcción de respuestas JSON
//! - Códigos de estado
//!
//! Cada conexión atiende un único request y se cierra
//! (`Connection: close`), como en HTTP/1.0.

pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
