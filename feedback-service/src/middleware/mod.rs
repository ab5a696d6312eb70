//! Request middleware: bearer token checks and request tracking

pub mod jwt;
pub mod request_tracking;
pub mod token;

pub use jwt::{require_admin, AuthenticatedAdmin, JwtAuth};
pub use request_tracking::{
    request_id_layer, request_id_propagation_layer, sensitive_headers_layer, SENSITIVE_HEADERS,
};
pub use token::{extract_token, Claims};
