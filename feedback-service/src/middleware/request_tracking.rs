//! Request id generation and sensitive header masking

use http::HeaderName;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
};

use crate::ids::MakeTypedRequestId;

/// Headers whose values never reach the logs
pub const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];

/// Stamp each request with a `req_…` TypeID in the configured header
pub fn request_id_layer(header: &str) -> SetRequestIdLayer<MakeTypedRequestId> {
    match HeaderName::try_from(header) {
        Ok(name) => SetRequestIdLayer::new(name, MakeTypedRequestId),
        Err(_) => {
            tracing::warn!(header, "Invalid request id header name, using x-request-id");
            SetRequestIdLayer::x_request_id(MakeTypedRequestId)
        }
    }
}

/// Copy the request id onto the response
pub fn request_id_propagation_layer(header: &str) -> PropagateRequestIdLayer {
    match HeaderName::try_from(header) {
        Ok(name) => PropagateRequestIdLayer::new(name),
        Err(_) => PropagateRequestIdLayer::x_request_id(),
    }
}

pub fn sensitive_headers_layer() -> SetSensitiveRequestHeadersLayer {
    let headers = SENSITIVE_HEADERS
        .iter()
        .map(|h| HeaderName::from_static(*h))
        .collect::<Vec<_>>();

    SetSensitiveRequestHeadersLayer::new(headers)
}
