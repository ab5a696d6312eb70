//! Success envelopes for the JSON API
//!
//! Every successful response has the shape
//! `{ "success": true, "data"?, "count"?, "message"? }`. Errors use the
//! matching envelope in [`crate::error::ErrorResponse`].
//!
//! ```rust,ignore
//! async fn create() -> Result<Success<Feedback>> {
//!     let feedback = service.submit(&input).await?;
//!     Ok(Success::created(feedback).with_message("Feedback submitted successfully"))
//! }
//! ```

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Standard success envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct Success<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip)]
    status: StatusCode,
    #[serde(skip)]
    location: Option<String>,
}

impl<T> Success<T> {
    /// 200 OK carrying `data`
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            count: None,
            message: None,
            status: StatusCode::OK,
            location: None,
        }
    }

    /// 201 Created carrying `data`
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::new(data)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Add a Location header pointing to the created resource
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T> Success<Vec<T>> {
    /// 200 OK carrying a list and its length
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        Self {
            count: Some(count),
            ..Self::new(items)
        }
    }
}

impl Success<()> {
    /// 200 OK with only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            count: None,
            message: Some(message.into()),
            status: StatusCode::OK,
            location: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        let location = self.location.clone();
        let mut response = (status, Json(self)).into_response();

        if let Some(location) = location {
            if let Ok(value) = HeaderValue::from_str(&location) {
                response.headers_mut().insert(header::LOCATION, value);
            }
        }

        response
    }
}

/// Bare `{ "message": … }` body used by the API banner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiMessage {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct TestData {
        id: u64,
    }

    #[test]
    fn test_success_shape() {
        let value = serde_json::to_value(Success::new(TestData { id: 1 })).unwrap();
        assert_eq!(value, serde_json::json!({"success": true, "data": {"id": 1}}));
    }

    #[test]
    fn test_list_carries_count() {
        let value = serde_json::to_value(Success::list(vec![1, 2, 3])).unwrap();
        assert_eq!(value["count"], 3);
        assert_eq!(value["data"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_message_only() {
        let value = serde_json::to_value(Success::message("Done")).unwrap();
        assert_eq!(value, serde_json::json!({"success": true, "message": "Done"}));
    }

    #[test]
    fn test_created_status_and_location() {
        let response = Success::created(TestData { id: 7 })
            .with_location("/api/feedback/7")
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/api/feedback/7"
        );
    }
}
