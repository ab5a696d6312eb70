//! `/api/feedback` handlers

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    Json,
};

use super::{json_body, query_params};
use crate::{
    error::Result,
    model::Feedback,
    responses::Success,
    services::FeedbackQuery,
    state::AppState,
    validation::FeedbackInput,
};

/// Public submission endpoint
pub async fn submit(
    State(state): State<AppState>,
    payload: std::result::Result<Json<FeedbackInput>, JsonRejection>,
) -> Result<Success<Feedback>> {
    let input = json_body(payload)?;
    let feedback = state.feedback.submit(&input).await?;
    let location = format!("/api/feedback/{}", feedback.id);
    Ok(Success::created(feedback)
        .with_message("Feedback submitted successfully")
        .with_location(location))
}

pub async fn list(State(state): State<AppState>) -> Result<Success<Vec<Feedback>>> {
    let feedback = state.feedback.list().await?;
    Ok(Success::list(feedback))
}

pub async fn filter(
    State(state): State<AppState>,
    query: std::result::Result<Query<FeedbackQuery>, QueryRejection>,
) -> Result<Success<Vec<Feedback>>> {
    let query = query_params(query)?;
    let feedback = state.feedback.filter(&query).await?;
    Ok(Success::list(feedback))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Success<Feedback>> {
    let feedback = state.feedback.get(&id).await?;
    Ok(Success::new(feedback))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<Success<()>> {
    state.feedback.delete(&id).await?;
    Ok(Success::message("Feedback deleted successfully"))
}

#[cfg(test)]
mod tests {
    use crate::api::tests::{admin_token, app, send};
    use http::{Method, StatusCode};
    use serde_json::json;

    fn submission(email: &str, product: &str, rating: u8, message: &str) -> serde_json::Value {
        json!({
            "name": "Jane Doe",
            "email": email,
            "product": product,
            "rating": rating,
            "message": message
        })
    }

    #[tokio::test]
    async fn test_submit_returns_created_envelope() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/feedback",
            None,
            Some(submission("jane@example.com", "Microsoft Teams", 4, "Works well for us")),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Feedback submitted successfully");
        assert_eq!(body["data"]["product"], "Microsoft Teams");
        assert_eq!(body["data"]["rating"], 4);
        assert!(body["data"]["_id"].as_str().unwrap().starts_with("fb_"));
        assert!(body["data"]["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_duplicate_submission_is_rejected() {
        let app = app();
        let payload = submission("jane@example.com", "Microsoft Word", 5, "Great editor");
        send(&app, Method::POST, "/api/feedback", None, Some(payload.clone())).await;

        let (status, body) = send(&app, Method::POST, "/api/feedback", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["message"],
            "You have already submitted feedback for this product"
        );
    }

    #[tokio::test]
    async fn test_invalid_submission_lists_field_errors() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/feedback",
            None,
            Some(json!({"name": "J", "email": "nope", "product": "Microsoft Word", "rating": 9})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        let errors = body["errors"].as_object().unwrap();
        for field in ["name", "email", "rating", "message"] {
            assert!(errors.contains_key(field), "missing {field}");
        }
        assert!(!errors.contains_key("product"));
    }

    #[tokio::test]
    async fn test_admin_reads_filters_and_deletes() {
        let app = app();
        let token = admin_token(&app).await;

        let (_, created) = send(
            &app,
            Method::POST,
            "/api/feedback",
            None,
            Some(submission("a@example.com", "Microsoft Excel", 2, "Pivot tables crash")),
        )
        .await;
        send(
            &app,
            Method::POST,
            "/api/feedback",
            None,
            Some(submission("b@example.com", "Microsoft Azure", 5, "Portal is fast")),
        )
        .await;
        let id = created["data"]["_id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, Method::GET, "/api/feedback", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);

        let (_, body) = send(
            &app,
            Method::GET,
            "/api/feedback/filter?product=Microsoft%20Excel&keyword=pivot",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["_id"], id.as_str());

        let (status, _) = send(
            &app,
            Method::GET,
            "/api/feedback/filter?rating=high",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/api/feedback/{id}");
        let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "a@example.com");

        let (status, body) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "message": "Feedback deleted successfully"}));

        let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Feedback not found");
    }
}
