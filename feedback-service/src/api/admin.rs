//! `/api/admin` account handlers

use axum::{
    extract::rejection::JsonRejection,
    extract::{Extension, State},
    Json,
};

use super::json_body;
use crate::{
    error::Result,
    middleware::AuthenticatedAdmin,
    model::AdminProfile,
    responses::Success,
    services::{AuthResponse, LoginInput},
    state::AppState,
    validation::RegisterInput,
};

/// First-admin registration, closed once an admin exists
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterInput>, JsonRejection>,
) -> Result<Success<AuthResponse>> {
    let input = json_body(payload)?;
    let response = state.admins.register(&input).await?;
    Ok(Success::created(response))
}

pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginInput>, JsonRejection>,
) -> Result<Success<AuthResponse>> {
    let input = json_body(payload)?;
    let response = state.admins.login(&input).await?;
    Ok(Success::new(response))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthenticatedAdmin>,
) -> Result<Success<AdminProfile>> {
    let profile = state.admins.profile(&admin.id).await?;
    Ok(Success::new(profile))
}

#[cfg(test)]
mod tests {
    use crate::api::tests::{admin_token, app, send};
    use http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_register_login_profile() {
        let app = app();
        let token = admin_token(&app).await;

        let (status, body) = send(&app, Method::GET, "/api/admin/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "root@example.com");
        assert_eq!(body["data"]["name"], "Root");
        assert!(body["data"].get("password_hash").is_none());
        assert!(body["data"].get("passwordHash").is_none());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/admin/login",
            None,
            Some(json!({"email": "root@example.com", "password": "correct horse battery"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["token"].is_string());
        assert!(body["data"]["_id"].as_str().unwrap().starts_with("adm_"));
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = app();
        admin_token(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/admin/login",
            None,
            Some(json!({"email": "root@example.com", "password": "not the password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_second_registration_is_forbidden() {
        let app = app();
        admin_token(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/admin/register",
            None,
            Some(json!({
                "name": "Intruder",
                "email": "intruder@example.com",
                "password": "another long password"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_short_password_is_validation_error() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/admin/register",
            None,
            Some(json!({"name": "Root", "email": "root@example.com", "password": "short"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["errors"]["password"][0]["message"],
            "Password must be at least 8 characters"
        );
    }
}
