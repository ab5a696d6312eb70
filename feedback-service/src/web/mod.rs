//! Browser pages: the public feedback form and the admin dashboard
//!
//! Templates are compiled into the binary by askama. The admin pages keep the
//! bearer token in a server-side session and validate it on every request.

use axum::{
    response::Redirect,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod chart;
pub mod forms;
pub mod pages;
pub mod session;
pub mod template;

pub use session::{create_memory_session_layer, SessionConfig};
pub use template::HtmlTemplate;

pub fn routes(config: &SessionConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(pages::feedback_page).post(pages::submit_feedback))
        .route("/admin", get(|| async { Redirect::to("/admin/dashboard") }))
        .route("/admin/login", get(pages::login_page).post(pages::login))
        .route(
            "/admin/register",
            get(pages::register_page).post(pages::register),
        )
        .route("/admin/logout", post(pages::logout))
        .route("/admin/dashboard", get(pages::dashboard))
        .layer(create_memory_session_layer(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;
    use axum::body::Body;
    use http::{header, Method, Request, Response, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let state = test_state();
        routes(&state.config.session).with_state(state)
    }

    async fn request(
        app: &Router,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        form: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match form {
            Some(form) => builder
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn html(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// `name=value` of the session cookie set by `response`
    fn session_cookie(response: &Response<Body>) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    fn location(response: &Response<Body>) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    async fn register(app: &Router) -> String {
        let response = request(
            app,
            Method::POST,
            "/admin/register",
            None,
            Some("name=Root&email=root%40example.com&password=correct+horse&confirm_password=correct+horse"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin/dashboard");
        session_cookie(&response)
    }

    #[tokio::test]
    async fn test_form_page_lists_products() {
        let response = request(&app(), Method::GET, "/", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = html(response).await;
        assert!(page.contains("User Feedback Form"));
        assert!(page.contains("Microsoft PowerPoint"));
    }

    #[tokio::test]
    async fn test_form_submission_shows_banner_and_clears() {
        let app = app();
        let response = request(
            &app,
            Method::POST,
            "/",
            None,
            Some("name=Ada+Lovelace&email=ada%40example.com&product=Microsoft+Excel&rating=5&message="),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = html(response).await;
        assert!(page.contains("Feedback submitted successfully!"));
        assert!(!page.contains("ada@example.com"));
    }

    #[tokio::test]
    async fn test_form_errors_keep_input() {
        let response = request(
            &app(),
            Method::POST,
            "/",
            None,
            Some("name=R2D2&email=r2%40example.com&product=&rating=0&message=beep"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let page = html(response).await;
        assert!(page.contains("Only letters, space and dot allowed"));
        assert!(page.contains("Please select a product"));
        assert!(page.contains("Please select a rating"));
        assert!(page.contains("r2@example.com"));
    }

    #[tokio::test]
    async fn test_duplicate_form_submission_is_reported() {
        let app = app();
        let form = "name=Ada&email=ada%40example.com&product=Microsoft+Word&rating=4&message=Nice+tool";
        request(&app, Method::POST, "/", None, Some(form)).await;

        let response = request(&app, Method::POST, "/", None, Some(form)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(html(response)
            .await
            .contains("You have already submitted feedback for this product"));
    }

    #[tokio::test]
    async fn test_dashboard_requires_session() {
        let response = request(&app(), Method::GET, "/admin/dashboard", None, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin/login");
    }

    #[tokio::test]
    async fn test_register_then_dashboard_with_filters() {
        let app = app();
        for form in [
            "name=Ada&email=ada%40example.com&product=Microsoft+Teams&rating=5&message=Great+calls",
            "name=Bob&email=bob%40example.com&product=Microsoft+Teams&rating=2&message=Laggy",
            "name=Cy&email=cy%40example.com&product=Microsoft+Azure&rating=4&message=Solid",
        ] {
            request(&app, Method::POST, "/", None, Some(form)).await;
        }
        let cookie = register(&app).await;

        let response = request(&app, Method::GET, "/admin/dashboard", Some(&cookie), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = html(response).await;
        assert!(page.contains("root@example.com"));
        assert!(page.contains("<svg"));
        assert!(page.contains("Great calls"));
        assert!(page.contains("3.7"));

        let response = request(
            &app,
            Method::GET,
            "/admin/dashboard?tool=Microsoft+Teams&rating=2",
            Some(&cookie),
            None,
        )
        .await;
        let page = html(response).await;
        assert!(page.contains("Laggy"));
        assert!(!page.contains("Great calls"));

        let response = request(
            &app,
            Method::GET,
            "/admin/dashboard?startDate=yesterday",
            Some(&cookie),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(html(response).await.contains("Invalid startDate"));
    }

    #[tokio::test]
    async fn test_login_logout_cycle() {
        let app = app();
        register(&app).await;

        let response = request(
            &app,
            Method::POST,
            "/admin/login",
            None,
            Some("email=root%40example.com&password=wrong+password"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(html(response).await.contains("Invalid email or password"));

        let response = request(
            &app,
            Method::POST,
            "/admin/login",
            None,
            Some("email=root%40example.com&password=correct+horse"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = session_cookie(&response);

        let response = request(&app, Method::GET, "/admin/login", Some(&cookie), None).await;
        assert_eq!(location(&response), "/admin/dashboard");

        let response = request(&app, Method::POST, "/admin/logout", Some(&cookie), None).await;
        assert_eq!(location(&response), "/admin/login");

        let response = request(&app, Method::GET, "/admin/dashboard", Some(&cookie), None).await;
        assert_eq!(location(&response), "/admin/login");
    }

    #[tokio::test]
    async fn test_register_page_when_locked() {
        let app = app();
        register(&app).await;

        let page = html(request(&app, Method::GET, "/admin/register", None, None).await).await;
        assert!(page.contains("An admin account already exists"));

        let response = request(
            &app,
            Method::POST,
            "/admin/register",
            None,
            Some("name=Eve&email=eve%40example.com&password=long+enough&confirm_password=long+enough"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
