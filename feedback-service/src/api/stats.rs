//! `/api/admin/stats` handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    model::Product,
    responses::Success,
    state::AppState,
    stats::{DashboardStats, ProductStats},
};

/// `{ success, product, data }` body of the per-product endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductStatsResponse {
    pub success: bool,
    pub product: Product,
    pub data: ProductStats,
}

impl IntoResponse for ProductStatsResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Success<DashboardStats>> {
    let stats = state.stats.dashboard(Utc::now()).await?;
    Ok(Success::new(stats))
}

pub async fn product(
    State(state): State<AppState>,
    Path(product_name): Path<String>,
) -> Result<ProductStatsResponse> {
    let (product, data) = state.stats.product(&product_name).await?;
    Ok(ProductStatsResponse {
        success: true,
        product,
        data,
    })
}

#[cfg(test)]
mod tests {
    use crate::api::tests::{admin_token, app, send};
    use http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_dashboard_and_product_stats() {
        let app = app();
        let token = admin_token(&app).await;

        for (email, product, rating) in [
            ("a@example.com", "Microsoft Word", 4),
            ("b@example.com", "Microsoft Word", 2),
            ("c@example.com", "Microsoft Azure", 5),
        ] {
            let (status, _) = send(
                &app,
                Method::POST,
                "/api/feedback",
                None,
                Some(json!({
                    "name": "Reviewer",
                    "email": email,
                    "product": product,
                    "rating": rating,
                    "message": "Some thoughts"
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/admin/stats/dashboard",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["totalFeedbacks"], 3);
        assert_eq!(data["averageRating"], 3.67);
        assert_eq!(data["recentFeedbacks"], 3);
        assert_eq!(data["feedbacksByProduct"][0]["product"], "Microsoft Word");
        assert_eq!(data["feedbacksByProduct"][0]["count"], 2);
        assert_eq!(data["feedbacksByRating"].as_array().unwrap().len(), 3);

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/admin/stats/product/Microsoft%20Word",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["product"], "Microsoft Word");
        assert_eq!(body["data"]["totalFeedbacks"], 2);
        assert_eq!(body["data"]["averageRating"], 3.0);
        assert_eq!(body["data"]["ratingDistribution"], json!([4, 2]));
    }

    #[tokio::test]
    async fn test_product_without_feedback_is_not_found() {
        let app = app();
        let token = admin_token(&app).await;

        for product in ["Microsoft%20Teams", "Notepad"] {
            let uri = format!("/api/admin/stats/product/{product}");
            let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["message"], "No feedback found for this product");
        }
    }
}
