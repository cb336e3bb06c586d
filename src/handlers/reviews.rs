//! Review submission and bulk import of externally generated reviews.
//! Reviews are append-only; there is no edit or delete surface.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::models::Review;
use crate::response::ApiResponse;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit))
        .route("/generated/:id", post(import_generated))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
    #[validate(length(min = 1))]
    pub reviewer_name: String,
    #[validate(email)]
    pub reviewer_email: Option<String>,
    #[validate(length(min = 1))]
    pub review: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    pub product_id: Option<Uuid>,
}

/// POST /reviews — a real buyer submission, stored verified.
async fn submit(
    State(s): State<AppState>,
    Json(req): Json<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Review>>), ApiError> {
    req.validate().map_err(|_| ApiError::validation("Please provide all required fields"))?;
    let product_id = req
        .product_id
        .ok_or_else(|| ApiError::validation("Please provide all required fields"))?;

    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (id, reviewer_name, reviewer_email, review, rating, product_id, is_verified, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&req.reviewer_name)
    .bind(&req.reviewer_email)
    .bind(&req.review)
    .bind(req.rating)
    .bind(product_id)
    .fetch_one(&s.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Review created successfully", review))))
}

#[derive(Debug, Deserialize)]
pub struct GeneratedBatch {
    pub reviews: Option<Vec<GeneratedReview>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedReview {
    pub reviewer_name: String,
    pub reviewer_email: Option<String>,
    pub review: String,
    pub rating: i32,
    /// Generated batches carry their own timestamps.
    pub created_at: Option<DateTime<Utc>>,
}

/// POST /reviews/generated/:productId — bulk import. Entries keep their
/// supplied timestamps and land unverified.
async fn import_generated(
    State(s): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(batch): Json<GeneratedBatch>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<Review>>>), ApiError> {
    let reviews = batch
        .reviews
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::validation("Please provide reviews"))?;

    let product: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&s.db)
        .await?;
    if product.is_none() {
        return Err(ApiError::not_found("Product not found"));
    }

    let mut created = Vec::with_capacity(reviews.len());
    for entry in reviews {
        let row = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (id, reviewer_name, reviewer_email, review, rating, product_id, is_verified, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, FALSE, COALESCE($7, NOW())) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&entry.reviewer_name)
        .bind(&entry.reviewer_email)
        .bind(&entry.review)
        .bind(entry.rating)
        .bind(product_id)
        .bind(entry.created_at)
        .fetch_one(&s.db)
        .await?;
        created.push(row);
    }

    tracing::info!(product = %product_id, count = created.len(), "imported generated reviews");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Reviews created successfully", created))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_requires_a_sane_rating() {
        let req: SubmitReviewRequest = serde_json::from_value(serde_json::json!({
            "reviewerName": "Ana",
            "review": "Great",
            "rating": 6,
            "productId": Uuid::nil()
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn generated_entries_keep_their_timestamps() {
        let batch: GeneratedBatch = serde_json::from_value(serde_json::json!({
            "reviews": [{
                "reviewerName": "Bot",
                "review": "Fine",
                "rating": 4,
                "createdAt": "2026-01-15T10:00:00Z"
            }]
        }))
        .unwrap();
        let entry = &batch.reviews.unwrap()[0];
        assert!(entry.created_at.is_some());
        assert!(entry.reviewer_email.is_none());
    }
}
