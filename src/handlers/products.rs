//! Product catalog: browse, search, detail, and the admin add flow.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{EmbeddedReview, Product, Rating, Review};
use crate::response::ApiResponse;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(featured))
        .route("/category", get(categories))
        .route("/getProducts", get(all_products))
        .route("/search/:query", get(search))
        .route("/add/:userId", post(add_product))
        .route("/:id", get(detail))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

/// GET /products?limit=N — a shuffled sampler: up to five products from each
/// category, truncated to the limit.
async fn featured(
    State(s): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let limit = params.limit.unwrap_or(10);

    let categories: Vec<(String,)> = sqlx::query_as("SELECT DISTINCT category FROM products")
        .fetch_all(&s.db)
        .await?;

    let mut products: Vec<Product> = Vec::new();
    for (category,) in &categories {
        let mut batch = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE category = $1 LIMIT 5")
            .bind(category)
            .fetch_all(&s.db)
            .await?;
        products.append(&mut batch);
    }

    products.shuffle(&mut rand::thread_rng());
    products.truncate(limit);

    Ok(Json(ApiResponse::ok("Data fetched successfully", products)))
}

/// GET /products/category — distinct category names.
async fn categories(State(s): State<AppState>) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT DISTINCT category FROM products ORDER BY category")
        .fetch_all(&s.db)
        .await?;
    let names = rows.into_iter().map(|(name,)| name).collect();
    Ok(Json(ApiResponse::ok("Data fetched successfully", names)))
}

/// GET /products/getProducts — the whole catalog, price descending.
async fn all_products(State(s): State<AppState>) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY price DESC")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(ApiResponse::ok("Data fetched successfully", products)))
}

/// GET /products/:id — detail view. Submitted reviews, newest first,
/// replace the embedded seed reviews whenever any exist.
async fn detail(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let mut product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    let reviews = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE product_id = $1 ORDER BY created_at DESC",
    )
    .bind(id)
    .fetch_all(&s.db)
    .await?;
    if !reviews.is_empty() {
        product.reviews = sqlx::types::Json(reviews.iter().map(EmbeddedReview::from).collect());
    }

    Ok(Json(ApiResponse::ok("Data fetched successfully", product)))
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub message: String,
    pub products: Vec<Product>,
}

/// GET /products/search/:query — case-insensitive substring match on title,
/// category, or description.
async fn search(
    State(s): State<AppState>,
    Path(query): Path<String>,
) -> Result<Json<SearchResponse>, ApiError> {
    if query.trim().is_empty() {
        return Err(ApiError::validation("Search query is required"));
    }

    let pattern = format!("%{query}%");
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE title ILIKE $1 OR category ILIKE $1 OR description ILIKE $1",
    )
    .bind(&pattern)
    .fetch_all(&s.db)
    .await?;

    if products.is_empty() {
        return Err(ApiError::not_found("No products found"));
    }

    Ok(Json(SearchResponse {
        success: true,
        message: "Data fetched successfully".to_string(),
        products,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProductRequest {
    pub product_details: Option<NewProduct>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub slug: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    pub description: String,
    #[validate(length(min = 1))]
    pub category: String,
    pub image: String,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default)]
    pub discount_percentage: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub brand: String,
    pub weight: Option<f64>,
    #[serde(default = "default_rating")]
    pub rating: Rating,
}

fn default_rating() -> Rating {
    Rating { rate: 3.5, count: 0 }
}

/// POST /products/add/:userId — admin submission.
async fn add_product(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<AddProductRequest>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let details = req
        .product_details
        .ok_or_else(|| ApiError::validation("Product details are required"))?;
    details.validate().map_err(|e| ApiError::validation(e.to_string()))?;

    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, title, slug, price, description, category, image, discount_percentage, tags, brand, weight, rating, reviews, user_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, '[]', $13, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&details.title)
    .bind(&details.slug)
    .bind(details.price)
    .bind(&details.description)
    .bind(&details.category)
    .bind(&details.image)
    .bind(details.discount_percentage)
    .bind(&details.tags)
    .bind(&details.brand)
    .bind(details.weight)
    .bind(sqlx::types::Json(&details.rating))
    .bind(user_id)
    .fetch_one(&s.db)
    .await?;

    Ok(Json(ApiResponse::ok("Product added successfully", product)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_fills_defaults() {
        let details: NewProduct = serde_json::from_value(serde_json::json!({
            "title": "Widget",
            "slug": "widget",
            "price": 19.99,
            "description": "A widget",
            "category": "tools",
            "image": "https://img.example/widget.png"
        }))
        .unwrap();
        assert!(details.validate().is_ok());
        assert_eq!(details.rating.rate, 3.5);
        assert!(details.tags.is_empty());
    }

    #[test]
    fn new_product_rejects_out_of_range_discount() {
        let details: NewProduct = serde_json::from_value(serde_json::json!({
            "title": "Widget",
            "slug": "widget",
            "price": 19.99,
            "description": "A widget",
            "category": "tools",
            "image": "img",
            "discountPercentage": 120.0
        }))
        .unwrap();
        assert!(details.validate().is_err());
    }
}
