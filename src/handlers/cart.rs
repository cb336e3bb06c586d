//! Cart service: per-item atomic mutations plus the cart-with-details view.
//!
//! Every mutation is a single statement keyed by (user, product), so two
//! concurrent requests for the same user cannot lose each other's update.

use axum::{
    extract::{Path, State},
    routing::{post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Address, CartItem, Product};
use crate::response::ApiResponse;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id", post(add_item).get(fetch_cart))
        .route("/updateQuantity/:id", put(update_quantity))
        .route("/deleteItem/:id", put(delete_item))
        .route("/updateSelected/:id", put(update_selected))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub user_id: Option<Uuid>,
    pub quantity: Option<i32>,
}

/// POST /cart/:productId — insert the line or bump its quantity. The
/// requested quantity is honored in both cases.
async fn add_item(
    State(s): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user_id = req.user_id.ok_or_else(|| ApiError::validation("User ID is required"))?;
    let quantity = req.quantity.unwrap_or(1).max(1);

    let exists = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&s.db)
        .await?;
    if exists.is_none() {
        return Err(ApiError::not_found("Product not found"));
    }

    sqlx::query(
        "INSERT INTO cart_items (id, user_id, product_id, quantity, selected, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, TRUE, NOW(), NOW()) \
         ON CONFLICT (user_id, product_id) \
         DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = NOW()",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .execute(&s.db)
    .await?;

    Ok(Json(ApiResponse::message("Product added to cart successfully")))
}

#[derive(Debug, Serialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: i32,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub success: bool,
    pub message: String,
    pub data: Vec<CartLine>,
    pub address: Vec<Address>,
}

/// GET /cart/:userId — line items joined with full product rows, plus every
/// saved address for checkout pre-fill.
async fn fetch_cart(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<CartResponse>, ApiError> {
    let rows = sqlx::query_as::<_, CartItem>(
        "SELECT * FROM cart_items WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&s.db)
    .await?;
    if rows.is_empty() {
        return Err(ApiError::not_found("Cart not found"));
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.product_id).collect();
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_all(&s.db)
        .await?;

    let data = rows
        .iter()
        .filter_map(|row| {
            products.iter().find(|p| p.id == row.product_id).map(|product| CartLine {
                product: product.clone(),
                quantity: row.quantity,
                selected: row.selected,
            })
        })
        .collect();

    let address = sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(&s.db)
        .await?;

    Ok(Json(CartResponse {
        success: true,
        message: "Cart fetched successfully".to_string(),
        data,
        address,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub user_id: Option<Uuid>,
    pub quantity: Option<i32>,
}

/// PUT /cart/updateQuantity/:productId — quantity 0 removes the line.
async fn update_quantity(
    State(s): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user_id = req.user_id.ok_or_else(|| ApiError::validation("User ID is required"))?;
    let quantity = req.quantity.ok_or_else(|| ApiError::validation("Quantity is required"))?;
    if quantity < 0 {
        return Err(ApiError::validation("Quantity must not be negative"));
    }

    let result = if quantity == 0 {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&s.db)
            .await?
    } else {
        sqlx::query(
            "UPDATE cart_items SET quantity = $3, updated_at = NOW() \
             WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&s.db)
        .await?
    };

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Product not found in cart"));
    }
    Ok(Json(ApiResponse::message("Quantity updated successfully")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteItemRequest {
    pub user_id: Option<Uuid>,
}

/// PUT /cart/deleteItem/:productId
async fn delete_item(
    State(s): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<DeleteItemRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user_id = req.user_id.ok_or_else(|| ApiError::validation("User ID is required"))?;

    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(&s.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Product not found in cart"));
    }
    Ok(Json(ApiResponse::message("Item deleted successfully")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSelectedRequest {
    pub user_id: Option<Uuid>,
    pub selected: Option<bool>,
}

/// PUT /cart/updateSelected/:productId
async fn update_selected(
    State(s): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateSelectedRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user_id = req.user_id.ok_or_else(|| ApiError::validation("User ID is required"))?;
    let selected = req.selected.ok_or_else(|| ApiError::validation("Selected is required"))?;

    let result = sqlx::query(
        "UPDATE cart_items SET selected = $3, updated_at = NOW() \
         WHERE user_id = $1 AND product_id = $2",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(selected)
    .execute(&s.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Product not found in cart"));
    }
    Ok(Json(ApiResponse::message("Selected updated successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_bodies_use_frontend_field_names() {
        let req: AddItemRequest =
            serde_json::from_value(serde_json::json!({ "userId": Uuid::nil(), "quantity": 3 })).unwrap();
        assert_eq!(req.quantity, Some(3));

        let req: UpdateSelectedRequest =
            serde_json::from_value(serde_json::json!({ "userId": Uuid::nil(), "selected": false })).unwrap();
        assert_eq!(req.selected, Some(false));
    }

    #[test]
    fn missing_user_id_still_deserializes() {
        // The handler owns the "User ID is required" message, not serde.
        let req: DeleteItemRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(req.user_id.is_none());
    }
}
