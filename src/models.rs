//! Persisted row types for the five stores (plus users, provisioned by the
//! external identity layer). JSON field names are camelCase to match what
//! the frontend already consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub rate: f64,
    pub count: i64,
}

/// Review as embedded in the product document (seed data shape). Submitted
/// reviews live in their own table and are mapped into this shape for the
/// product detail view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedReview {
    pub rating: i32,
    pub comment: String,
    pub date: DateTime<Utc>,
    pub reviewer_name: String,
    pub reviewer_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image: String,
    pub discount_percentage: f64,
    pub tags: Vec<String>,
    pub brand: String,
    pub weight: Option<f64>,
    pub rating: Json<Rating>,
    pub reviews: Json<Vec<EmbeddedReview>>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One cart line. At most one row per (user, product), enforced by the
/// database, so add-to-cart is a single upsert.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub selected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

/// An entry of the purchased-products snapshot stored on a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasedItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// One checkout attempt. `products` and `price` are immutable after insert;
/// only `status` and `uid` change, and only on the Pending -> terminal edge.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub products: Json<Vec<PurchasedItem>>,
    pub price: f64,
    /// Merchant-generated id, e.g. `Tr-3f9a1c`.
    pub transaction_id: String,
    /// Gateway-assigned id; empty until the gateway confirms success.
    pub uid: String,
    pub status: String,
    pub address_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub reviewer_name: String,
    pub reviewer_email: Option<String>,
    pub review: String,
    pub rating: i32,
    pub product_id: Uuid,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Review> for EmbeddedReview {
    fn from(r: &Review) -> Self {
        Self {
            rating: r.rating,
            comment: r.review.clone(),
            date: r.created_at,
            reviewer_name: r.reviewer_name.clone(),
            reviewer_email: r.reviewer_email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchased_item_uses_camel_case() {
        let item: PurchasedItem =
            serde_json::from_value(serde_json::json!({ "productId": Uuid::nil(), "quantity": 2 })).unwrap();
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn submitted_review_maps_to_embedded_shape() {
        let review = Review {
            id: Uuid::nil(),
            reviewer_name: "Ana".into(),
            reviewer_email: None,
            review: "Solid".into(),
            rating: 4,
            product_id: Uuid::nil(),
            is_verified: true,
            created_at: Utc::now(),
        };
        let embedded = EmbeddedReview::from(&review);
        assert_eq!(embedded.comment, "Solid");
        assert_eq!(embedded.rating, 4);
    }
}
