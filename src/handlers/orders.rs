//! Order history and invoice lookup over completed transactions.

use axum::{extract::{Path, State}, routing::get, Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::transaction::TxStatus;
use crate::error::ApiError;
use crate::models::{Address, Product, Transaction};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invoice/:uid", get(invoice))
        .route("/:userId", get(list_orders))
}

#[derive(Debug, Serialize)]
pub struct OrderItemView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub image: String,
    pub seller: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: Uuid,
    pub date: String,
    pub total: f64,
    pub status: String,
    pub uid: String,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersResponse {
    pub success: bool,
    pub message: String,
    pub order_details: Vec<OrderSummary>,
}

/// GET /orders/:userId — completed transactions, newest first, with each
/// purchased product joined for display.
async fn list_orders(
    State(s): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<OrdersResponse>, ApiError> {
    let transactions = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE user_id = $1 AND status = $2 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .bind(TxStatus::Completed.as_str())
    .fetch_all(&s.db)
    .await?;

    let mut order_details = Vec::with_capacity(transactions.len());
    for tx in transactions {
        let ids: Vec<Uuid> = tx.products.0.iter().map(|p| p.product_id).collect();
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&s.db)
            .await?;
        let items = tx
            .products
            .0
            .iter()
            .filter_map(|p| products.iter().find(|d| d.id == p.product_id))
            .map(|d| OrderItemView {
                id: d.id,
                name: d.title.clone(),
                price: d.price,
                image: d.image.clone(),
                seller: d.brand.clone(),
            })
            .collect();
        order_details.push(OrderSummary {
            order_id: tx.id,
            date: tx.created_at.format("%a %b %d %Y").to_string(),
            total: tx.price,
            status: tx.status.clone(),
            uid: tx.uid.clone(),
            items,
        });
    }

    Ok(Json(OrdersResponse {
        success: true,
        message: "Fetched orders successfully".to_string(),
        order_details,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub success: bool,
    pub message: String,
    pub products: Vec<Product>,
    pub transaction_details: Transaction,
    pub address_details: Option<Address>,
}

/// GET /orders/invoice/:uid — lookup by the gateway-assigned id. An unknown
/// uid is an explicit 404 rather than a null dereference downstream.
async fn invoice(
    State(s): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    if uid.trim().is_empty() {
        return Err(ApiError::validation("Invalid transaction id"));
    }

    let tx = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE uid = $1")
        .bind(&uid)
        .fetch_optional(&s.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;

    let ids: Vec<Uuid> = tx.products.0.iter().map(|p| p.product_id).collect();
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_all(&s.db)
        .await?;
    let address_details = match tx.address_id {
        Some(id) => {
            sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1")
                .bind(id)
                .fetch_optional(&s.db)
                .await?
        }
        None => None,
    };

    Ok(Json(InvoiceResponse {
        success: true,
        message: "Fetched transaction details successfully".to_string(),
        products,
        transaction_details: tx,
        address_details,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn order_summary_serializes_for_the_frontend() {
        let date = chrono::Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();
        let summary = OrderSummary {
            order_id: Uuid::nil(),
            date: date.format("%a %b %d %Y").to_string(),
            total: 200.0,
            status: "Completed".into(),
            uid: "T123".into(),
            items: vec![OrderItemView {
                id: Uuid::nil(),
                name: "Widget".into(),
                price: 100.0,
                image: "img".into(),
                seller: "Acme".into(),
            }],
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["orderId"], serde_json::json!(Uuid::nil()));
        assert_eq!(value["date"], "Tue Aug 25 2026");
        assert_eq!(value["items"][0]["_id"], serde_json::json!(Uuid::nil()));
        assert_eq!(value["items"][0]["seller"], "Acme");
    }
}
