//! Checkout and the gateway callback.
//!
//! Checkout converts a declared order into a gateway pay-page session and a
//! Pending transaction snapshot. The callback re-checks the gateway's view
//! of the payment and finalizes the transaction exactly once.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::pricing::{self, PricedLine};
use crate::domain::transaction::{merchant_transaction_id, TxStatus};
use crate::error::ApiError;
use crate::gateway::{self, GatewayError, PayRequest, PaymentInstrument};
use crate::models::{Address, Product, PurchasedItem, Transaction, User};
use crate::response::ApiResponse;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(initiate))
        .route("/callback/:id", post(callback))
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub street: String,
    #[validate(length(min = 1))]
    pub city: String,
    pub state: String,
    #[validate(length(min = 1))]
    pub zip: String,
    pub country: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_id: Option<Uuid>,
    pub products: Option<Vec<PurchasedItem>>,
    /// Client-computed total; advisory only, see below.
    pub price: Option<f64>,
    pub address: Option<AddressPayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub message: String,
    pub redirect_url: String,
}

/// POST /payment — initiate a checkout, returning the gateway redirect URL.
async fn initiate(
    State(s): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let user_id = req.user_id.ok_or_else(|| ApiError::validation("Please provide all details"))?;
    let items = req
        .products
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation("Please provide all details"))?;
    let declared_price = req.price.ok_or_else(|| ApiError::validation("Please provide all details"))?;
    let address = req.address.ok_or_else(|| ApiError::validation("Please provide all details"))?;
    address.validate().map_err(|e| ApiError::validation(e.to_string()))?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&s.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    // The gateway is charged the server-computed total from catalog prices;
    // the client's figure is only compared against it.
    let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(&ids)
        .fetch_all(&s.db)
        .await?;
    let mut lines = Vec::with_capacity(items.len());
    for item in &items {
        let product = products
            .iter()
            .find(|p| p.id == item.product_id)
            .ok_or_else(|| ApiError::not_found("Product not found"))?;
        lines.push(PricedLine { unit_price: product.price, quantity: item.quantity });
    }
    let total = pricing::order_total(&lines);
    if pricing::price_mismatch(declared_price, total) {
        tracing::warn!(
            declared = declared_price,
            computed = total,
            "client checkout price disagrees with catalog"
        );
    }

    let txn_id = merchant_transaction_id();
    let status_url = format!("{}/status/{}", s.config.app_base_url, txn_id);
    let pay = PayRequest {
        merchant_id: s.config.gateway.merchant_id.clone(),
        merchant_transaction_id: txn_id.clone(),
        name: user.name.clone(),
        amount: pricing::to_minor_units(total),
        redirect_url: status_url.clone(),
        redirect_mode: "REDIRECT".to_string(),
        callback_url: status_url,
        payment_instrument: PaymentInstrument::pay_page(),
    };

    let response = s.gateway.initiate_pay(&pay).await?;
    let redirect_url = gateway::redirect_url(&response)
        .ok_or_else(|| GatewayError::UnexpectedResponse("pay response carried no redirect url".to_string()))?
        .to_string();

    // The session exists on the gateway side; persist the snapshot.
    let address_id = upsert_address(&s.db, user_id, &address).await?;
    sqlx::query(
        "INSERT INTO transactions (id, user_id, products, price, transaction_id, uid, status, address_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, '', $6, $7, NOW(), NOW())",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(sqlx::types::Json(&items))
    .bind(total)
    .bind(&txn_id)
    .bind(TxStatus::Pending.as_str())
    .bind(address_id)
    .execute(&s.db)
    .await?;

    tracing::info!(transaction = %txn_id, amount = pay.amount, "payment session created");
    Ok(Json(CheckoutResponse {
        success: true,
        message: "Payment processed successfully".to_string(),
        redirect_url,
    }))
}

/// Addresses are deduplicated per (user, email) and reused across checkouts.
async fn upsert_address(db: &sqlx::PgPool, user_id: Uuid, payload: &AddressPayload) -> Result<Uuid, ApiError> {
    let existing = sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE user_id = $1 AND email = $2")
        .bind(user_id)
        .bind(&payload.email)
        .fetch_optional(db)
        .await?;
    if let Some(address) = existing {
        return Ok(address.id);
    }

    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO addresses (id, user_id, name, email, street, city, state, zip, country, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())",
    )
    .bind(id)
    .bind(user_id)
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.street)
    .bind(&payload.city)
    .bind(&payload.state)
    .bind(&payload.zip)
    .bind(&payload.country)
    .execute(db)
    .await?;
    Ok(id)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDetail {
    pub success: bool,
    pub message: String,
    pub products: Vec<Product>,
    pub transaction_details: Transaction,
    pub address_details: Option<Address>,
}

/// POST /payment/callback/:merchantTransactionId — finalize after the
/// gateway redirect. Success empties the whole cart, selected or not;
/// anything else marks the transaction Failed and leaves the cart alone.
async fn callback(
    State(s): State<AppState>,
    Path(txn_id): Path<String>,
    Json(req): Json<CallbackRequest>,
) -> Result<Response, ApiError> {
    let user_id = req.user_id.ok_or_else(|| ApiError::validation("User ID is required"))?;

    let status = s.gateway.check_status(&txn_id).await?;
    if status.code != gateway::PAYMENT_SUCCESS {
        tracing::warn!(transaction = %txn_id, code = %status.code, "gateway reported non-success");
        let failed = sqlx::query(
            "UPDATE transactions SET status = $2, updated_at = NOW() \
             WHERE transaction_id = $1 AND status = $3",
        )
        .bind(&txn_id)
        .bind(TxStatus::Failed.as_str())
        .bind(TxStatus::Pending.as_str())
        .execute(&s.db)
        .await?;
        if failed.rows_affected() > 0 {
            tracing::info!(transaction = %txn_id, "transaction marked failed");
        }
        return Ok(Json(ApiResponse::<()>::failure("Payment failed")).into_response());
    }

    let tx = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE transaction_id = $1")
        .bind(&txn_id)
        .fetch_optional(&s.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction not found"))?;

    let uid = status
        .data
        .as_ref()
        .and_then(|d| d.transaction_id.clone())
        .unwrap_or_default();

    // Guarded update: Pending -> Completed happens at most once even when
    // the status page retries the callback.
    let completed = sqlx::query_as::<_, Transaction>(
        "UPDATE transactions SET status = $2, uid = $3, updated_at = NOW() \
         WHERE transaction_id = $1 AND status = $4 RETURNING *",
    )
    .bind(&txn_id)
    .bind(TxStatus::Completed.as_str())
    .bind(&uid)
    .bind(TxStatus::Pending.as_str())
    .fetch_optional(&s.db)
    .await?;

    let tx = match completed {
        Some(tx) => {
            // The whole cart goes, unselected items included. An already
            // empty cart is fine here.
            sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
                .bind(user_id)
                .execute(&s.db)
                .await?;
            tracing::info!(transaction = %txn_id, uid = %tx.uid, "transaction completed, cart cleared");
            tx
        }
        None => {
            if TxStatus::parse(&tx.status) != Some(TxStatus::Completed) {
                // Sweeper or an earlier callback already marked it Failed,
                // yet the gateway now claims success. Needs a human.
                tracing::error!(transaction = %txn_id, status = %tx.status, "gateway success for a transaction not completed locally");
                return Ok(Json(ApiResponse::<()>::failure("Payment failed")).into_response());
            }
            tx
        }
    };

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

    Ok(Json(CheckoutDetail {
        success: true,
        message: "Payment processed successfully".to_string(),
        products,
        transaction_details: tx,
        address_details,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_request_accepts_the_frontend_shape() {
        let req: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "userId": Uuid::nil(),
            "products": [{ "productId": Uuid::nil(), "quantity": 2 }],
            "price": 200.0,
            "address": {
                "name": "Ana", "email": "ana@example.com", "street": "1 Main St",
                "city": "Pune", "state": "MH", "zip": "411001", "country": "IN"
            }
        }))
        .unwrap();
        assert_eq!(req.products.unwrap()[0].quantity, 2);
        assert!(req.address.unwrap().validate().is_ok());
    }

    #[test]
    fn address_payload_rejects_a_bad_email() {
        let address = AddressPayload {
            name: "Ana".into(),
            email: "not-an-email".into(),
            street: "1 Main St".into(),
            city: "Pune".into(),
            state: "MH".into(),
            zip: "411001".into(),
            country: "IN".into(),
        };
        assert!(address.validate().is_err());
    }
}
