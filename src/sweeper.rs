//! Background reconciliation for transactions stuck in Pending.
//!
//! A checkout whose redirect never came back (closed tab, crashed client)
//! leaves a Pending record behind. The sweeper re-asks the gateway for its
//! verdict and finalizes the record Completed or Failed, so every
//! transaction eventually reaches a terminal state.

use std::time::Duration;

use chrono::Utc;

use crate::domain::transaction::TxStatus;
use crate::gateway;
use crate::models::Transaction;
use crate::AppState;

pub async fn run(state: AppState) {
    let mut ticker = tokio::time::interval(Duration::from_secs(state.config.sweep_interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = sweep_once(&state).await {
            tracing::error!(error = %e, "pending-transaction sweep failed");
        }
    }
}

async fn sweep_once(state: &AppState) -> Result<(), sqlx::Error> {
    let cutoff = Utc::now() - chrono::Duration::minutes(state.config.pending_cutoff_mins);
    let stale = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE status = $1 AND created_at < $2",
    )
    .bind(TxStatus::Pending.as_str())
    .bind(cutoff)
    .fetch_all(&state.db)
    .await?;

    for tx in stale {
        match state.gateway.check_status(&tx.transaction_id).await {
            Ok(status) if status.code == gateway::PAYMENT_SUCCESS => {
                let uid = status
                    .data
                    .and_then(|d| d.transaction_id)
                    .unwrap_or_default();
                sqlx::query(
                    "UPDATE transactions SET status = $2, uid = $3, updated_at = NOW() \
                     WHERE id = $1 AND status = $4",
                )
                .bind(tx.id)
                .bind(TxStatus::Completed.as_str())
                .bind(&uid)
                .bind(TxStatus::Pending.as_str())
                .execute(&state.db)
                .await?;
                tracing::info!(transaction = %tx.transaction_id, "stale pending transaction reconciled as completed");
            }
            Ok(status) => {
                sqlx::query(
                    "UPDATE transactions SET status = $2, updated_at = NOW() \
                     WHERE id = $1 AND status = $3",
                )
                .bind(tx.id)
                .bind(TxStatus::Failed.as_str())
                .bind(TxStatus::Pending.as_str())
                .execute(&state.db)
                .await?;
                tracing::info!(transaction = %tx.transaction_id, code = %status.code, "stale pending transaction reconciled as failed");
            }
            Err(e) => {
                // Leave it Pending; the next sweep retries.
                tracing::warn!(transaction = %tx.transaction_id, error = %e, "status check failed during sweep");
            }
        }
    }
    Ok(())
}
