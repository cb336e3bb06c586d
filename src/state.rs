//! Shared per-request state.

use crate::config::Config;
use crate::gateway::GatewayClient;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub gateway: GatewayClient,
    pub config: Config,
}
