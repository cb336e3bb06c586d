//! Storefront backend
//!
//! REST API for a small e-commerce storefront: product catalog, per-user
//! cart, checkout against an external payment gateway, and order/invoice
//! history.
//!
//! ## Layout
//! - [`config`] — process configuration, loaded once at startup
//! - [`domain`] — pure business logic (pricing, transaction lifecycle)
//! - [`gateway`] — signed HTTP client for the payment gateway sandbox
//! - [`handlers`] — one axum router per resource
//! - [`sweeper`] — background reconciliation of stale pending transactions

pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod response;
pub mod state;
pub mod sweeper;

pub use state::AppState;
