pub mod accrual;
pub mod api;
pub mod db;
pub mod docs;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod notify;
pub mod transactions;
pub mod withdrawals;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_secret: String,
    pub notifier: Arc<dyn Notifier>,
}
