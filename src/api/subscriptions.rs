// src/api/subscriptions.rs

use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::auth::AuthedMiner;
use crate::errors::LedgerError;
use crate::{db, ledger, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    pub rate_plan_id: i64,
    /// По умолчанию начисления включены.
    pub auto_accrue: Option<bool>,
}

/// Майнер выбирает тариф; позиция создаётся с нулевыми балансами и
/// активируется первым успешным депозитом.
#[post("/subscriptions")]
pub async fn create_subscription(
    state: web::Data<AppState>,
    miner: web::ReqData<AuthedMiner>,
    payload: web::Json<CreateSubscriptionRequest>,
) -> Result<HttpResponse, LedgerError> {
    let sub = ledger::create_subscription(
        &state.db,
        miner.id,
        payload.rate_plan_id,
        payload.auto_accrue.unwrap_or(true),
    )
    .await?;

    Ok(HttpResponse::Ok().json(sub))
}

// /api/subscriptions
#[get("/subscriptions")]
pub async fn list_subscriptions(
    state: web::Data<AppState>,
    miner: web::ReqData<AuthedMiner>,
) -> Result<HttpResponse, LedgerError> {
    let subs = db::list_miner_subscriptions(&state.db, miner.id).await?;
    Ok(HttpResponse::Ok().json(subs))
}
