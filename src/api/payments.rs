// src/api/payments.rs

use actix_web::{get, post, web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::api::auth::AuthedMiner;
use crate::errors::LedgerError;
use crate::models::TransactionEntity;
use crate::{db, transactions, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    /// Что оплачивается: депозит на подписку или KYC-сбор.
    #[serde(flatten)]
    pub entity: TransactionEntity,
    pub amount_usd: Decimal,
}

/// Инициация платежа: запись в статусе initialized, её id уходит
/// платёжному провайдеру как reference. Дальше статус ведёт вебхук.
#[utoipa::path(
    post,
    path = "/api/payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Transaction created"),
        (status = 400, description = "Non-positive amount or below plan minimum")
    )
)]
#[post("/payments")]
pub async fn create_payment(
    state: web::Data<AppState>,
    miner: web::ReqData<AuthedMiner>,
    payload: web::Json<CreatePaymentRequest>,
) -> Result<HttpResponse, LedgerError> {
    let tx = transactions::initiate(&state.db, miner.id, payload.entity, payload.amount_usd).await?;

    log::info!(
        "payment initiated: transaction {} by miner {} for {} {}",
        tx.id,
        miner.id,
        tx.amount_usd,
        tx.entity.tag()
    );

    Ok(HttpResponse::Ok().json(json!({
        "transaction_id": tx.id,
        "status": tx.status,
    })))
}

// /api/transactions
#[get("/transactions")]
pub async fn list_transactions(
    state: web::Data<AppState>,
    miner: web::ReqData<AuthedMiner>,
) -> Result<HttpResponse, LedgerError> {
    let txs = db::list_miner_transactions(&state.db, miner.id).await?;
    Ok(HttpResponse::Ok().json(txs))
}
