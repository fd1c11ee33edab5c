// src/api/withdrawals.rs

use actix_web::{get, post, web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::auth::AuthedMiner;
use crate::errors::LedgerError;
use crate::models::Pool;
use crate::{db, withdrawals, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWithdrawalRequest {
    pub subscription_id: i64,
    /// Из какого пула выводим: deposit или earnings.
    #[serde(rename = "type")]
    pub pool: Pool,
    pub amount: Decimal,
}

/// Заявка на вывод. Сумма проверяется против живого баланса пула;
/// одобрение и выплата — за администратором.
#[utoipa::path(
    post,
    path = "/api/withdrawals",
    request_body = CreateWithdrawalRequest,
    responses(
        (status = 200, description = "Withdrawal created", body = crate::models::Withdrawal),
        (status = 422, description = "Amount exceeds the pool balance")
    )
)]
#[post("/withdrawals")]
pub async fn create_withdrawal(
    state: web::Data<AppState>,
    miner: web::ReqData<AuthedMiner>,
    payload: web::Json<CreateWithdrawalRequest>,
) -> Result<HttpResponse, LedgerError> {
    let wd = withdrawals::request(
        &state.db,
        miner.id,
        payload.subscription_id,
        payload.pool,
        payload.amount,
    )
    .await?;

    log::info!(
        "withdrawal {} requested: miner {} wants {} from {} of subscription {}",
        wd.id,
        miner.id,
        wd.amount,
        wd.pool,
        wd.subscription_id
    );

    Ok(HttpResponse::Ok().json(wd))
}

/// Отмена своей заявки, пока она pending.
#[post("/withdrawals/{id}/cancel")]
pub async fn cancel_withdrawal(
    state: web::Data<AppState>,
    miner: web::ReqData<AuthedMiner>,
    path: web::Path<i64>,
) -> Result<HttpResponse, LedgerError> {
    let wd = withdrawals::cancel(&state.db, miner.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(wd))
}

// /api/withdrawals
#[get("/withdrawals")]
pub async fn list_withdrawals(
    state: web::Data<AppState>,
    miner: web::ReqData<AuthedMiner>,
) -> Result<HttpResponse, LedgerError> {
    let wds = db::list_miner_withdrawals(&state.db, miner.id).await?;
    Ok(HttpResponse::Ok().json(wds))
}
