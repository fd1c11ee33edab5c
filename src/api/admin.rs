// src/api/admin.rs
//
// Административная поверхность: тарифы, ручные проводки, статусы
// платежей и заявок, запуск дневного начисления.

use actix_web::{post, web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::auth::AuthedMiner;
use crate::errors::LedgerError;
use crate::models::{Period, Pool, TransactionStatus, WithdrawalStatus};
use crate::{accrual, db, ledger, transactions, withdrawals, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePlanRequest {
    pub name: String,
    pub period_return_percent: Decimal,
    pub period: Period,
    pub minimum_deposit: Option<Decimal>,
}

#[post("/admin/plans")]
pub async fn create_plan(
    state: web::Data<AppState>,
    admin: web::ReqData<AuthedMiner>,
    payload: web::Json<CreatePlanRequest>,
) -> Result<HttpResponse, LedgerError> {
    admin.require_admin()?;

    if payload.period_return_percent <= Decimal::ZERO {
        return Err(LedgerError::validation(
            "period_return_percent must be positive",
        ));
    }
    let minimum_deposit = payload.minimum_deposit.unwrap_or(Decimal::ZERO);
    if minimum_deposit < Decimal::ZERO {
        return Err(LedgerError::validation("minimum_deposit must not be negative"));
    }

    let row = sqlx::query(
        r#"INSERT INTO rate_plans (name, period_return_percent, period, minimum_deposit)
           VALUES (?1, ?2, ?3, ?4)
           RETURNING *"#,
    )
    .bind(&payload.name)
    .bind(payload.period_return_percent.to_string())
    .bind(payload.period.as_str())
    .bind(minimum_deposit.to_string())
    .fetch_one(&state.db)
    .await
    .map_err(crate::errors::storage("rate_plan", 0))?;

    let plan = db::map_rate_plan(&row)?;
    Ok(HttpResponse::Ok().json(plan))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePlanRequest {
    pub name: Option<String>,
    pub period_return_percent: Option<Decimal>,
    pub period: Option<Period>,
    pub minimum_deposit: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Правка тарифа: меняются только присланные поля. Деактивация убирает
/// тариф из витрины; существующие подписки продолжают начисляться.
#[post("/admin/plans/{id}")]
pub async fn update_plan(
    state: web::Data<AppState>,
    admin: web::ReqData<AuthedMiner>,
    path: web::Path<i64>,
    payload: web::Json<UpdatePlanRequest>,
) -> Result<HttpResponse, LedgerError> {
    admin.require_admin()?;

    let plan_id = path.into_inner();
    let plan = db::get_rate_plan(&state.db, plan_id).await?;
    let payload = payload.into_inner();

    let percent = payload
        .period_return_percent
        .unwrap_or(plan.period_return_percent);
    if percent <= Decimal::ZERO {
        return Err(LedgerError::validation(
            "period_return_percent must be positive",
        ));
    }
    let minimum_deposit = payload.minimum_deposit.unwrap_or(plan.minimum_deposit);
    if minimum_deposit < Decimal::ZERO {
        return Err(LedgerError::validation("minimum_deposit must not be negative"));
    }
    let name = payload.name.unwrap_or(plan.name);
    let period = payload.period.unwrap_or(plan.period);
    let is_active = payload.is_active.unwrap_or(plan.is_active);

    let row = sqlx::query(
        r#"UPDATE rate_plans
           SET name = ?1, period_return_percent = ?2, period = ?3,
               minimum_deposit = ?4, is_active = ?5
           WHERE id = ?6
           RETURNING *"#,
    )
    .bind(&name)
    .bind(percent.to_string())
    .bind(period.as_str())
    .bind(minimum_deposit.to_string())
    .bind(is_active)
    .bind(plan_id)
    .fetch_one(&state.db)
    .await
    .map_err(crate::errors::storage("rate_plan", plan_id))?;

    log::info!("admin {} updated rate plan {plan_id}", admin.id);

    let plan = db::map_rate_plan(&row)?;
    Ok(HttpResponse::Ok().json(plan))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ManualCreditRequest {
    pub pool: Pool,
    pub amount: Decimal,
}

/// Ручная проводка администратора в любой из пулов.
#[post("/admin/subscriptions/{id}/credit")]
pub async fn credit_subscription(
    state: web::Data<AppState>,
    admin: web::ReqData<AuthedMiner>,
    path: web::Path<i64>,
    payload: web::Json<ManualCreditRequest>,
) -> Result<HttpResponse, LedgerError> {
    admin.require_admin()?;

    let subscription_id = path.into_inner();
    let sub = ledger::credit(&state.db, subscription_id, payload.pool, payload.amount).await?;

    log::info!(
        "admin {} credited {} to {} of subscription {subscription_id}",
        admin.id,
        payload.amount,
        payload.pool
    );

    Ok(HttpResponse::Ok().json(sub))
}

#[post("/admin/subscriptions/{id}/deactivate")]
pub async fn deactivate_subscription(
    state: web::Data<AppState>,
    admin: web::ReqData<AuthedMiner>,
    path: web::Path<i64>,
) -> Result<HttpResponse, LedgerError> {
    admin.require_admin()?;

    let subscription_id = path.into_inner();
    ledger::deactivate(&state.db, subscription_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"ok": true})))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTransactionStatusRequest {
    pub status: TransactionStatus,
}

#[post("/admin/transactions/{id}/status")]
pub async fn update_transaction_status(
    state: web::Data<AppState>,
    admin: web::ReqData<AuthedMiner>,
    path: web::Path<i64>,
    payload: web::Json<UpdateTransactionStatusRequest>,
) -> Result<HttpResponse, LedgerError> {
    admin.require_admin()?;

    let outcome = transactions::update_status(
        &state.db,
        state.notifier.as_ref(),
        path.into_inner(),
        payload.status,
    )
    .await?;

    Ok(HttpResponse::Ok().json(outcome.transaction))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateWithdrawalStatusRequest {
    pub status: WithdrawalStatus,
    pub rejection_reason: Option<String>,
}

#[post("/admin/withdrawals/{id}/status")]
pub async fn update_withdrawal_status(
    state: web::Data<AppState>,
    admin: web::ReqData<AuthedMiner>,
    path: web::Path<i64>,
    payload: web::Json<UpdateWithdrawalStatusRequest>,
) -> Result<HttpResponse, LedgerError> {
    admin.require_admin()?;

    let payload = payload.into_inner();
    let wd = withdrawals::update_status(
        &state.db,
        state.notifier.as_ref(),
        path.into_inner(),
        payload.status,
        payload.rejection_reason,
        admin.id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(wd))
}

/// Ручной запуск дневного начисления. По расписанию его дергает cron
/// снаружи; защита от второго запуска в тот же день — на вызывающей
/// стороне.
#[utoipa::path(
    post,
    path = "/api/admin/accrual/run",
    responses((status = 200, description = "Sweep report", body = crate::accrual::AccrualReport))
)]
#[post("/admin/accrual/run")]
pub async fn run_accrual(
    state: web::Data<AppState>,
    admin: web::ReqData<AuthedMiner>,
) -> Result<HttpResponse, LedgerError> {
    admin.require_admin()?;

    let report = accrual::run_daily_accrual(&state.db).await?;
    Ok(HttpResponse::Ok().json(report))
}
