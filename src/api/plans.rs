// src/api/plans.rs

use actix_web::{get, web, HttpResponse};

use crate::db;
use crate::errors::LedgerError;
use crate::AppState;

/// Каталог активных тарифов. Доступен любому аутентифицированному майнеру.
#[utoipa::path(
    get,
    path = "/api/plans",
    responses((status = 200, description = "Active rate plans", body = [crate::models::RatePlan]))
)]
#[get("/plans")]
pub async fn list_plans(state: web::Data<AppState>) -> Result<HttpResponse, LedgerError> {
    let plans = db::list_active_rate_plans(&state.db).await?;
    Ok(HttpResponse::Ok().json(plans))
}
