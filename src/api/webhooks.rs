// src/api/webhooks.rs
//
// Публичный колбэк платёжного провайдера. Точный payload у провайдеров
// гуляет, поддерживаем минимум:
// - reference / referenceId (наш transaction id)
// - status (succeeded/failed) или paid=true

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::errors::LedgerError;
use crate::models::TransactionStatus;
use crate::{transactions, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentWebhook {
    #[serde(alias = "referenceId", alias = "reference_id")]
    pub reference: String,

    pub status: Option<String>,

    pub paid: Option<bool>,

    #[serde(flatten)]
    pub extra: serde_json::Value,
}

fn is_succeeded(payload: &PaymentWebhook) -> bool {
    if payload.paid.unwrap_or(false) {
        return true;
    }
    matches!(
        payload.status.as_deref(),
        Some("succeeded") | Some("success") | Some("paid") | Some("completed")
    )
}

fn is_failed(payload: &PaymentWebhook) -> bool {
    matches!(
        payload.status.as_deref(),
        Some("failed") | Some("fail") | Some("canceled") | Some("expired")
    )
}

#[utoipa::path(
    post,
    path = "/webhook/payment",
    request_body = PaymentWebhook,
    responses((status = 200, description = "Always 200 so the provider stops retrying"))
)]
#[post("/webhook/payment")]
pub async fn payment_webhook(
    payload: web::Json<PaymentWebhook>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let payload = payload.into_inner();

    // Неизвестный reference — отвечаем OK, чтобы провайдер не ретраил вечно.
    let Ok(transaction_id) = payload.reference.parse::<i64>() else {
        log::warn!("payment webhook with malformed reference '{}'", payload.reference);
        return HttpResponse::Ok().json(serde_json::json!({"ok": true, "ignored": true}));
    };

    let new_status = if is_failed(&payload) {
        TransactionStatus::Failed
    } else if is_succeeded(&payload) {
        TransactionStatus::Successful
    } else {
        // Промежуточный статус провайдера: платёж взят в работу.
        TransactionStatus::Pending
    };

    match transactions::update_status(&state.db, state.notifier.as_ref(), transaction_id, new_status)
        .await
    {
        Ok(outcome) if outcome.idempotent => {
            HttpResponse::Ok().json(serde_json::json!({"ok": true, "idempotent": true}))
        }
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({"ok": true})),
        Err(LedgerError::NotFound { .. }) => {
            HttpResponse::Ok().json(serde_json::json!({"ok": true, "ignored": true}))
        }
        Err(LedgerError::InvalidTransition { .. }) => {
            // Поздний или продублированный колбэк — не повод для ретраев.
            HttpResponse::Ok().json(serde_json::json!({"ok": true, "stale": true}))
        }
        Err(e) => {
            log::error!("payment webhook for transaction {transaction_id} failed: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
