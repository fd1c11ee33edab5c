// src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::Pool;

/// Единая таксономия ошибок ядра. Всё, что уходит из сервисных функций
/// наружу, — один из этих вариантов; ошибки хранилища заворачиваются
/// с типом сущности и id, чтобы их можно было диагностировать по логу.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("insufficient {pool} balance: requested {requested}, available {available} (short {shortfall})", shortfall = .requested - .available)]
    InsufficientBalance {
        pool: Pool,
        requested: Decimal,
        available: Decimal,
    },

    #[error("invalid status transition {from} -> {to} for {entity} {id}")]
    InvalidTransition {
        entity: &'static str,
        id: i64,
        from: &'static str,
        to: &'static str,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("storage error on {entity} {id}: {detail}")]
    Storage {
        entity: &'static str,
        id: i64,
        detail: String,
    },
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }
}

/// `.map_err(storage("subscription", id))`
pub fn storage(entity: &'static str, id: i64) -> impl FnOnce(sqlx::Error) -> LedgerError {
    move |e| LedgerError::Storage {
        entity,
        id,
        detail: e.to_string(),
    }
}

impl ResponseError for LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
            LedgerError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::InvalidTransition { .. } => StatusCode::CONFLICT,
            LedgerError::Conflict(_) => StatusCode::CONFLICT,
            LedgerError::Forbidden(_) => StatusCode::FORBIDDEN,
            LedgerError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let LedgerError::Storage { .. } = self {
            log::error!("{self}");
        }
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}
