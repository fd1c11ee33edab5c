// src/db.rs
//
// Маппинг строк и простые выборки. Балансы и денежные суммы лежат в
// SQLite как TEXT и парсятся в Decimal здесь; битая строка — это
// ошибка хранилища с контекстом (сущность + id + колонка).

use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::errors::{storage, LedgerError};
use crate::models::{
    KycFee, Miner, Period, Pool, RatePlan, Role, Subscription, Transaction, TransactionEntity,
    TransactionStatus, Withdrawal, WithdrawalStatus,
};

pub fn parse_decimal(
    raw: &str,
    entity: &'static str,
    id: i64,
    column: &str,
) -> Result<Decimal, LedgerError> {
    Decimal::from_str(raw.trim()).map_err(|e| LedgerError::Storage {
        entity,
        id,
        detail: format!("bad decimal in {column}: {e}"),
    })
}

fn decimal_col(
    row: &SqliteRow,
    entity: &'static str,
    id: i64,
    column: &str,
) -> Result<Decimal, LedgerError> {
    let raw: String = row.get(column);
    parse_decimal(&raw, entity, id, column)
}

pub fn map_subscription(row: &SqliteRow) -> Result<Subscription, LedgerError> {
    let id: i64 = row.get("id");
    Ok(Subscription {
        id,
        miner_id: row.get("miner_id"),
        rate_plan_id: row.get("rate_plan_id"),
        amount_deposited: decimal_col(row, "subscription", id, "amount_deposited")?,
        earnings: decimal_col(row, "subscription", id, "earnings")?,
        is_active: row.get("is_active"),
        auto_accrue: row.get("auto_accrue"),
        currency: row.get("currency"),
        symbol: row.get("symbol"),
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

pub fn map_rate_plan(row: &SqliteRow) -> Result<RatePlan, LedgerError> {
    let id: i64 = row.get("id");
    let period_raw: String = row.get("period");
    let period = Period::parse(&period_raw).ok_or_else(|| LedgerError::Storage {
        entity: "rate_plan",
        id,
        detail: format!("unknown period '{period_raw}'"),
    })?;
    Ok(RatePlan {
        id,
        name: row.get("name"),
        period_return_percent: decimal_col(row, "rate_plan", id, "period_return_percent")?,
        period,
        minimum_deposit: decimal_col(row, "rate_plan", id, "minimum_deposit")?,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    })
}

pub fn map_transaction(row: &SqliteRow) -> Result<Transaction, LedgerError> {
    let id: i64 = row.get("id");
    let entity_raw: String = row.get("entity");
    let entity_id: i64 = row.get("entity_id");
    let entity =
        TransactionEntity::parse(&entity_raw, entity_id).ok_or_else(|| LedgerError::Storage {
            entity: "transaction",
            id,
            detail: format!("unknown entity tag '{entity_raw}'"),
        })?;
    let status_raw: String = row.get("status");
    let status = TransactionStatus::parse(&status_raw).ok_or_else(|| LedgerError::Storage {
        entity: "transaction",
        id,
        detail: format!("unknown status '{status_raw}'"),
    })?;
    Ok(Transaction {
        id,
        miner_id: row.get("miner_id"),
        entity,
        amount_usd: decimal_col(row, "transaction", id, "amount_usd")?,
        status,
        paid_at: row.get("paid_at"),
        created_at: row.get("created_at"),
    })
}

pub fn map_withdrawal(row: &SqliteRow) -> Result<Withdrawal, LedgerError> {
    let id: i64 = row.get("id");
    let pool_raw: String = row.get("type");
    let pool = Pool::parse(&pool_raw).ok_or_else(|| LedgerError::Storage {
        entity: "withdrawal",
        id,
        detail: format!("unknown pool '{pool_raw}'"),
    })?;
    let status_raw: String = row.get("status");
    let status = WithdrawalStatus::parse(&status_raw).ok_or_else(|| LedgerError::Storage {
        entity: "withdrawal",
        id,
        detail: format!("unknown status '{status_raw}'"),
    })?;
    Ok(Withdrawal {
        id,
        miner_id: row.get("miner_id"),
        subscription_id: row.get("subscription_id"),
        pool,
        amount: decimal_col(row, "withdrawal", id, "amount")?,
        status,
        rejection_reason: row.get("rejection_reason"),
        processed_by: row.get("processed_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

pub fn map_kyc_fee(row: &SqliteRow) -> Result<KycFee, LedgerError> {
    let id: i64 = row.get("id");
    Ok(KycFee {
        id,
        miner_id: row.get("miner_id"),
        amount: decimal_col(row, "kyc_fee", id, "amount")?,
        is_paid: row.get("is_paid"),
        paid_at: row.get("paid_at"),
        created_at: row.get("created_at"),
    })
}

pub fn map_miner(row: &SqliteRow) -> Result<Miner, LedgerError> {
    let id: i64 = row.get("id");
    let role_raw: String = row.get("role");
    let role = Role::parse(&role_raw).ok_or_else(|| LedgerError::Storage {
        entity: "miner",
        id,
        detail: format!("unknown role '{role_raw}'"),
    })?;
    Ok(Miner {
        id,
        email: row.get("email"),
        display_name: row.get("display_name"),
        role,
        created_at: row.get("created_at"),
    })
}

pub async fn get_miner(pool: &SqlitePool, id: i64) -> Result<Miner, LedgerError> {
    let row = sqlx::query("SELECT * FROM miners WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(storage("miner", id))?;
    let row = row.ok_or(LedgerError::NotFound { entity: "miner", id })?;
    map_miner(&row)
}

pub async fn get_rate_plan(pool: &SqlitePool, id: i64) -> Result<RatePlan, LedgerError> {
    let row = sqlx::query("SELECT * FROM rate_plans WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(storage("rate_plan", id))?;
    let row = row.ok_or(LedgerError::NotFound { entity: "rate_plan", id })?;
    map_rate_plan(&row)
}

pub async fn list_active_rate_plans(pool: &SqlitePool) -> Result<Vec<RatePlan>, LedgerError> {
    let rows = sqlx::query(
        "SELECT * FROM rate_plans WHERE is_active = 1 ORDER BY minimum_deposit ASC",
    )
    .fetch_all(pool)
    .await
    .map_err(storage("rate_plan", 0))?;

    rows.iter().map(map_rate_plan).collect()
}

pub async fn get_kyc_fee(pool: &SqlitePool, id: i64) -> Result<KycFee, LedgerError> {
    let row = sqlx::query("SELECT * FROM kyc_fees WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(storage("kyc_fee", id))?;
    let row = row.ok_or(LedgerError::NotFound { entity: "kyc_fee", id })?;
    map_kyc_fee(&row)
}

pub async fn list_miner_subscriptions(
    pool: &SqlitePool,
    miner_id: i64,
) -> Result<Vec<Subscription>, LedgerError> {
    let rows = sqlx::query(
        "SELECT * FROM subscriptions WHERE miner_id = ?1 ORDER BY created_at DESC, id DESC",
    )
    .bind(miner_id)
    .fetch_all(pool)
    .await
    .map_err(storage("subscription", 0))?;

    rows.iter().map(map_subscription).collect()
}

pub async fn list_miner_transactions(
    pool: &SqlitePool,
    miner_id: i64,
) -> Result<Vec<Transaction>, LedgerError> {
    let rows = sqlx::query(
        "SELECT * FROM transactions WHERE miner_id = ?1 ORDER BY created_at DESC, id DESC",
    )
    .bind(miner_id)
    .fetch_all(pool)
    .await
    .map_err(storage("transaction", 0))?;

    rows.iter().map(map_transaction).collect()
}

pub async fn list_miner_withdrawals(
    pool: &SqlitePool,
    miner_id: i64,
) -> Result<Vec<Withdrawal>, LedgerError> {
    let rows = sqlx::query(
        "SELECT * FROM withdrawals WHERE miner_id = ?1 ORDER BY created_at DESC, id DESC",
    )
    .bind(miner_id)
    .fetch_all(pool)
    .await
    .map_err(storage("withdrawal", 0))?;

    rows.iter().map(map_withdrawal).collect()
}
