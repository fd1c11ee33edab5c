// src/ledger.rs
//
// Единственная точка, через которую меняются балансы подписки.
// Запись идёт через optimistic version check: читаем строку, считаем
// новый баланс в Decimal, пишем с условием `version = ?`. Проигравший
// гонку перечитывает и повторяет проверку — так дебет никогда не
// уводит баланс в минус, даже при конкурентных запросах.

use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::db::{self, map_subscription};
use crate::errors::{storage, LedgerError};
use crate::models::{Pool, Subscription};

/// Сколько раз перечитываем строку при проигрыше version check,
/// прежде чем вернуть Conflict.
const CAS_RETRIES: u32 = 5;

pub async fn get_subscription(pool: &SqlitePool, id: i64) -> Result<Subscription, LedgerError> {
    let row = sqlx::query("SELECT * FROM subscriptions WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(storage("subscription", id))?;
    let row = row.ok_or(LedgerError::NotFound { entity: "subscription", id })?;
    map_subscription(&row)
}

/// Создание позиции: нулевые балансы, неактивна до первого успешного
/// депозитного платежа.
pub async fn create_subscription(
    pool: &SqlitePool,
    miner_id: i64,
    rate_plan_id: i64,
    auto_accrue: bool,
) -> Result<Subscription, LedgerError> {
    let plan = db::get_rate_plan(pool, rate_plan_id).await?;
    if !plan.is_active {
        return Err(LedgerError::validation("rate plan is not active"));
    }

    let row = sqlx::query(
        r#"INSERT INTO subscriptions (miner_id, rate_plan_id, auto_accrue)
           VALUES (?1, ?2, ?3)
           RETURNING *"#,
    )
    .bind(miner_id)
    .bind(rate_plan_id)
    .bind(auto_accrue)
    .fetch_one(pool)
    .await
    .map_err(storage("subscription", 0))?;

    map_subscription(&row)
}

fn balance_column(pool: Pool) -> &'static str {
    match pool {
        Pool::Deposit => "amount_deposited",
        Pool::Earnings => "earnings",
    }
}

async fn apply_delta(
    db: &SqlitePool,
    subscription_id: i64,
    pool: Pool,
    delta: Decimal,
    is_debit: bool,
) -> Result<Subscription, LedgerError> {
    if delta <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "{} amount must be positive, got {delta}",
            if is_debit { "debit" } else { "credit" }
        )));
    }

    let column = balance_column(pool);
    // Имя колонки приходит из enum, не из запроса.
    let sql = format!(
        "UPDATE subscriptions
         SET {column} = ?1, version = version + 1, updated_at = datetime('now')
         WHERE id = ?2 AND version = ?3"
    );

    for _ in 0..CAS_RETRIES {
        let sub = get_subscription(db, subscription_id).await?;
        let current = sub.balance(pool);

        let next = if is_debit {
            if delta > current {
                return Err(LedgerError::InsufficientBalance {
                    pool,
                    requested: delta,
                    available: current,
                });
            }
            current - delta
        } else {
            current + delta
        };

        let result = sqlx::query(&sql)
            .bind(next.to_string())
            .bind(subscription_id)
            .bind(sub.version)
            .execute(db)
            .await
            .map_err(storage("subscription", subscription_id))?;

        if result.rows_affected() == 1 {
            return get_subscription(db, subscription_id).await;
        }
        // Кто-то успел изменить баланс между чтением и записью.
        log::debug!("balance CAS retry for subscription {subscription_id}");
    }

    Err(LedgerError::Conflict(format!(
        "subscription {subscription_id} balance is contended, giving up after {CAS_RETRIES} attempts"
    )))
}

pub async fn credit(
    db: &SqlitePool,
    subscription_id: i64,
    pool: Pool,
    amount: Decimal,
) -> Result<Subscription, LedgerError> {
    apply_delta(db, subscription_id, pool, amount, false).await
}

pub async fn debit(
    db: &SqlitePool,
    subscription_id: i64,
    pool: Pool,
    amount: Decimal,
) -> Result<Subscription, LedgerError> {
    apply_delta(db, subscription_id, pool, amount, true).await
}

/// Активация ровно один раз: повторный вызов — no-op.
/// Возвращает true, если подписка была активирована именно сейчас.
pub async fn activate(db: &SqlitePool, subscription_id: i64) -> Result<bool, LedgerError> {
    let result = sqlx::query(
        "UPDATE subscriptions
         SET is_active = 1, updated_at = datetime('now')
         WHERE id = ?1 AND is_active = 0",
    )
    .bind(subscription_id)
    .execute(db)
    .await
    .map_err(storage("subscription", subscription_id))?;

    Ok(result.rows_affected() == 1)
}

pub async fn deactivate(db: &SqlitePool, subscription_id: i64) -> Result<(), LedgerError> {
    let result = sqlx::query(
        "UPDATE subscriptions
         SET is_active = 0, updated_at = datetime('now')
         WHERE id = ?1",
    )
    .bind(subscription_id)
    .execute(db)
    .await
    .map_err(storage("subscription", subscription_id))?;

    if result.rows_affected() == 0 {
        return Err(LedgerError::NotFound {
            entity: "subscription",
            id: subscription_id,
        });
    }
    Ok(())
}
