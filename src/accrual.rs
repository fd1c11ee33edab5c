// src/accrual.rs
//
// Начисление доходности: чистый калькулятор + ежедневный батч.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use utoipa::ToSchema;

use crate::db::parse_decimal;
use crate::errors::{storage, LedgerError};
use crate::ledger;
use crate::models::{Period, Pool};

/// Длина периода в днях. Месяц считается за 30 дней, две недели за 14 —
/// фиксированное приближение из продуктовых требований, не календарное.
pub fn period_length_days(period: Period) -> u32 {
    match period {
        Period::Daily => 1,
        Period::Weekly => 7,
        Period::Fortnightly => 14,
        Period::Monthly => 30,
    }
}

/// Дневная ставка в процентах: ставка за период, размазанная по дням.
pub fn daily_rate(period_return_percent: Decimal, period: Period) -> Decimal {
    period_return_percent / Decimal::from(period_length_days(period))
}

/// Доход за `days` дней. Ноль при неположительном принципале или сроке,
/// отрицательным не бывает, от скрытого состояния не зависит.
pub fn earnings_for(
    principal: Decimal,
    period_return_percent: Decimal,
    period: Period,
    days: i64,
) -> Decimal {
    if principal <= Decimal::ZERO || days <= 0 {
        return Decimal::ZERO;
    }
    principal * (daily_rate(period_return_percent, period) / Decimal::ONE_HUNDRED)
        * Decimal::from(days)
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct AccrualReport {
    pub processed: u32,
    pub total: u32,
}

/// Один дневной проход по всем активным подпискам с auto_accrue.
/// Ошибка на одной подписке логируется и не прерывает остальных;
/// идемпотентности внутри суток нет — за "не чаще раза в день"
/// отвечает вызывающая сторона (cron или админ).
pub async fn run_daily_accrual(db: &SqlitePool) -> Result<AccrualReport, LedgerError> {
    let rows = sqlx::query(
        r#"SELECT s.id, s.amount_deposited, p.id AS plan_id, p.period_return_percent, p.period
           FROM subscriptions s
           JOIN rate_plans p ON p.id = s.rate_plan_id
           WHERE s.is_active = 1 AND s.auto_accrue = 1
           ORDER BY s.id"#,
    )
    .fetch_all(db)
    .await
    .map_err(storage("subscription", 0))?;

    let total = rows.len() as u32;
    let mut processed = 0u32;

    for row in &rows {
        let subscription_id: i64 = row.get("id");
        match accrue_one(db, row, subscription_id).await {
            Ok(()) => processed += 1,
            Err(e) => {
                log::error!("daily accrual failed for subscription {subscription_id}: {e}");
            }
        }
    }

    log::info!("daily accrual done: processed {processed} of {total}");
    Ok(AccrualReport { processed, total })
}

async fn accrue_one(
    db: &SqlitePool,
    row: &sqlx::sqlite::SqliteRow,
    subscription_id: i64,
) -> Result<(), LedgerError> {
    let principal_raw: String = row.get("amount_deposited");
    let principal = parse_decimal(&principal_raw, "subscription", subscription_id, "amount_deposited")?;

    // Колонки тарифа репортуются под id тарифа, не подписки.
    let plan_id: i64 = row.get("plan_id");
    let percent_raw: String = row.get("period_return_percent");
    let percent = parse_decimal(&percent_raw, "rate_plan", plan_id, "period_return_percent")?;

    let period_raw: String = row.get("period");
    let period = Period::parse(&period_raw).ok_or_else(|| LedgerError::Storage {
        entity: "rate_plan",
        id: plan_id,
        detail: format!("unknown period '{period_raw}'"),
    })?;

    let delta = earnings_for(principal, percent, period, 1);
    if delta <= Decimal::ZERO {
        // Пустая подписка: начислять нечего, но строка обработана.
        return Ok(());
    }

    ledger::credit(db, subscription_id, Pool::Earnings, delta).await?;
    Ok(())
}
