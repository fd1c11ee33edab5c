// src/withdrawals.rs
//
// Заявки на вывод: pending -> {approved, rejected},
// approved -> processing -> completed, approved -> completed напрямую.
// Баланс перепроверяется по живой подписке на каждом переходе, который
// его касается: между заявкой и одобрением деньги могли уйти другой
// заявкой. Списание происходит только на completed.

use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::db::map_withdrawal;
use crate::errors::{storage, LedgerError};
use crate::ledger;
use crate::models::{Pool, Withdrawal, WithdrawalStatus};
use crate::notify::{send_best_effort, Notifier};

pub const CANCELLED_BY_USER: &str = "Cancelled by user";

pub async fn get_withdrawal(pool: &SqlitePool, id: i64) -> Result<Withdrawal, LedgerError> {
    let row = sqlx::query("SELECT * FROM withdrawals WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(storage("withdrawal", id))?;
    let row = row.ok_or(LedgerError::NotFound { entity: "withdrawal", id })?;
    map_withdrawal(&row)
}

/// Заявка майнера. Сумма валидируется против текущего баланса нужного
/// пула; чужая подписка для майнера неотличима от несуществующей.
pub async fn request(
    db: &SqlitePool,
    miner_id: i64,
    subscription_id: i64,
    pool: Pool,
    amount: Decimal,
) -> Result<Withdrawal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "withdrawal amount must be positive, got {amount}"
        )));
    }

    let sub = ledger::get_subscription(db, subscription_id).await?;
    if sub.miner_id != miner_id {
        return Err(LedgerError::NotFound {
            entity: "subscription",
            id: subscription_id,
        });
    }

    let available = sub.balance(pool);
    if amount > available {
        return Err(LedgerError::InsufficientBalance {
            pool,
            requested: amount,
            available,
        });
    }

    let row = sqlx::query(
        r#"INSERT INTO withdrawals (miner_id, subscription_id, type, amount, status)
           VALUES (?1, ?2, ?3, ?4, 'pending')
           RETURNING *"#,
    )
    .bind(miner_id)
    .bind(subscription_id)
    .bind(pool.as_str())
    .bind(amount.to_string())
    .fetch_one(db)
    .await
    .map_err(storage("withdrawal", 0))?;

    map_withdrawal(&row)
}

/// Отмена майнером: только из pending, баланс не трогается
/// (списания ещё не было).
pub async fn cancel(
    db: &SqlitePool,
    miner_id: i64,
    withdrawal_id: i64,
) -> Result<Withdrawal, LedgerError> {
    let wd = get_withdrawal(db, withdrawal_id).await?;
    if wd.miner_id != miner_id {
        return Err(LedgerError::NotFound { entity: "withdrawal", id: withdrawal_id });
    }
    if wd.status != WithdrawalStatus::Pending {
        return Err(LedgerError::InvalidTransition {
            entity: "withdrawal",
            id: withdrawal_id,
            from: wd.status.as_str(),
            to: WithdrawalStatus::Rejected.as_str(),
        });
    }

    let result = sqlx::query(
        "UPDATE withdrawals
         SET status = 'rejected', rejection_reason = ?1, updated_at = datetime('now')
         WHERE id = ?2 AND status = 'pending'",
    )
    .bind(CANCELLED_BY_USER)
    .bind(withdrawal_id)
    .execute(db)
    .await
    .map_err(storage("withdrawal", withdrawal_id))?;

    if result.rows_affected() == 0 {
        let current = get_withdrawal(db, withdrawal_id).await?;
        return Err(LedgerError::InvalidTransition {
            entity: "withdrawal",
            id: withdrawal_id,
            from: current.status.as_str(),
            to: WithdrawalStatus::Rejected.as_str(),
        });
    }

    get_withdrawal(db, withdrawal_id).await
}

fn transition_allowed(from: WithdrawalStatus, to: WithdrawalStatus) -> bool {
    use WithdrawalStatus::*;
    if from.is_terminal() {
        return false;
    }
    matches!(
        (from, to),
        (Pending, Approved)
            | (Pending, Rejected)
            | (Approved, Processing)
            | (Approved, Completed)
            | (Processing, Completed)
    )
}

/// Административный переход статуса. На approved сумма перепроверяется
/// против живого баланса (при нехватке заявка остаётся pending);
/// completed — единственная точка, где деньги покидают пул.
pub async fn update_status(
    db: &SqlitePool,
    notifier: &dyn Notifier,
    withdrawal_id: i64,
    new_status: WithdrawalStatus,
    rejection_reason: Option<String>,
    admin_id: i64,
) -> Result<Withdrawal, LedgerError> {
    let wd = get_withdrawal(db, withdrawal_id).await?;

    if !transition_allowed(wd.status, new_status) {
        return Err(LedgerError::InvalidTransition {
            entity: "withdrawal",
            id: withdrawal_id,
            from: wd.status.as_str(),
            to: new_status.as_str(),
        });
    }

    if new_status == WithdrawalStatus::Approved {
        let sub = ledger::get_subscription(db, wd.subscription_id).await?;
        let available = sub.balance(wd.pool);
        if wd.amount > available {
            return Err(LedgerError::InsufficientBalance {
                pool: wd.pool,
                requested: wd.amount,
                available,
            });
        }
    }

    if new_status == WithdrawalStatus::Completed {
        // Сначала списание (оно атомарно проверяет баланс), потом статус.
        ledger::debit(db, wd.subscription_id, wd.pool, wd.amount).await?;
    }

    let reason = match new_status {
        WithdrawalStatus::Rejected => {
            Some(rejection_reason.unwrap_or_else(|| "Rejected by administrator".to_string()))
        }
        _ => None,
    };

    let result = sqlx::query(
        "UPDATE withdrawals
         SET status = ?1, rejection_reason = ?2, processed_by = ?3, updated_at = datetime('now')
         WHERE id = ?4 AND status = ?5",
    )
    .bind(new_status.as_str())
    .bind(&reason)
    .bind(admin_id)
    .bind(withdrawal_id)
    .bind(wd.status.as_str())
    .execute(db)
    .await
    .map_err(storage("withdrawal", withdrawal_id))?;

    if result.rows_affected() == 0 {
        // Статус увели из-под нас. Если деньги уже списаны — вернуть.
        if new_status == WithdrawalStatus::Completed {
            if let Err(e) = ledger::credit(db, wd.subscription_id, wd.pool, wd.amount).await {
                log::error!(
                    "withdrawal {withdrawal_id}: failed to refund contested debit of {}: {e}",
                    wd.amount
                );
            }
        }
        let current = get_withdrawal(db, withdrawal_id).await?;
        return Err(LedgerError::InvalidTransition {
            entity: "withdrawal",
            id: withdrawal_id,
            from: current.status.as_str(),
            to: new_status.as_str(),
        });
    }

    let updated = get_withdrawal(db, withdrawal_id).await?;

    match new_status {
        WithdrawalStatus::Completed => {
            send_best_effort(
                db,
                notifier,
                updated.miner_id,
                "Withdrawal completed",
                &format!(
                    "Your {} withdrawal of {} was paid out.",
                    updated.pool, updated.amount
                ),
            )
            .await;
        }
        WithdrawalStatus::Rejected => {
            send_best_effort(
                db,
                notifier,
                updated.miner_id,
                "Withdrawal rejected",
                updated
                    .rejection_reason
                    .as_deref()
                    .unwrap_or("Your withdrawal request was rejected."),
            )
            .await;
        }
        _ => {}
    }

    Ok(updated)
}
