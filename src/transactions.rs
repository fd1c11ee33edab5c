// src/transactions.rs
//
// Жизненный цикл платежа: initialized -> pending -> successful | failed.
// Побочные эффекты (зачисление депозита, отметка KYC-сбора) срабатывают
// ровно один раз — на переходе в successful; повторная доставка того же
// статуса идемпотентна.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::db::{self, map_transaction};
use crate::errors::{storage, LedgerError};
use crate::ledger;
use crate::models::{Pool, Transaction, TransactionEntity, TransactionStatus};
use crate::notify::{send_best_effort, Notifier};

pub async fn get_transaction(pool: &SqlitePool, id: i64) -> Result<Transaction, LedgerError> {
    let row = sqlx::query("SELECT * FROM transactions WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(storage("transaction", id))?;
    let row = row.ok_or(LedgerError::NotFound { entity: "transaction", id })?;
    map_transaction(&row)
}

/// Майнер инициирует оплату: создаётся запись в статусе initialized.
/// Сумма проверяется здесь же против минимального депозита тарифа
/// (для подписок) и против уже оплаченного сбора (для KYC).
pub async fn initiate(
    db: &SqlitePool,
    miner_id: i64,
    entity: TransactionEntity,
    amount_usd: Decimal,
) -> Result<Transaction, LedgerError> {
    if amount_usd <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "payment amount must be positive, got {amount_usd}"
        )));
    }

    match entity {
        TransactionEntity::Subscription(subscription_id) => {
            let sub = ledger::get_subscription(db, subscription_id).await?;
            if sub.miner_id != miner_id {
                return Err(LedgerError::NotFound {
                    entity: "subscription",
                    id: subscription_id,
                });
            }
            let plan = db::get_rate_plan(db, sub.rate_plan_id).await?;
            if amount_usd < plan.minimum_deposit {
                return Err(LedgerError::validation(format!(
                    "deposit {amount_usd} is below the plan minimum {}",
                    plan.minimum_deposit
                )));
            }
        }
        TransactionEntity::Kyc(fee_id) => {
            let fee = db::get_kyc_fee(db, fee_id).await?;
            if fee.miner_id != miner_id {
                return Err(LedgerError::NotFound { entity: "kyc_fee", id: fee_id });
            }
            if fee.is_paid {
                return Err(LedgerError::Conflict(format!(
                    "kyc fee {fee_id} is already paid"
                )));
            }
        }
    }

    let row = sqlx::query(
        r#"INSERT INTO transactions (miner_id, entity, entity_id, amount_usd, status)
           VALUES (?1, ?2, ?3, ?4, 'initialized')
           RETURNING *"#,
    )
    .bind(miner_id)
    .bind(entity.tag())
    .bind(entity.id())
    .bind(amount_usd.to_string())
    .fetch_one(db)
    .await
    .map_err(storage("transaction", 0))?;

    map_transaction(&row)
}

fn transition_allowed(from: TransactionStatus, to: TransactionStatus) -> bool {
    use TransactionStatus::*;
    if from.is_terminal() {
        return false;
    }
    matches!(
        (from, to),
        (Initialized, Pending)
            | (Initialized, Successful)
            | (Initialized, Failed)
            | (Pending, Successful)
            | (Pending, Failed)
    )
}

/// Итог перехода: нужен вебхуку, чтобы отличать повторную доставку.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub transaction: Transaction,
    pub idempotent: bool,
}

/// Переводит платёж в новый статус. Повтор текущего статуса — no-op
/// (idempotent = true), откат из терминального состояния запрещён.
pub async fn update_status(
    db: &SqlitePool,
    notifier: &dyn Notifier,
    transaction_id: i64,
    new_status: TransactionStatus,
) -> Result<TransitionOutcome, LedgerError> {
    let tx = get_transaction(db, transaction_id).await?;

    if tx.status == new_status {
        return Ok(TransitionOutcome { transaction: tx, idempotent: true });
    }

    if !transition_allowed(tx.status, new_status) {
        return Err(LedgerError::InvalidTransition {
            entity: "transaction",
            id: transaction_id,
            from: tx.status.as_str(),
            to: new_status.as_str(),
        });
    }

    // Статус меняется условным UPDATE: если соседний запрос успел первым,
    // перечитываем и отвечаем идемпотентно вместо двойного зачисления.
    let paid_at = if new_status == TransactionStatus::Successful {
        Some(Utc::now())
    } else {
        None
    };

    let result = sqlx::query(
        "UPDATE transactions
         SET status = ?1, paid_at = COALESCE(?2, paid_at)
         WHERE id = ?3 AND status = ?4",
    )
    .bind(new_status.as_str())
    .bind(paid_at)
    .bind(transaction_id)
    .bind(tx.status.as_str())
    .execute(db)
    .await
    .map_err(storage("transaction", transaction_id))?;

    if result.rows_affected() == 0 {
        let current = get_transaction(db, transaction_id).await?;
        if current.status == new_status {
            return Ok(TransitionOutcome { transaction: current, idempotent: true });
        }
        return Err(LedgerError::InvalidTransition {
            entity: "transaction",
            id: transaction_id,
            from: current.status.as_str(),
            to: new_status.as_str(),
        });
    }

    if new_status == TransactionStatus::Successful {
        apply_success_side_effects(db, &tx).await;
        send_best_effort(
            db,
            notifier,
            tx.miner_id,
            "Payment confirmed",
            &format!("Your payment of {} USD was confirmed.", tx.amount_usd),
        )
        .await;
    }

    let transaction = get_transaction(db, transaction_id).await?;
    Ok(TransitionOutcome { transaction, idempotent: false })
}

/// Платёж уже подтверждён провайдером, поэтому пропавшая цель побочного
/// эффекта — операционный алерт в лог, а не откат подтверждения.
async fn apply_success_side_effects(db: &SqlitePool, tx: &Transaction) {
    match tx.entity {
        TransactionEntity::Subscription(subscription_id) => {
            match ledger::credit(db, subscription_id, Pool::Deposit, tx.amount_usd).await {
                Ok(_) => match ledger::activate(db, subscription_id).await {
                    Ok(true) => {
                        log::info!(
                            "subscription {subscription_id} activated by transaction {}",
                            tx.id
                        );
                    }
                    Ok(false) => {}
                    Err(e) => {
                        log::error!(
                            "transaction {}: activation of subscription {subscription_id} failed: {e}",
                            tx.id
                        );
                    }
                },
                Err(e) => {
                    log::error!(
                        "transaction {}: deposit credit to subscription {subscription_id} skipped: {e}",
                        tx.id
                    );
                }
            }
        }
        TransactionEntity::Kyc(fee_id) => {
            let result = sqlx::query(
                "UPDATE kyc_fees SET is_paid = 1, paid_at = ?1 WHERE id = ?2 AND is_paid = 0",
            )
            .bind(Utc::now())
            .bind(fee_id)
            .execute(db)
            .await;

            match result {
                Ok(r) if r.rows_affected() == 0 => {
                    log::error!(
                        "transaction {}: kyc fee {fee_id} missing or already paid, marking skipped",
                        tx.id
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("transaction {}: kyc fee {fee_id} update failed: {e}", tx.id);
                }
            }
        }
    }
}
