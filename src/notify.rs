// src/notify.rs
//
// Доставка писем живёт в отдельном сервисе; отсюда уходит только
// best-effort вызов. Адрес берётся из таблицы майнеров; ни сбой
// поиска, ни сбой доставки не валят переход статуса.

use sqlx::SqlitePool;

use crate::db;

pub trait Notifier: Send + Sync {
    fn notify(&self, email: &str, subject: &str, body: &str) -> Result<(), String>;
}

/// Дефолт для прод-конфигурации без внешнего сервиса и для тестов.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, email: &str, subject: &str, body: &str) -> Result<(), String> {
        log::info!("notify {email}: {subject} - {body}");
        Ok(())
    }
}

pub async fn send_best_effort(
    db: &SqlitePool,
    notifier: &dyn Notifier,
    miner_id: i64,
    subject: &str,
    body: &str,
) {
    let miner = match db::get_miner(db, miner_id).await {
        Ok(m) => m,
        Err(e) => {
            log::warn!("notification to miner {miner_id} skipped, lookup failed: {e}");
            return;
        }
    };
    if let Err(e) = notifier.notify(&miner.email, subject, body) {
        log::warn!("notification to {} failed: {e}", miner.email);
    }
}
