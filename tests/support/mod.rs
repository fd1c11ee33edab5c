#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use hashvest_backend::models::{Period, Role};
use hashvest_backend::notify::{LogNotifier, Notifier};
use hashvest_backend::AppState;

/// In-memory база на одном соединении: каждое `:memory:` соединение —
/// отдельная БД, поэтому пул принудительно из одного коннекта.
pub async fn init_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory db");
    sqlx::migrate!().run(&pool).await.expect("migrations");
    pool
}

pub fn build_state(pool: SqlitePool) -> AppState {
    AppState {
        db: pool,
        jwt_secret: "test-secret".to_string(),
        notifier: Arc::new(LogNotifier),
    }
}

/// Уведомитель, который всегда падает: сбой доставки не должен
/// влиять на переходы статусов.
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _email: &str, _subject: &str, _body: &str) -> Result<(), String> {
        Err("smtp down".to_string())
    }
}

/// Уведомитель, запоминающий адресата и тему письма.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, email: &str, subject: &str, _body: &str) -> Result<(), String> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), subject.to_string()));
        Ok(())
    }
}

pub async fn seed_miner(pool: &SqlitePool, email: &str, role: Role) -> i64 {
    let row = sqlx::query("INSERT INTO miners (email, role) VALUES (?1, ?2) RETURNING id")
        .bind(email)
        .bind(role.as_str())
        .fetch_one(pool)
        .await
        .expect("seed miner");
    row.get("id")
}

pub async fn seed_plan(
    pool: &SqlitePool,
    name: &str,
    period_return_percent: &str,
    period: Period,
    minimum_deposit: &str,
) -> i64 {
    let row = sqlx::query(
        "INSERT INTO rate_plans (name, period_return_percent, period, minimum_deposit)
         VALUES (?1, ?2, ?3, ?4) RETURNING id",
    )
    .bind(name)
    .bind(period_return_percent)
    .bind(period.as_str())
    .bind(minimum_deposit)
    .fetch_one(pool)
    .await
    .expect("seed plan");
    row.get("id")
}

pub async fn seed_subscription(
    pool: &SqlitePool,
    miner_id: i64,
    rate_plan_id: i64,
    amount_deposited: &str,
    earnings: &str,
    is_active: bool,
    auto_accrue: bool,
) -> i64 {
    let row = sqlx::query(
        "INSERT INTO subscriptions
             (miner_id, rate_plan_id, amount_deposited, earnings, is_active, auto_accrue)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
    )
    .bind(miner_id)
    .bind(rate_plan_id)
    .bind(amount_deposited)
    .bind(earnings)
    .bind(is_active)
    .bind(auto_accrue)
    .fetch_one(pool)
    .await
    .expect("seed subscription");
    row.get("id")
}

pub async fn seed_kyc_fee(pool: &SqlitePool, miner_id: i64, amount: &str) -> i64 {
    let row = sqlx::query("INSERT INTO kyc_fees (miner_id, amount) VALUES (?1, ?2) RETURNING id")
        .bind(miner_id)
        .bind(amount)
        .fetch_one(pool)
        .await
        .expect("seed kyc fee");
    row.get("id")
}
