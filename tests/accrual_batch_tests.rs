mod support;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use hashvest_backend::accrual;
use hashvest_backend::ledger;
use hashvest_backend::models::{Period, Role};

use support::{init_test_db, seed_miner, seed_plan, seed_subscription};

#[actix_web::test]
async fn one_tick_credits_one_day_of_earnings() {
    let db = init_test_db().await;
    let miner = seed_miner(&db, "m@test", Role::Miner).await;
    // 7% в неделю = 1% в день.
    let plan = seed_plan(&db, "weekly-7", "7", Period::Weekly, "0").await;
    let sub_id = seed_subscription(&db, miner, plan, "1000", "0", true, true).await;

    let report = accrual::run_daily_accrual(&db).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.total, 1);

    let sub = ledger::get_subscription(&db, sub_id).await.unwrap();
    assert_eq!(sub.earnings, dec!(10));
    assert_eq!(sub.amount_deposited, dec!(1000), "principal is untouched by accrual");
}

#[actix_web::test]
async fn sweep_skips_inactive_and_opted_out_subscriptions() {
    let db = init_test_db().await;
    let miner = seed_miner(&db, "m@test", Role::Miner).await;
    let plan = seed_plan(&db, "weekly-7", "7", Period::Weekly, "0").await;

    let eligible = seed_subscription(&db, miner, plan, "1000", "0", true, true).await;
    let inactive = seed_subscription(&db, miner, plan, "1000", "0", false, true).await;
    let opted_out = seed_subscription(&db, miner, plan, "1000", "0", true, false).await;

    let report = accrual::run_daily_accrual(&db).await.unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.processed, 1);

    assert_eq!(ledger::get_subscription(&db, eligible).await.unwrap().earnings, dec!(10));
    assert_eq!(ledger::get_subscription(&db, inactive).await.unwrap().earnings, Decimal::ZERO);
    assert_eq!(ledger::get_subscription(&db, opted_out).await.unwrap().earnings, Decimal::ZERO);
}

#[actix_web::test]
async fn one_bad_row_does_not_abort_the_sweep() {
    let db = init_test_db().await;
    let miner = seed_miner(&db, "m@test", Role::Miner).await;
    let plan = seed_plan(&db, "weekly-7", "7", Period::Weekly, "0").await;

    let first = seed_subscription(&db, miner, plan, "1000", "0", true, true).await;
    let second = seed_subscription(&db, miner, plan, "1000", "0", true, true).await;
    let third = seed_subscription(&db, miner, plan, "1000", "0", true, true).await;

    // Битая строка посередине: начисление по ней падает, остальные идут.
    sqlx::query("UPDATE subscriptions SET amount_deposited = 'garbage' WHERE id = ?1")
        .bind(second)
        .execute(&db)
        .await
        .unwrap();

    let report = accrual::run_daily_accrual(&db).await.unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.processed, 2);

    assert_eq!(ledger::get_subscription(&db, first).await.unwrap().earnings, dec!(10));
    assert_eq!(ledger::get_subscription(&db, third).await.unwrap().earnings, dec!(10));
}

#[actix_web::test]
async fn corrupt_plan_fails_only_its_own_subscriptions() {
    let db = init_test_db().await;
    let miner = seed_miner(&db, "m@test", Role::Miner).await;
    let good = seed_plan(&db, "weekly-7", "7", Period::Weekly, "0").await;
    let bad = seed_plan(&db, "weekly-x", "7", Period::Weekly, "0").await;
    let healthy = seed_subscription(&db, miner, good, "1000", "0", true, true).await;
    let stuck = seed_subscription(&db, miner, bad, "1000", "0", true, true).await;

    sqlx::query("UPDATE rate_plans SET period_return_percent = 'junk' WHERE id = ?1")
        .bind(bad)
        .execute(&db)
        .await
        .unwrap();

    let report = accrual::run_daily_accrual(&db).await.unwrap();
    assert_eq!(report.total, 2);
    assert_eq!(report.processed, 1);

    assert_eq!(ledger::get_subscription(&db, healthy).await.unwrap().earnings, dec!(10));
    assert_eq!(ledger::get_subscription(&db, stuck).await.unwrap().earnings, Decimal::ZERO);
}

#[actix_web::test]
async fn zero_principal_subscription_counts_as_processed() {
    let db = init_test_db().await;
    let miner = seed_miner(&db, "m@test", Role::Miner).await;
    let plan = seed_plan(&db, "weekly-7", "7", Period::Weekly, "0").await;
    let sub_id = seed_subscription(&db, miner, plan, "0", "0", true, true).await;

    let report = accrual::run_daily_accrual(&db).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.total, 1);
    assert_eq!(ledger::get_subscription(&db, sub_id).await.unwrap().earnings, Decimal::ZERO);
}

#[actix_web::test]
async fn running_twice_doubles_a_day_of_earnings() {
    // Батч сознательно не идемпотентен внутри суток: за "не чаще раза
    // в день" отвечает планировщик.
    let db = init_test_db().await;
    let miner = seed_miner(&db, "m@test", Role::Miner).await;
    let plan = seed_plan(&db, "weekly-7", "7", Period::Weekly, "0").await;
    let sub_id = seed_subscription(&db, miner, plan, "1000", "0", true, true).await;

    accrual::run_daily_accrual(&db).await.unwrap();
    accrual::run_daily_accrual(&db).await.unwrap();

    assert_eq!(ledger::get_subscription(&db, sub_id).await.unwrap().earnings, dec!(20));
}

#[actix_web::test]
async fn empty_sweep_reports_zero_of_zero() {
    let db = init_test_db().await;
    let report = accrual::run_daily_accrual(&db).await.unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(report.total, 0);
}
