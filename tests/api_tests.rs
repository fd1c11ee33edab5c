mod support;

use actix_web::{test, web, App};
use rust_decimal_macros::dec;
use serde_json::json;

use hashvest_backend::api;
use hashvest_backend::api::auth::issue_token;
use hashvest_backend::ledger;
use hashvest_backend::models::{Period, Role};

use support::{build_state, init_test_db, seed_miner, seed_plan, seed_subscription};

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .service(
                    web::scope("/api")
                        .wrap(api::auth::JwtMiddleware)
                        .service(api::plans::list_plans)
                        .service(api::subscriptions::create_subscription)
                        .service(api::subscriptions::list_subscriptions)
                        .service(api::payments::create_payment)
                        .service(api::payments::list_transactions)
                        .service(api::withdrawals::create_withdrawal)
                        .service(api::withdrawals::cancel_withdrawal)
                        .service(api::withdrawals::list_withdrawals)
                        .service(api::admin::create_plan)
                        .service(api::admin::update_plan)
                        .service(api::admin::credit_subscription)
                        .service(api::admin::deactivate_subscription)
                        .service(api::admin::update_transaction_status)
                        .service(api::admin::update_withdrawal_status)
                        .service(api::admin::run_accrual),
                )
                .service(api::webhooks::payment_webhook),
        )
        .await
    };
}

fn bearer(state: &hashvest_backend::AppState, miner_id: i64, role: Role) -> (&'static str, String) {
    let token = issue_token(&state.jwt_secret, miner_id, role).expect("issue token");
    ("Authorization", format!("Bearer {token}"))
}

#[actix_web::test]
async fn api_requires_a_token() {
    let db = init_test_db().await;
    let state = build_state(db);
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/api/plans").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn deposit_payment_flow_activates_subscription_via_webhook() {
    let db = init_test_db().await;
    let miner = seed_miner(&db, "m@test", Role::Miner).await;
    let plan = seed_plan(&db, "weekly-7", "7", Period::Weekly, "0").await;
    let state = build_state(db.clone());
    let app = test_app!(state);

    // Майнер выбирает тариф.
    let req = test::TestRequest::post()
        .uri("/api/subscriptions")
        .insert_header(bearer(&state, miner, Role::Miner))
        .set_json(json!({"rate_plan_id": plan}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let sub_id = body["id"].as_i64().expect("subscription id");
    assert_eq!(body["is_active"], json!(false));

    // Инициирует оплату депозита.
    let req = test::TestRequest::post()
        .uri("/api/payments")
        .insert_header(bearer(&state, miner, Role::Miner))
        .set_json(json!({"entity": "subscription", "entity_id": sub_id, "amount_usd": "200"}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let tx_id = body["transaction_id"].as_i64().expect("transaction id");
    assert_eq!(body["status"], json!("initialized"));

    // Провайдер подтверждает оплату.
    let req = test::TestRequest::post()
        .uri("/webhook/payment")
        .set_json(json!({"reference": tx_id.to_string(), "status": "succeeded"}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["ok"], json!(true));

    let sub = ledger::get_subscription(&db, sub_id).await.unwrap();
    assert!(sub.is_active);
    assert_eq!(sub.amount_deposited, dec!(200));

    // Повторный вебхук идемпотентен.
    let req = test::TestRequest::post()
        .uri("/webhook/payment")
        .set_json(json!({"reference": tx_id.to_string(), "status": "succeeded"}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["idempotent"], json!(true));
    let sub = ledger::get_subscription(&db, sub_id).await.unwrap();
    assert_eq!(sub.amount_deposited, dec!(200));
}

#[actix_web::test]
async fn withdrawal_over_balance_returns_422() {
    let db = init_test_db().await;
    let miner = seed_miner(&db, "m@test", Role::Miner).await;
    let plan = seed_plan(&db, "weekly-7", "7", Period::Weekly, "0").await;
    let sub_id = seed_subscription(&db, miner, plan, "500", "50", true, true).await;
    let state = build_state(db);
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/withdrawals")
        .insert_header(bearer(&state, miner, Role::Miner))
        .set_json(json!({"subscription_id": sub_id, "type": "earnings", "amount": "80"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("earnings"), "error should name the pool: {message}");
}

#[actix_web::test]
async fn admin_edits_and_deactivates_a_plan() {
    let db = init_test_db().await;
    let admin = seed_miner(&db, "a@test", Role::Admin).await;
    let plan = seed_plan(&db, "weekly-7", "7", Period::Weekly, "0").await;
    let state = build_state(db);
    let app = test_app!(state);

    // Непосланные поля не трогаются.
    let req = test::TestRequest::post()
        .uri(&format!("/api/admin/plans/{plan}"))
        .insert_header(bearer(&state, admin, Role::Admin))
        .set_json(json!({"period_return_percent": "14", "minimum_deposit": "100"}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["period_return_percent"], json!("14"));
    assert_eq!(body["minimum_deposit"], json!("100"));
    assert_eq!(body["name"], json!("weekly-7"));
    assert_eq!(body["is_active"], json!(true));

    // Нулевая ставка не проходит валидацию.
    let req = test::TestRequest::post()
        .uri(&format!("/api/admin/plans/{plan}"))
        .insert_header(bearer(&state, admin, Role::Admin))
        .set_json(json!({"period_return_percent": "0"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // Деактивация убирает тариф из витрины.
    let req = test::TestRequest::post()
        .uri(&format!("/api/admin/plans/{plan}"))
        .insert_header(bearer(&state, admin, Role::Admin))
        .set_json(json!({"is_active": false}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["is_active"], json!(false));

    let req = test::TestRequest::get()
        .uri("/api/plans")
        .insert_header(bearer(&state, admin, Role::Admin))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!([]));

    // Несуществующий тариф — 404.
    let req = test::TestRequest::post()
        .uri("/api/admin/plans/777")
        .insert_header(bearer(&state, admin, Role::Admin))
        .set_json(json!({"minimum_deposit": "1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn admin_routes_reject_plain_miners() {
    let db = init_test_db().await;
    let miner = seed_miner(&db, "m@test", Role::Miner).await;
    let state = build_state(db);
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/admin/accrual/run")
        .insert_header(bearer(&state, miner, Role::Miner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn admin_runs_accrual_and_gets_a_report() {
    let db = init_test_db().await;
    let miner = seed_miner(&db, "m@test", Role::Miner).await;
    let admin = seed_miner(&db, "a@test", Role::Admin).await;
    let plan = seed_plan(&db, "weekly-7", "7", Period::Weekly, "0").await;
    seed_subscription(&db, miner, plan, "1000", "0", true, true).await;
    let state = build_state(db);
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/admin/accrual/run")
        .insert_header(bearer(&state, admin, Role::Admin))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"processed": 1, "total": 1}));
}

#[actix_web::test]
async fn miner_cancels_pending_withdrawal_over_http() {
    let db = init_test_db().await;
    let miner = seed_miner(&db, "m@test", Role::Miner).await;
    let plan = seed_plan(&db, "weekly-7", "7", Period::Weekly, "0").await;
    let sub_id = seed_subscription(&db, miner, plan, "500", "0", true, true).await;
    let state = build_state(db);
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/withdrawals")
        .insert_header(bearer(&state, miner, Role::Miner))
        .set_json(json!({"subscription_id": sub_id, "type": "deposit", "amount": "100"}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let wd_id = body["id"].as_i64().expect("withdrawal id");
    assert_eq!(body["status"], json!("pending"));

    let req = test::TestRequest::post()
        .uri(&format!("/api/withdrawals/{wd_id}/cancel"))
        .insert_header(bearer(&state, miner, Role::Miner))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], json!("rejected"));
    assert_eq!(body["rejection_reason"], json!("Cancelled by user"));
}
