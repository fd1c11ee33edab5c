// src/main.rs
use std::env;
use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use utoipa::OpenApi;

use hashvest_backend::notify::LogNotifier;
use hashvest_backend::{api, docs, AppState};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Service ready!")
}

async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(docs::ApiDoc::openapi())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let database_url = env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://hashvest.db?mode=rwc".to_string());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

    let state = web::Data::new(AppState {
        db: pool,
        jwt_secret,
        notifier: Arc::new(LogNotifier),
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(index))
            .route("/api-docs/openapi.json", web::get().to(openapi_json))
            // Защищённые роуты
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
            // Вебхуки (публичные)
            .service(api::webhooks::payment_webhook)
    })
    .bind(("0.0.0.0", 8070))?
    .run()
    .await
}
