use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::plans::list_plans,
        crate::api::payments::create_payment,
        crate::api::webhooks::payment_webhook,
        crate::api::withdrawals::create_withdrawal,
        crate::api::admin::run_accrual
    ),
    components(
        schemas(
            crate::models::Period,
            crate::models::Pool,
            crate::models::TransactionStatus,
            crate::models::WithdrawalStatus,
            crate::models::RatePlan,
            crate::models::Subscription,
            crate::models::Withdrawal,
            crate::accrual::AccrualReport,
            crate::api::subscriptions::CreateSubscriptionRequest,
            crate::api::payments::CreatePaymentRequest,
            crate::api::withdrawals::CreateWithdrawalRequest,
            crate::api::webhooks::PaymentWebhook,
            crate::api::admin::CreatePlanRequest,
            crate::api::admin::UpdatePlanRequest,
            crate::api::admin::ManualCreditRequest,
            crate::api::admin::UpdateTransactionStatusRequest,
            crate::api::admin::UpdateWithdrawalStatusRequest
        )
    ),
    tags(
        (name = "plans", description = "Mining contract catalog"),
        (name = "payments", description = "Deposit and KYC fee payments"),
        (name = "withdrawals", description = "Withdrawal requests"),
        (name = "admin", description = "Administrative actions"),
        (name = "webhooks", description = "Payment provider callbacks")
    )
)]
pub struct ApiDoc;
