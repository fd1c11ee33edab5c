// src/models.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Длина периода тарифа. Месяц и "две недели" — фиксированные
/// приближения (30/14 дней), без привязки к календарю.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Fortnightly,
    Monthly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Fortnightly => "fortnightly",
            Period::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Period> {
        match s {
            "daily" => Some(Period::Daily),
            "weekly" => Some(Period::Weekly),
            "fortnightly" => Some(Period::Fortnightly),
            "monthly" => Some(Period::Monthly),
            _ => None,
        }
    }
}

/// Один из двух балансов подписки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Pool {
    Deposit,
    Earnings,
}

impl Pool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pool::Deposit => "deposit",
            Pool::Earnings => "earnings",
        }
    }

    pub fn parse(s: &str) -> Option<Pool> {
        match s {
            "deposit" => Some(Pool::Deposit),
            "earnings" => Some(Pool::Earnings),
            _ => None,
        }
    }
}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Initialized,
    Pending,
    Successful,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Initialized => "initialized",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Successful => "successful",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<TransactionStatus> {
        match s {
            "initialized" => Some(TransactionStatus::Initialized),
            "pending" => Some(TransactionStatus::Pending),
            "successful" => Some(TransactionStatus::Successful),
            "failed" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Successful | TransactionStatus::Failed)
    }
}

/// Платёж ссылается либо на подписку, либо на KYC-сбор. Тег хранится в
/// колонке `entity`, id — в `entity_id`; в коде это tagged enum, чтобы
/// диспетчеризация побочных эффектов была исчерпывающей.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "entity", content = "entity_id", rename_all = "lowercase")]
pub enum TransactionEntity {
    Subscription(i64),
    Kyc(i64),
}

impl TransactionEntity {
    pub fn tag(&self) -> &'static str {
        match self {
            TransactionEntity::Subscription(_) => "subscription",
            TransactionEntity::Kyc(_) => "kyc",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            TransactionEntity::Subscription(id) | TransactionEntity::Kyc(id) => *id,
        }
    }

    pub fn parse(tag: &str, id: i64) -> Option<TransactionEntity> {
        match tag {
            "subscription" => Some(TransactionEntity::Subscription(id)),
            "kyc" => Some(TransactionEntity::Kyc(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Processing,
    Completed,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
            WithdrawalStatus::Processing => "processing",
            WithdrawalStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<WithdrawalStatus> {
        match s {
            "pending" => Some(WithdrawalStatus::Pending),
            "approved" => Some(WithdrawalStatus::Approved),
            "rejected" => Some(WithdrawalStatus::Rejected),
            "processing" => Some(WithdrawalStatus::Processing),
            "completed" => Some(WithdrawalStatus::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WithdrawalStatus::Rejected | WithdrawalStatus::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Miner,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Miner => "miner",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "miner" => Some(Role::Miner),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Miner {
    pub id: i64,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

/// Майнинг-контракт: процент доходности за период.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RatePlan {
    pub id: i64,
    pub name: String,
    pub period_return_percent: Decimal,
    pub period: Period,
    pub minimum_deposit: Decimal,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Позиция майнера по тарифу: два независимых баланса.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Subscription {
    pub id: i64,
    pub miner_id: i64,
    pub rate_plan_id: i64,
    pub amount_deposited: Decimal,
    pub earnings: Decimal,
    pub is_active: bool,
    pub auto_accrue: bool,
    pub currency: String,
    pub symbol: String,
    #[serde(skip)]
    pub version: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn balance(&self, pool: Pool) -> Decimal {
        match pool {
            Pool::Deposit => self.amount_deposited,
            Pool::Earnings => self.earnings,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Transaction {
    pub id: i64,
    pub miner_id: i64,
    #[serde(flatten)]
    pub entity: TransactionEntity,
    pub amount_usd: Decimal,
    pub status: TransactionStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Withdrawal {
    pub id: i64,
    pub miner_id: i64,
    pub subscription_id: i64,
    #[serde(rename = "type")]
    pub pool: Pool,
    pub amount: Decimal,
    pub status: WithdrawalStatus,
    pub rejection_reason: Option<String>,
    pub processed_by: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct KycFee {
    pub id: i64,
    pub miner_id: i64,
    pub amount: Decimal,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}
