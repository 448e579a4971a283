use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

/// key: billing-models -> plans,intents,subscriptions
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PlanType {
    Monthly,
    Yearly,
    Permanent,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Monthly => "monthly",
            PlanType::Yearly => "yearly",
            PlanType::Permanent => "permanent",
        }
    }

    pub fn catalog_entry(&self) -> &'static PlanCatalogEntry {
        match self {
            PlanType::Monthly => &PLAN_CATALOG[0],
            PlanType::Yearly => &PLAN_CATALOG[1],
            PlanType::Permanent => &PLAN_CATALOG[2],
        }
    }

    /// End of the paid period that starts at `from`. `None` never expires.
    pub fn renewal_date(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.catalog_entry()
            .renewal_days
            .map(|days| from + Duration::days(days))
    }
}

impl FromStr for PlanType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "monthly" => Ok(PlanType::Monthly),
            "yearly" => Ok(PlanType::Yearly),
            "permanent" => Ok(PlanType::Permanent),
            _ => Err(AppError::InvalidPlan(value.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Free,
    Premium,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Free => "free",
            Role::Premium => "premium",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
}

/// key: billing-catalog-entry -> fixed price list
#[derive(Debug, Clone, Serialize)]
pub struct PlanCatalogEntry {
    pub plan_type: PlanType,
    pub name: &'static str,
    pub amount_cents: i64,
    pub currency: &'static str,
    pub renewal_days: Option<i64>,
}

impl PlanCatalogEntry {
    pub fn amount(&self) -> f64 {
        cents_to_amount(self.amount_cents)
    }
}

pub const PLAN_CATALOG: [PlanCatalogEntry; 3] = [
    PlanCatalogEntry {
        plan_type: PlanType::Monthly,
        name: "Monthly Premium",
        amount_cents: 199,
        currency: "EUR",
        renewal_days: Some(30),
    },
    PlanCatalogEntry {
        plan_type: PlanType::Yearly,
        name: "Yearly Premium",
        amount_cents: 799,
        currency: "EUR",
        renewal_days: Some(365),
    },
    PlanCatalogEntry {
        plan_type: PlanType::Permanent,
        name: "Permanent Premium",
        amount_cents: 1499,
        currency: "EUR",
        renewal_days: None,
    },
];

pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// key: billing-payment-intent -> off-band payment request
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_type: PlanType,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl PaymentIntent {
    pub fn amount(&self) -> f64 {
        cents_to_amount(self.amount_cents)
    }
}

/// key: billing-subscription-model -> one row per user
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_type: PlanType,
    pub status: SubscriptionStatus,
    pub renewal_date: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// True once the paid period has ended. Permanent plans never lapse.
    pub fn has_lapsed(&self, now: DateTime<Utc>) -> bool {
        matches!(self.renewal_date, Some(end) if end <= now)
    }
}
