use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "charge_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChargeCategory {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "charge_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChargeType {
    Resident,
    Syndicate,
    Maintenance,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "charge_period", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChargePeriod {
    Monthly,
    Quarterly,
    Yearly,
    OneTime,
}

impl Default for ChargePeriod {
    fn default() -> Self {
        Self::Monthly
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Charge {
    pub id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub category: ChargeCategory,
    pub charge_type: ChargeType,
    pub period: ChargePeriod,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChargeRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub amount: Decimal,
    pub category: ChargeCategory,
    pub charge_type: ChargeType,
    #[serde(default)]
    pub period: ChargePeriod,
    pub description: Option<String>,
}
