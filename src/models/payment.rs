use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::Paid
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub resident_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_for_month: String,
    pub payment_for_year: String,
    /// Свободный текст, обычно совпадает с названием начисления
    pub payment_type: String,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub resident_id: Uuid,
    pub resident_name: String,
    pub block_number: String,
    pub apartment_number: String,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_for_month: String,
    pub payment_for_year: String,
    pub payment_type: String,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub status: PaymentStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PaymentRequest {
    pub resident_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    #[validate(length(min = 1))]
    pub payment_for_month: String,
    #[validate(length(min = 4, max = 4))]
    pub payment_for_year: String,
    #[validate(length(min = 1, max = 120))]
    pub payment_type: String,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub status: PaymentStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PaymentsQuery {
    pub resident_id: Option<Uuid>,
    pub status: Option<PaymentStatus>,
    pub month: Option<String>,
    pub year: Option<String>,
}
