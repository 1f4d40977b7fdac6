use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Resident {
    pub id: Uuid,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub block_number: String,
    pub apartment_number: String,
    pub move_in_month: Option<String>,
    pub move_in_year: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Данные для создания жильца (ручное добавление и импорт)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResident {
    pub full_name: String,
    pub phone_number: Option<String>,
    pub block_number: String,
    pub apartment_number: String,
    pub move_in_month: String,
    pub move_in_year: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateResidentRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    pub phone_number: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub block_number: String,
    #[validate(length(min = 1, max = 16))]
    pub apartment_number: String,
    #[validate(length(min = 1))]
    pub move_in_month: String,
    #[validate(length(min = 4, max = 4))]
    pub move_in_year: String,
}

/// При редактировании период въезда не обязателен
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateResidentRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    pub phone_number: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub block_number: String,
    #[validate(length(min = 1, max = 16))]
    pub apartment_number: String,
    pub move_in_month: Option<String>,
    pub move_in_year: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResidentsResponse {
    pub success: bool,
    pub deleted: u64,
}
