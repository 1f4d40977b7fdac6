use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Apartment {
    pub id: Uuid,
    pub block_id: Uuid,
    pub number: String,
    pub floor: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct ApartmentResponse {
    pub id: Uuid,
    pub block_id: Uuid,
    pub block_name: String,
    pub number: String,
    pub floor: i32,
    pub resident_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateApartmentRequest {
    pub block_id: Uuid,
    #[validate(length(min = 1, max = 16))]
    pub number: String,
    /// Если не указан, вычисляется из номера квартиры
    pub floor: Option<i32>,
}

/// Массовое создание недостающих квартир после импорта
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkCreateApartmentsRequest {
    #[validate(length(min = 1))]
    pub block: String,
    #[validate(length(min = 1, max = 500))]
    pub numbers: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkCreateApartmentsResponse {
    pub block_id: Uuid,
    pub created_count: usize,
    pub created: Vec<Apartment>,
    pub reimport_ready: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ApartmentsQuery {
    pub block_id: Option<Uuid>,
}

/// Квартира для массового создания
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApartment {
    pub number: String,
    pub floor: i32,
}
