use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Block {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct BlockResponse {
    pub id: Uuid,
    pub name: String,
    pub apartments_count: i64,
    pub occupied_count: i64,
}

/// Имя блока: "Block " + буква + необязательные цифры, например "Block A12".
/// Короткий код ("A12") тоже принимается и дополняется префиксом.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBlockRequest {
    #[validate(length(min = 1, max = 32))]
    pub name: String,
}
