use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use super::SuccessResponse;
use crate::error::{conflict_on_unique, AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{
    Apartment, ApartmentResponse, ApartmentsQuery, Block, BulkCreateApartmentsRequest,
    BulkCreateApartmentsResponse, CreateApartmentRequest,
};
use crate::services::import::{gaps, ImportSettings};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_apartments).post(create_apartment))
        .route("/bulk", post(bulk_create_apartments))
        .route("/:id", delete(delete_apartment))
}

/// Квартиры с именем текущего жильца
#[utoipa::path(
    get,
    path = "/api/v1/apartments",
    tag = "apartments",
    security(("bearer_auth" = [])),
    params(ApartmentsQuery),
    responses(
        (status = 200, description = "Apartments", body = Vec<ApartmentResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_apartments(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<ApartmentsQuery>,
) -> AppResult<Json<Vec<ApartmentResponse>>> {
    let apartments = sqlx::query_as::<_, ApartmentResponse>(
        r#"
        SELECT
            a.id,
            a.block_id,
            b.name AS block_name,
            a.number,
            a.floor,
            r.full_name AS resident_name
        FROM apartments a
        JOIN blocks b ON b.id = a.block_id
        LEFT JOIN residents r
            ON UPPER('Block ' || r.block_number) = UPPER(b.name)
            AND r.apartment_number = a.number
        WHERE ($1::uuid IS NULL OR a.block_id = $1)
        ORDER BY b.name, a.floor, a.number
        "#,
    )
    .bind(query.block_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(apartments))
}

/// Добавление квартиры в блок
#[utoipa::path(
    post,
    path = "/api/v1/apartments",
    tag = "apartments",
    security(("bearer_auth" = [])),
    request_body = CreateApartmentRequest,
    responses(
        (status = 200, description = "Apartment created", body = Apartment),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Block not found"),
        (status = 409, description = "Apartment already exists")
    )
)]
pub async fn create_apartment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateApartmentRequest>,
) -> AppResult<Json<Apartment>> {
    payload.validate()?;

    let block = sqlx::query_as::<_, Block>("SELECT * FROM blocks WHERE id = $1")
        .bind(payload.block_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Block not found".to_string()))?;

    let number = payload.number.trim();
    let floor = payload.floor.unwrap_or_else(|| gaps::floor_for(number));

    let apartment = sqlx::query_as::<_, Apartment>(
        "INSERT INTO apartments (block_id, number, floor) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(block.id)
    .bind(number)
    .bind(floor)
    .fetch_one(&state.pool)
    .await
    .map_err(conflict_on_unique(format!(
        "Apartment {} already exists in {}",
        number, block.name
    )))?;

    state.property_cache.invalidate();
    tracing::info!(
        block = %block.name,
        number = %apartment.number,
        user_id = %auth_user.user_id,
        "Apartment created"
    );

    Ok(Json(apartment))
}

/// Создание квартир, которых не хватило при импорте жильцов
#[utoipa::path(
    post,
    path = "/api/v1/apartments/bulk",
    tag = "apartments",
    security(("bearer_auth" = [])),
    request_body = BulkCreateApartmentsRequest,
    responses(
        (status = 200, description = "Apartments created", body = BulkCreateApartmentsResponse),
        (status = 400, description = "No apartment numbers"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Block not found"),
        (status = 409, description = "Creation for this block is already running")
    )
)]
pub async fn bulk_create_apartments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<BulkCreateApartmentsRequest>,
) -> AppResult<Json<BulkCreateApartmentsResponse>> {
    payload.validate()?;

    let settings = ImportSettings::from(&state.config);
    let resolution = gaps::resolve_missing_apartments(
        state.store.as_ref(),
        &state.apartment_flight,
        settings.retry,
        &payload.block,
        &payload.numbers,
    )
    .await?;

    tracing::info!(
        block = %payload.block,
        created = resolution.created.len(),
        user_id = %auth_user.user_id,
        "Bulk apartment creation finished"
    );

    Ok(Json(BulkCreateApartmentsResponse {
        block_id: resolution.block_id,
        created_count: resolution.created.len(),
        created: resolution.created,
        reimport_ready: resolution.reimport_ready,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/apartments/{id}",
    tag = "apartments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Apartment ID")
    ),
    responses(
        (status = 200, description = "Apartment deleted", body = SuccessResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Apartment not found")
    )
)]
pub async fn delete_apartment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(apartment_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    let result = sqlx::query("DELETE FROM apartments WHERE id = $1")
        .bind(apartment_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Apartment not found".to_string()));
    }

    state.property_cache.invalidate();
    tracing::info!(apartment_id = %apartment_id, user_id = %auth_user.user_id, "Apartment deleted");

    Ok(Json(SuccessResponse { success: true }))
}
