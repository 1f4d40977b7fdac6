use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post, MethodRouter},
    Json, Router,
};
use chrono::Utc;
use std::convert::Infallible;
use tower_http::limit::RequestBodyLimitLayer;
use uuid::Uuid;
use validator::Validate;

use super::SuccessResponse;
use crate::error::{conflict_on_unique, AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{
    CreateResidentRequest, DeleteResidentsResponse, ImportReport, NewResident, Resident,
    UpdateResidentRequest,
};
use crate::services::file_service::{
    export_file_name, export_residents, read_import_file, MAX_IMPORT_SIZE,
};
use crate::services::import::months::{parse_month, parse_year, MONTHS};
use crate::services::import::{run_import, ImportSettings};
use crate::services::{OccupancyIndex, OccupancyKey, ResidentStore};
use crate::utils::validators::{non_blank, sanitize_string, validate_phone};

/// Запас сверх размера файла на заголовки multipart
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_residents)
                .post(create_resident)
                .delete(delete_all_residents),
        )
        .route("/import", upload_limited(post(import_residents)))
        .route("/export", get(export_residents_csv))
        .route(
            "/:id",
            get(get_resident).put(update_resident).delete(delete_resident),
        )
}

/// Вместо стандартного лимита axum (2 МБ) действует лимит файла импорта
fn upload_limited<S>(route: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route
        .layer::<_, Infallible>(DefaultBodyLimit::disable())
        .layer::<_, Infallible>(RequestBodyLimitLayer::new(
            MAX_IMPORT_SIZE + MULTIPART_OVERHEAD,
        ))
}

fn checked_phone(phone: Option<&str>) -> AppResult<Option<String>> {
    match non_blank(phone) {
        Some(phone) if !validate_phone(&phone) => {
            Err(AppError::Validation(format!("Invalid phone number: {}", phone)))
        }
        phone => Ok(phone),
    }
}

/// Помещение должно существовать и быть свободным (кроме самого редактируемого жильца)
async fn ensure_unit_available(
    store: &dyn ResidentStore,
    key: &OccupancyKey,
    excluding: Option<Uuid>,
) -> AppResult<()> {
    if !store.block_exists(&key.block).await? {
        return Err(AppError::NotFound(format!(
            "Block \"{}\" does not exist",
            key.block
        )));
    }
    if !store.apartment_exists(&key.block, &key.unit).await? {
        return Err(AppError::NotFound(format!(
            "Apartment {} does not exist in Block {}",
            key.unit, key.block
        )));
    }

    let residents = store.list_residents().await?;
    let index = OccupancyIndex::from_residents(&residents);
    if let Some(occupant) = index.occupant(&key.block, &key.unit, excluding) {
        return Err(AppError::Conflict(format!(
            "{} is already occupied by {}",
            key, occupant.full_name
        )));
    }
    Ok(())
}

/// Список жильцов
#[utoipa::path(
    get,
    path = "/api/v1/residents",
    tag = "residents",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Residents", body = Vec<Resident>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_residents(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<Vec<Resident>>> {
    Ok(Json(state.store.list_residents().await?))
}

/// Ручное добавление жильца
#[utoipa::path(
    post,
    path = "/api/v1/residents",
    tag = "residents",
    security(("bearer_auth" = [])),
    request_body = CreateResidentRequest,
    responses(
        (status = 200, description = "Resident created", body = Resident),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Block or apartment not found"),
        (status = 409, description = "Apartment already occupied"),
        (status = 422, description = "Invalid data")
    )
)]
pub async fn create_resident(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateResidentRequest>,
) -> AppResult<Json<Resident>> {
    payload.validate()?;
    let phone_number = checked_phone(payload.phone_number.as_deref())?;

    let key = OccupancyKey::new(&payload.block_number, &payload.apartment_number);
    ensure_unit_available(state.store.as_ref(), &key, None).await?;

    let resident = state
        .store
        .create_resident(&NewResident {
            full_name: sanitize_string(&payload.full_name).to_uppercase(),
            phone_number,
            block_number: key.block.clone(),
            apartment_number: key.unit.clone(),
            move_in_month: parse_month(&payload.move_in_month, &MONTHS),
            move_in_year: parse_year(&payload.move_in_year),
        })
        .await?;

    tracing::info!(
        resident_id = %resident.id,
        unit = %key,
        user_id = %auth_user.user_id,
        "Resident created"
    );

    Ok(Json(resident))
}

#[utoipa::path(
    get,
    path = "/api/v1/residents/{id}",
    tag = "residents",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Resident ID")
    ),
    responses(
        (status = 200, description = "Resident", body = Resident),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Resident not found")
    )
)]
pub async fn get_resident(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(resident_id): Path<Uuid>,
) -> AppResult<Json<Resident>> {
    let resident = sqlx::query_as::<_, Resident>("SELECT * FROM residents WHERE id = $1")
        .bind(resident_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Resident not found".to_string()))?;

    Ok(Json(resident))
}

/// Редактирование жильца. Имя сохраняется как введено,
/// пустой период въезда оставляет прежнее значение.
#[utoipa::path(
    put,
    path = "/api/v1/residents/{id}",
    tag = "residents",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Resident ID")
    ),
    request_body = UpdateResidentRequest,
    responses(
        (status = 200, description = "Resident updated", body = Resident),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Resident, block or apartment not found"),
        (status = 409, description = "Apartment already occupied")
    )
)]
pub async fn update_resident(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(resident_id): Path<Uuid>,
    Json(payload): Json<UpdateResidentRequest>,
) -> AppResult<Json<Resident>> {
    payload.validate()?;
    let phone_number = checked_phone(payload.phone_number.as_deref())?;

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM residents WHERE id = $1")
        .bind(resident_id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Resident not found".to_string()));
    }

    let key = OccupancyKey::new(&payload.block_number, &payload.apartment_number);
    ensure_unit_available(state.store.as_ref(), &key, Some(resident_id)).await?;

    let move_in_month = non_blank(payload.move_in_month.as_deref()).map(|m| parse_month(&m, &MONTHS));
    let move_in_year = non_blank(payload.move_in_year.as_deref()).map(|y| parse_year(&y));

    let resident = sqlx::query_as::<_, Resident>(
        r#"
        UPDATE residents SET
            full_name = $2,
            phone_number = $3,
            block_number = $4,
            apartment_number = $5,
            move_in_month = COALESCE($6, move_in_month),
            move_in_year = COALESCE($7, move_in_year),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(resident_id)
    .bind(sanitize_string(&payload.full_name))
    .bind(&phone_number)
    .bind(&key.block)
    .bind(&key.unit)
    .bind(&move_in_month)
    .bind(&move_in_year)
    .fetch_one(&state.pool)
    .await
    .map_err(conflict_on_unique(format!("{} is already occupied", key)))?;

    tracing::info!(
        resident_id = %resident.id,
        unit = %key,
        user_id = %auth_user.user_id,
        "Resident updated"
    );

    Ok(Json(resident))
}

#[utoipa::path(
    delete,
    path = "/api/v1/residents/{id}",
    tag = "residents",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Resident ID")
    ),
    responses(
        (status = 200, description = "Resident deleted", body = SuccessResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Resident not found")
    )
)]
pub async fn delete_resident(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(resident_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    let result = sqlx::query("DELETE FROM residents WHERE id = $1")
        .bind(resident_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Resident not found".to_string()));
    }

    tracing::info!(resident_id = %resident_id, user_id = %auth_user.user_id, "Resident deleted");

    Ok(Json(SuccessResponse { success: true }))
}

/// Удаление всех жильцов (перед повторным импортом)
#[utoipa::path(
    delete,
    path = "/api/v1/residents",
    tag = "residents",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Residents deleted", body = DeleteResidentsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Super admin role required")
    )
)]
pub async fn delete_all_residents(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DeleteResidentsResponse>> {
    auth_user.require_super_admin()?;

    let result = sqlx::query("DELETE FROM residents")
        .execute(&state.pool)
        .await?;

    tracing::warn!(
        deleted = result.rows_affected(),
        user_id = %auth_user.user_id,
        "All residents deleted"
    );

    Ok(Json(DeleteResidentsResponse {
        success: true,
        deleted: result.rows_affected(),
    }))
}

/// Импорт жильцов из CSV-файла (поле `file`)
#[utoipa::path(
    post,
    path = "/api/v1/residents/import",
    tag = "residents",
    security(("bearer_auth" = [])),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import report", body = ImportReport),
        (status = 400, description = "File missing or unreadable"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Another import is running"),
        (status = 413, description = "File too large")
    )
)]
pub async fn import_residents(
    State(state): State<AppState>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<ImportReport>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let text = read_import_file(&file_name, &data)?;

        let _flight = state
            .import_flight
            .try_begin(())
            .ok_or_else(|| AppError::Conflict("An import is already running".to_string()))?;

        tracing::info!(
            file = %file_name,
            bytes = data.len(),
            user_id = %auth_user.user_id,
            "Resident import started"
        );

        let settings = ImportSettings::from(&state.config);
        let report = run_import(state.store.as_ref(), &settings, &text).await?;

        return Ok(Json(report));
    }

    Err(AppError::BadRequest("File not found".to_string()))
}

/// Выгрузка всех жильцов в CSV
#[utoipa::path(
    get,
    path = "/api/v1/residents/export",
    tag = "residents",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "CSV file", body = String, content_type = "text/csv"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn export_residents_csv(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let residents = state.store.list_residents().await?;
    let body = export_residents(&residents)?;
    let file_name = export_file_name(Utc::now().date_naive());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    ))
}
