use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use super::SuccessResponse;
use crate::error::{conflict_on_unique, AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{Block, BlockResponse, CreateBlockRequest};
use crate::utils::validators::{block_code, block_label, validate_block_name};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_blocks).post(create_block))
        .route("/:id", delete(delete_block))
}

/// Список блоков со счётчиками квартир и жильцов
#[utoipa::path(
    get,
    path = "/api/v1/blocks",
    tag = "blocks",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Blocks", body = Vec<BlockResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_blocks(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<Vec<BlockResponse>>> {
    let blocks = sqlx::query_as::<_, BlockResponse>(
        r#"
        SELECT
            b.id,
            b.name,
            COUNT(DISTINCT a.id) AS apartments_count,
            COUNT(DISTINCT r.id) AS occupied_count
        FROM blocks b
        LEFT JOIN apartments a ON a.block_id = b.id
        LEFT JOIN residents r
            ON UPPER('Block ' || r.block_number) = UPPER(b.name)
            AND r.apartment_number = a.number
        GROUP BY b.id, b.name
        ORDER BY b.name
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(blocks))
}

/// Создание блока
#[utoipa::path(
    post,
    path = "/api/v1/blocks",
    tag = "blocks",
    security(("bearer_auth" = [])),
    request_body = CreateBlockRequest,
    responses(
        (status = 200, description = "Block created", body = Block),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Block already exists"),
        (status = 422, description = "Invalid block name")
    )
)]
pub async fn create_block(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateBlockRequest>,
) -> AppResult<Json<Block>> {
    payload.validate()?;

    let name = block_label(&payload.name);
    if !validate_block_name(&name) {
        return Err(AppError::Validation(format!(
            "Block name must look like \"Block A\" or \"Block A12\", got \"{}\"",
            payload.name.trim()
        )));
    }

    let block = sqlx::query_as::<_, Block>("INSERT INTO blocks (name) VALUES ($1) RETURNING *")
        .bind(&name)
        .fetch_one(&state.pool)
        .await
        .map_err(conflict_on_unique(format!("{} already exists", name)))?;

    state.property_cache.invalidate();
    tracing::info!(block = %block.name, user_id = %auth_user.user_id, "Block created");

    Ok(Json(block))
}

/// Удаление блока вместе с его квартирами
#[utoipa::path(
    delete,
    path = "/api/v1/blocks/{id}",
    tag = "blocks",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Block ID")
    ),
    responses(
        (status = 200, description = "Block deleted", body = SuccessResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Block not found"),
        (status = 409, description = "Block still has residents")
    )
)]
pub async fn delete_block(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(block_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    let block = sqlx::query_as::<_, Block>("SELECT * FROM blocks WHERE id = $1")
        .bind(block_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Block not found".to_string()))?;

    let residents: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM residents WHERE UPPER(block_number) = UPPER($1)",
    )
    .bind(block_code(&block.name))
    .fetch_one(&state.pool)
    .await?;

    if residents.0 > 0 {
        return Err(AppError::Conflict(format!(
            "{} still has {} resident(s)",
            block.name, residents.0
        )));
    }

    sqlx::query("DELETE FROM blocks WHERE id = $1")
        .bind(block_id)
        .execute(&state.pool)
        .await?;

    state.property_cache.invalidate();
    tracing::info!(block = %block.name, user_id = %auth_user.user_id, "Block deleted");

    Ok(Json(SuccessResponse { success: true }))
}
