use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use super::SuccessResponse;
use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{Charge, ChargeRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_charges).post(create_charge))
        .route(
            "/:id",
            get(get_charge).put(update_charge).delete(delete_charge),
        )
}

fn check_amount(payload: &ChargeRequest) -> AppResult<()> {
    if payload.amount.is_sign_negative() {
        return Err(AppError::Validation("Amount must not be negative".to_string()));
    }
    Ok(())
}

/// Статьи начислений синдиката
#[utoipa::path(
    get,
    path = "/api/v1/charges",
    tag = "charges",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Charges", body = Vec<Charge>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_charges(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> AppResult<Json<Vec<Charge>>> {
    let charges = sqlx::query_as::<_, Charge>("SELECT * FROM charges ORDER BY created_at DESC")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(charges))
}

#[utoipa::path(
    get,
    path = "/api/v1/charges/{id}",
    tag = "charges",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Charge ID")
    ),
    responses(
        (status = 200, description = "Charge", body = Charge),
        (status = 404, description = "Charge not found")
    )
)]
pub async fn get_charge(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(charge_id): Path<Uuid>,
) -> AppResult<Json<Charge>> {
    let charge = sqlx::query_as::<_, Charge>("SELECT * FROM charges WHERE id = $1")
        .bind(charge_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Charge not found".to_string()))?;

    Ok(Json(charge))
}

#[utoipa::path(
    post,
    path = "/api/v1/charges",
    tag = "charges",
    security(("bearer_auth" = [])),
    request_body = ChargeRequest,
    responses(
        (status = 200, description = "Charge created", body = Charge),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Invalid data")
    )
)]
pub async fn create_charge(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<ChargeRequest>,
) -> AppResult<Json<Charge>> {
    payload.validate()?;
    check_amount(&payload)?;

    let charge = sqlx::query_as::<_, Charge>(
        r#"
        INSERT INTO charges (name, amount, category, charge_type, period, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.amount)
    .bind(payload.category)
    .bind(payload.charge_type)
    .bind(payload.period)
    .bind(&payload.description)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(charge_id = %charge.id, user_id = %auth_user.user_id, "Charge created");

    Ok(Json(charge))
}

#[utoipa::path(
    put,
    path = "/api/v1/charges/{id}",
    tag = "charges",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Charge ID")
    ),
    request_body = ChargeRequest,
    responses(
        (status = 200, description = "Charge updated", body = Charge),
        (status = 404, description = "Charge not found")
    )
)]
pub async fn update_charge(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(charge_id): Path<Uuid>,
    Json(payload): Json<ChargeRequest>,
) -> AppResult<Json<Charge>> {
    payload.validate()?;
    check_amount(&payload)?;

    let charge = sqlx::query_as::<_, Charge>(
        r#"
        UPDATE charges SET
            name = $2,
            amount = $3,
            category = $4,
            charge_type = $5,
            period = $6,
            description = $7,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(charge_id)
    .bind(payload.name.trim())
    .bind(payload.amount)
    .bind(payload.category)
    .bind(payload.charge_type)
    .bind(payload.period)
    .bind(&payload.description)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Charge not found".to_string()))?;

    Ok(Json(charge))
}

#[utoipa::path(
    delete,
    path = "/api/v1/charges/{id}",
    tag = "charges",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Charge ID")
    ),
    responses(
        (status = 200, description = "Charge deleted", body = SuccessResponse),
        (status = 404, description = "Charge not found")
    )
)]
pub async fn delete_charge(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(charge_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    let result = sqlx::query("DELETE FROM charges WHERE id = $1")
        .bind(charge_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Charge not found".to_string()));
    }

    tracing::info!(charge_id = %charge_id, user_id = %auth_user.user_id, "Charge deleted");

    Ok(Json(SuccessResponse { success: true }))
}
