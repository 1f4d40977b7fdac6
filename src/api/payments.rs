use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use super::SuccessResponse;
use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthUser};
use crate::models::{Payment, PaymentRequest, PaymentResponse, PaymentsQuery};
use crate::services::import::months::{parse_month, MONTHS};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payments).post(create_payment))
        .route(
            "/:id",
            get(get_payment).put(update_payment).delete(delete_payment),
        )
}

const PAYMENT_SELECT: &str = r#"
    SELECT
        p.id,
        p.resident_id,
        r.full_name AS resident_name,
        r.block_number,
        r.apartment_number,
        p.amount,
        p.payment_date,
        p.payment_for_month,
        p.payment_for_year,
        p.payment_type,
        p.payment_method,
        p.notes,
        p.status
    FROM payments p
    JOIN residents r ON r.id = p.resident_id
"#;

fn check_payment(payload: &PaymentRequest) -> AppResult<()> {
    if payload.amount.is_sign_negative() {
        return Err(AppError::Validation("Amount must not be negative".to_string()));
    }
    if !payload.payment_for_year.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(format!(
            "Invalid payment year: {}",
            payload.payment_for_year
        )));
    }
    Ok(())
}

async fn ensure_resident(state: &AppState, resident_id: Uuid) -> AppResult<()> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM residents WHERE id = $1")
        .bind(resident_id)
        .fetch_optional(&state.pool)
        .await?;
    exists
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Resident not found".to_string()))
}

/// Платежи жильцов с фильтрами
#[utoipa::path(
    get,
    path = "/api/v1/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(PaymentsQuery),
    responses(
        (status = 200, description = "Payments", body = Vec<PaymentResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_payments(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<PaymentsQuery>,
) -> AppResult<Json<Vec<PaymentResponse>>> {
    let month = query.month.as_deref().map(|m| parse_month(m, &MONTHS));

    let sql = format!(
        r#"{}
        WHERE ($1::uuid IS NULL OR p.resident_id = $1)
          AND ($2::payment_status IS NULL OR p.status = $2)
          AND ($3::text IS NULL OR p.payment_for_month = $3)
          AND ($4::text IS NULL OR p.payment_for_year = $4)
        ORDER BY p.payment_date DESC, p.created_at DESC
        "#,
        PAYMENT_SELECT
    );

    let payments = sqlx::query_as::<_, PaymentResponse>(&sql)
        .bind(query.resident_id)
        .bind(query.status)
        .bind(month)
        .bind(query.year.as_deref().map(str::trim))
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(payments))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Payment", body = PaymentResponse),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn get_payment(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<PaymentResponse>> {
    let sql = format!("{} WHERE p.id = $1", PAYMENT_SELECT);
    let payment = sqlx::query_as::<_, PaymentResponse>(&sql)
        .bind(payment_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

    Ok(Json(payment))
}

/// Регистрация платежа
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "payments",
    security(("bearer_auth" = [])),
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Payment recorded", body = Payment),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Resident not found"),
        (status = 422, description = "Invalid data")
    )
)]
pub async fn create_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<PaymentRequest>,
) -> AppResult<Json<Payment>> {
    payload.validate()?;
    check_payment(&payload)?;
    ensure_resident(&state, payload.resident_id).await?;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments
            (resident_id, amount, payment_date, payment_for_month, payment_for_year,
             payment_type, payment_method, notes, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(payload.resident_id)
    .bind(payload.amount)
    .bind(payload.payment_date)
    .bind(parse_month(&payload.payment_for_month, &MONTHS))
    .bind(&payload.payment_for_year)
    .bind(payload.payment_type.trim())
    .bind(&payload.payment_method)
    .bind(&payload.notes)
    .bind(payload.status)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(
        payment_id = %payment.id,
        resident_id = %payment.resident_id,
        amount = %payment.amount,
        user_id = %auth_user.user_id,
        "Payment recorded"
    );

    Ok(Json(payment))
}

#[utoipa::path(
    put,
    path = "/api/v1/payments/{id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Payment ID")
    ),
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Payment updated", body = Payment),
        (status = 404, description = "Payment or resident not found")
    )
)]
pub async fn update_payment(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(payment_id): Path<Uuid>,
    Json(payload): Json<PaymentRequest>,
) -> AppResult<Json<Payment>> {
    payload.validate()?;
    check_payment(&payload)?;
    ensure_resident(&state, payload.resident_id).await?;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        UPDATE payments SET
            resident_id = $2,
            amount = $3,
            payment_date = $4,
            payment_for_month = $5,
            payment_for_year = $6,
            payment_type = $7,
            payment_method = $8,
            notes = $9,
            status = $10,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(payment_id)
    .bind(payload.resident_id)
    .bind(payload.amount)
    .bind(payload.payment_date)
    .bind(parse_month(&payload.payment_for_month, &MONTHS))
    .bind(&payload.payment_for_year)
    .bind(payload.payment_type.trim())
    .bind(&payload.payment_method)
    .bind(&payload.notes)
    .bind(payload.status)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

    Ok(Json(payment))
}

#[utoipa::path(
    delete,
    path = "/api/v1/payments/{id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Payment deleted", body = SuccessResponse),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn delete_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    let result = sqlx::query("DELETE FROM payments WHERE id = $1")
        .bind(payment_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Payment not found".to_string()));
    }

    tracing::info!(payment_id = %payment_id, user_id = %auth_user.user_id, "Payment deleted");

    Ok(Json(SuccessResponse { success: true }))
}
