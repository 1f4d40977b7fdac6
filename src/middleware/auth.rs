use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::{PgStore, PropertyCache, SingleFlight};

/// Токены выпускает внешний сервис входа, здесь они только проверяются
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String,
}

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: AdminRole,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminRole {
    Admin,
    SuperAdmin,
}

impl AuthUser {
    /// Массовые удаления доступны только супер-админу
    pub fn require_super_admin(&self) -> AppResult<()> {
        match self.role {
            AdminRole::SuperAdmin => Ok(()),
            AdminRole::Admin => Err(AppError::Forbidden),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub store: Arc<PgStore>,
    pub property_cache: Arc<PropertyCache>,
    /// Одновременно выполняется только один импорт
    pub import_flight: Arc<SingleFlight<()>>,
    /// Создание недостающих квартир, по одному запуску на блок
    pub apartment_flight: Arc<SingleFlight<String>>,
}

fn parse_role(role_str: &str) -> Option<AdminRole> {
    match role_str {
        "admin" => Some(AdminRole::Admin),
        "superadmin" | "super_admin" => Some(AdminRole::SuperAdmin),
        _ => None,
    }
}

/// Проверяет access-токен и роль администратора
pub fn verify_access_token(secret: &str, token: &str) -> AppResult<AuthUser> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?
    .claims;

    if claims.token_type != "access" {
        return Err(AppError::Unauthorized);
    }

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
    let role = parse_role(&claims.role).ok_or(AppError::Forbidden)?;

    Ok(AuthUser { user_id, role })
}

// Middleware для добавления AppState в extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(state);
    next.run(request).await
}

// Экстрактор для администратора
#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let app_state = parts.extensions.get::<AppState>().cloned().ok_or_else(|| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error"})),
            )
                .into_response()
        })?;

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": "Missing authorization header"})),
                )
                    .into_response()
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Invalid authorization header format"})),
            )
                .into_response()
        })?;

        verify_access_token(&app_state.config.jwt_secret, token).map_err(IntoResponse::into_response)
    }
}
