pub mod apartments;
pub mod blocks;
pub mod charges;
pub mod payments;
pub mod residents;

use crate::middleware::AppState;
use axum::Router;

/// Ответ на операции без полезной нагрузки
#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/blocks", blocks::routes())
        .nest("/apartments", apartments::routes())
        .nest("/residents", residents::routes())
        .nest("/charges", charges::routes())
        .nest("/payments", payments::routes())
}
