pub mod auth;

pub use auth::{auth_middleware, verify_access_token, AdminRole, AppState, AuthUser};
