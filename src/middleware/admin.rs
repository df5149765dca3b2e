use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::AppState;

/// Admin gate: a single shared-secret header compared for equality.
/// Use via `axum::middleware::from_fn_with_state(state, require_admin)`.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let supplied = req
        .headers()
        .get(&state.config.admin.header)
        .and_then(|v| v.to_str().ok());

    if supplied != Some(state.config.admin.password.as_str()) {
        return Err(AppError::Forbidden("Unauthorized".into()));
    }

    Ok(next.run(req).await)
}
