use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{PayCreateRequest, PayVerifyRequest, Rsvp, Session};
use crate::services::cashfree;
use crate::AppState;

const PHONE_PLACEHOLDER: &str = "9999999999";

/// Creates a gateway order for one RSVP's share and returns the payment
/// session token the client completes checkout with.
pub async fn create_payment(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<PayCreateRequest>,
) -> AppResult<Json<Value>> {
    let gateway = state
        .cashfree
        .as_ref()
        .ok_or_else(|| AppError::Internal("Cashfree not configured".into()))?;

    let session: Option<Session> = sqlx::query_as("SELECT * FROM sessions WHERE id = $1")
        .bind(&session_id)
        .fetch_optional(&state.db)
        .await?;
    let session = session.ok_or_else(|| AppError::NotFound("Session not found".into()))?;

    if !session.status.accepts_payments() {
        return Err(AppError::BadRequest("Session not locked yet".into()));
    }

    let rsvp: Option<Rsvp> = sqlx::query_as("SELECT * FROM rsvps WHERE id = $1")
        .bind(body.rsvp_id)
        .fetch_optional(&state.db)
        .await?;
    let rsvp = rsvp.ok_or_else(|| AppError::NotFound("RSVP not found".into()))?;

    if rsvp.payment_status.is_paid() {
        return Err(AppError::BadRequest("Already paid".into()));
    }

    let amount = rsvp
        .amount_due
        .or(session.per_head_cost)
        .ok_or_else(|| AppError::BadRequest("No amount due for this RSVP".into()))?;

    let order_id = cashfree::new_order_id(&session.id, rsvp.id);
    let phone = rsvp.phone.as_deref().unwrap_or(PHONE_PLACEHOLDER);
    let order = gateway
        .create_order(&order_id, amount, &rsvp.player_name, phone)
        .await?;

    sqlx::query("UPDATE rsvps SET cashfree_order_id = $1 WHERE id = $2")
        .bind(&order_id)
        .bind(rsvp.id)
        .execute(&state.db)
        .await?;

    tracing::info!(session_id = %session.id, rsvp_id = rsvp.id, %order_id, amount, "payment order created");
    Ok(Json(json!({
        "payment_session_id": order["payment_session_id"],
        "order_id": order_id,
    })))
}

/// Caller-initiated verification. Only a PAID order mutates state, so
/// repeat calls are harmless; anything else reports failure and changes
/// nothing.
pub async fn verify_payment(
    State(state): State<AppState>,
    Path(_session_id): Path<String>,
    Json(body): Json<PayVerifyRequest>,
) -> AppResult<Json<Value>> {
    let gateway = state
        .cashfree
        .as_ref()
        .ok_or_else(|| AppError::Internal("Cashfree not configured".into()))?;

    let order = gateway.get_order(&body.order_id).await?;
    if order["order_status"].as_str() != Some("PAID") {
        return Ok(Json(json!({ "success": false })));
    }

    let updated = sqlx::query("UPDATE rsvps SET payment_status = 'paid_online' WHERE id = $1")
        .bind(body.rsvp_id)
        .execute(&state.db)
        .await?;

    if updated.rows_affected() > 0 {
        tracing::info!(rsvp_id = body.rsvp_id, order_id = %body.order_id, "payment verified");
    }
    Ok(Json(json!({ "success": true })))
}
