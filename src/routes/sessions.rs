use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    check_lockable, resolve_upsert, CreateSessionRequest, Rsvp, RsvpRequest, RsvpUpsert, RsvpView,
    Session, SessionView,
};
use crate::services::split;
use crate::AppState;

async fn fetch_session(db: &sqlx::PgPool, session_id: &str) -> AppResult<Session> {
    let session: Option<Session> = sqlx::query_as("SELECT * FROM sessions WHERE id = $1")
        .bind(session_id)
        .fetch_optional(db)
        .await?;
    session.ok_or_else(|| AppError::NotFound("Session not found".into()))
}

async fn fetch_rsvps(db: &sqlx::PgPool, session_id: &str) -> AppResult<Vec<Rsvp>> {
    let rsvps: Vec<Rsvp> =
        sqlx::query_as("SELECT * FROM rsvps WHERE session_id = $1 ORDER BY created_at, id")
            .bind(session_id)
            .fetch_all(db)
            .await?;
    Ok(rsvps)
}

async fn load_view(db: &sqlx::PgPool, session: &Session) -> AppResult<SessionView> {
    let rsvps = fetch_rsvps(db, &session.id).await?;
    Ok(SessionView::build(session, &rsvps))
}

// --- Public endpoints ---

/// Newest session still open or locked, the one the group page renders.
pub async fn get_current(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let session: Option<Session> = sqlx::query_as(
        "SELECT * FROM sessions WHERE status IN ('open', 'locked') ORDER BY created_at DESC LIMIT 1",
    )
    .fetch_optional(&state.db)
    .await?;

    match session {
        Some(s) => {
            let view = load_view(&state.db, &s).await?;
            Ok(Json(json!({ "session": view })))
        }
        None => Ok(Json(json!({ "session": null }))),
    }
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionView>> {
    let session = fetch_session(&state.db, &session_id).await?;
    Ok(Json(load_view(&state.db, &session).await?))
}

/// Upsert keyed on player_name: a repeat submission edits the existing RSVP
/// instead of adding a second row for the same player.
pub async fn add_rsvp(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<RsvpRequest>,
) -> AppResult<Json<RsvpView>> {
    let mut tx = state.db.begin().await?;

    let session: Option<Session> = sqlx::query_as("SELECT * FROM sessions WHERE id = $1")
        .bind(&session_id)
        .fetch_optional(&mut *tx)
        .await?;
    let session = session.ok_or_else(|| AppError::NotFound("Session not found".into()))?;

    if !session.status.accepts_rsvps() {
        return Err(AppError::BadRequest("Session is closed".into()));
    }

    let existing: Option<Rsvp> =
        sqlx::query_as("SELECT * FROM rsvps WHERE session_id = $1 AND player_name = $2")
            .bind(&session_id)
            .bind(&body.player_name)
            .fetch_optional(&mut *tx)
            .await?;

    let rsvp: Rsvp = match resolve_upsert(existing.as_ref(), &body) {
        RsvpUpsert::Update {
            id,
            rsvp_status,
            phone,
        } => {
            sqlx::query_as(
                "UPDATE rsvps SET rsvp_status = $1, phone = $2 WHERE id = $3 RETURNING *",
            )
            .bind(rsvp_status.as_str())
            .bind(phone)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
        }
        RsvpUpsert::Insert { rsvp_status, phone } => {
            sqlx::query_as(
                "INSERT INTO rsvps (session_id, player_name, phone, rsvp_status) VALUES ($1, $2, $3, $4) RETURNING *",
            )
            .bind(&session_id)
            .bind(&body.player_name)
            .bind(phone)
            .bind(rsvp_status.as_str())
            .fetch_one(&mut *tx)
            .await?
        }
    };

    tx.commit().await?;
    Ok(Json(RsvpView::from(&rsvp)))
}

// --- Admin endpoints ---

pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> AppResult<Json<SessionView>> {
    let id = Uuid::new_v4().simple().to_string()[..8].to_string();

    let session: Session = sqlx::query_as(
        "INSERT INTO sessions (id, date, time, turf_name, turf_cost) VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(&id)
    .bind(&body.date)
    .bind(&body.time)
    .bind(&body.turf_name)
    .bind(body.turf_cost)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(session_id = %session.id, date = %session.date, "session created");
    Ok(Json(load_view(&state.db, &session).await?))
}

/// Freezes the split: stamps per_head_cost on the session and amount_due on
/// every currently-confirmed RSVP, in one transaction. A one-time snapshot;
/// later RSVP changes never recompute it.
pub async fn lock_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionView>> {
    let mut tx = state.db.begin().await?;

    let session: Option<Session> = sqlx::query_as("SELECT * FROM sessions WHERE id = $1")
        .bind(&session_id)
        .fetch_optional(&mut *tx)
        .await?;
    let session = session.ok_or_else(|| AppError::NotFound("Session not found".into()))?;

    let confirmed: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM rsvps WHERE session_id = $1 AND rsvp_status = 'in'",
    )
    .bind(&session_id)
    .fetch_one(&mut *tx)
    .await?;

    check_lockable(session.status, confirmed)?;

    let per_head = split::ceil_div(session.turf_cost, confirmed);

    let session: Session = sqlx::query_as(
        "UPDATE sessions SET status = 'locked', per_head_cost = $1 WHERE id = $2 RETURNING *",
    )
    .bind(per_head)
    .bind(&session_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE rsvps SET amount_due = $1 WHERE session_id = $2 AND rsvp_status = 'in'")
        .bind(per_head)
        .bind(&session_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(session_id = %session.id, confirmed, per_head, "session locked");
    Ok(Json(load_view(&state.db, &session).await?))
}

/// Unconditional overwrite, including over paid_online. Preserved behavior,
/// but flagged in the logs as a known risk.
pub async fn mark_cash(
    State(state): State<AppState>,
    Path((_session_id, rsvp_id)): Path<(String, i32)>,
) -> AppResult<Json<RsvpView>> {
    let rsvp: Option<Rsvp> = sqlx::query_as("SELECT * FROM rsvps WHERE id = $1")
        .bind(rsvp_id)
        .fetch_optional(&state.db)
        .await?;
    let rsvp = rsvp.ok_or_else(|| AppError::NotFound("RSVP not found".into()))?;

    if rsvp.payment_status.is_paid() {
        tracing::warn!(
            rsvp_id,
            previous = rsvp.payment_status.as_str(),
            "mark-cash overwriting an already-paid RSVP"
        );
    }

    let rsvp: Rsvp =
        sqlx::query_as("UPDATE rsvps SET payment_status = 'paid_cash' WHERE id = $1 RETURNING *")
            .bind(rsvp_id)
            .fetch_one(&state.db)
            .await?;

    Ok(Json(RsvpView::from(&rsvp)))
}

/// Hard delete; per_head_cost is deliberately not recomputed.
pub async fn remove_rsvp(
    State(state): State<AppState>,
    Path((_session_id, rsvp_id)): Path<(String, i32)>,
) -> AppResult<Json<Value>> {
    let deleted = sqlx::query("DELETE FROM rsvps WHERE id = $1")
        .bind(rsvp_id)
        .execute(&state.db)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(AppError::NotFound("RSVP not found".into()));
    }
    Ok(Json(json!({ "ok": true })))
}

pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<Value>> {
    let session = fetch_session(&state.db, &session_id).await?;

    sqlx::query("UPDATE sessions SET status = 'closed' WHERE id = $1")
        .bind(&session.id)
        .execute(&state.db)
        .await?;

    tracing::info!(session_id = %session.id, "session closed");
    Ok(Json(json!({ "ok": true })))
}

/// Two-step cascade inside one transaction: dependents first, then the
/// session row.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<Value>> {
    let mut tx = state.db.begin().await?;

    let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM sessions WHERE id = $1")
        .bind(&session_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Session not found".into()));
    }

    sqlx::query("DELETE FROM rsvps WHERE session_id = $1")
        .bind(&session_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(&session_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(session_id = %session_id, "session deleted");
    Ok(Json(json!({ "ok": true })))
}
