use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::rsvp::{Rsvp, RsvpStatus, RsvpView};
use crate::services::split;

/// Lifecycle is one-directional: open -> locked -> closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Locked,
    Closed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "open",
            SessionStatus::Locked => "locked",
            SessionStatus::Closed => "closed",
        }
    }

    /// RSVPs are accepted while open or locked; only `closed` rejects them.
    pub fn accepts_rsvps(&self) -> bool {
        !matches!(self, SessionStatus::Closed)
    }

    pub fn can_lock(&self) -> bool {
        matches!(self, SessionStatus::Open)
    }

    /// Payment orders require the split to be frozen, i.e. not open.
    pub fn accepts_payments(&self) -> bool {
        !matches!(self, SessionStatus::Open)
    }
}

impl TryFrom<String> for SessionStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "open" => Ok(SessionStatus::Open),
            "locked" => Ok(SessionStatus::Locked),
            "closed" => Ok(SessionStatus::Closed),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

/// Validates a lock attempt: only an open session with at least one
/// confirmed player can freeze its split.
pub fn check_lockable(status: SessionStatus, confirmed: i64) -> Result<(), AppError> {
    if !status.can_lock() {
        tracing::warn!(
            status = status.as_str(),
            "lock rejected for non-open session"
        );
        return Err(AppError::BadRequest(format!(
            "Session is {}, only open sessions can be locked",
            status.as_str()
        )));
    }
    if confirmed == 0 {
        return Err(AppError::BadRequest(
            "No confirmed players to split cost".into(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub date: String,
    pub time: String,
    pub turf_name: String,
    pub turf_cost: i64,
    #[sqlx(try_from = "String")]
    pub status: SessionStatus,
    pub per_head_cost: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub date: String,
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(default = "default_turf_name")]
    pub turf_name: String,
    #[serde(default = "default_turf_cost")]
    pub turf_cost: i64,
}

fn default_time() -> String {
    "06:00".to_string()
}

fn default_turf_name() -> String {
    "Home Turf".to_string()
}

fn default_turf_cost() -> i64 {
    3200
}

/// Read-time projection of a session with its RSVPs. The per-head value and
/// collected total are derived on every read, never stored here.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: String,
    pub date: String,
    pub time: String,
    pub turf_name: String,
    pub turf_cost: i64,
    pub status: SessionStatus,
    pub per_head_cost: i64,
    pub confirmed_count: usize,
    pub maybe_count: usize,
    pub collected: i64,
    pub rsvps: Vec<RsvpView>,
}

impl SessionView {
    pub fn build(session: &Session, rsvps: &[Rsvp]) -> Self {
        Self {
            id: session.id.clone(),
            date: session.date.clone(),
            time: session.time.clone(),
            turf_name: session.turf_name.clone(),
            turf_cost: session.turf_cost,
            status: session.status,
            per_head_cost: split::per_head_cost(session.per_head_cost, session.turf_cost, rsvps),
            confirmed_count: split::count_with_status(rsvps, RsvpStatus::In),
            maybe_count: split::count_with_status(rsvps, RsvpStatus::Maybe),
            collected: split::collected(rsvps),
            rsvps: rsvps.iter().map(RsvpView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rsvp::PaymentStatus;

    fn session(status: SessionStatus, per_head: Option<i64>) -> Session {
        Session {
            id: "ab12cd34".into(),
            date: "2025-03-15".into(),
            time: "06:00".into(),
            turf_name: "Home Turf".into(),
            turf_cost: 3200,
            status,
            per_head_cost: per_head,
            created_at: Utc::now(),
        }
    }

    fn rsvp(id: i32, name: &str, status: RsvpStatus, payment: PaymentStatus, due: Option<i64>) -> Rsvp {
        Rsvp {
            id,
            session_id: "ab12cd34".into(),
            player_name: name.into(),
            phone: None,
            rsvp_status: status,
            payment_status: payment,
            amount_due: due,
            cashfree_order_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn lifecycle_guards() {
        assert!(SessionStatus::Open.can_lock());
        assert!(!SessionStatus::Locked.can_lock());
        assert!(!SessionStatus::Closed.can_lock());

        assert!(SessionStatus::Open.accepts_rsvps());
        assert!(SessionStatus::Locked.accepts_rsvps());
        assert!(!SessionStatus::Closed.accepts_rsvps());

        assert!(!SessionStatus::Open.accepts_payments());
        assert!(SessionStatus::Locked.accepts_payments());
        assert!(SessionStatus::Closed.accepts_payments());
    }

    #[test]
    fn lock_rejected_without_confirmed_players() {
        // The guard trips before any write, so status stays open and
        // per_head_cost stays null.
        let err = check_lockable(SessionStatus::Open, 0).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(err.to_string().contains("No confirmed players"));
    }

    #[test]
    fn lock_rejected_for_non_open_sessions() {
        for status in [SessionStatus::Locked, SessionStatus::Closed] {
            let err = check_lockable(status, 5).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
            assert!(err.to_string().contains("only open sessions"));
        }
    }

    #[test]
    fn lock_allowed_with_confirmed_players() {
        assert!(check_lockable(SessionStatus::Open, 1).is_ok());
        assert!(check_lockable(SessionStatus::Open, 11).is_ok());
    }

    #[test]
    fn create_request_defaults() {
        let req: CreateSessionRequest = serde_json::from_str(r#"{"date": "2025-03-15"}"#).unwrap();
        assert_eq!(req.time, "06:00");
        assert_eq!(req.turf_name, "Home Turf");
        assert_eq!(req.turf_cost, 3200);
    }

    #[test]
    fn view_counts_and_collected() {
        let s = session(SessionStatus::Locked, Some(1067));
        let rsvps = vec![
            rsvp(1, "Alice", RsvpStatus::In, PaymentStatus::PaidOnline, Some(1067)),
            rsvp(2, "Bob", RsvpStatus::In, PaymentStatus::Pending, Some(1067)),
            rsvp(3, "Cara", RsvpStatus::In, PaymentStatus::PaidCash, Some(1067)),
            rsvp(4, "Dev", RsvpStatus::Maybe, PaymentStatus::Pending, None),
            rsvp(5, "Eli", RsvpStatus::Out, PaymentStatus::Pending, None),
        ];
        let view = SessionView::build(&s, &rsvps);
        assert_eq!(view.confirmed_count, 3);
        assert_eq!(view.maybe_count, 1);
        assert_eq!(view.per_head_cost, 1067);
        assert_eq!(view.collected, 2134);
        assert_eq!(view.rsvps.len(), 5);
    }

    #[test]
    fn view_derives_per_head_before_lock() {
        let s = session(SessionStatus::Open, None);
        let rsvps = vec![
            rsvp(1, "Alice", RsvpStatus::In, PaymentStatus::Pending, None),
            rsvp(2, "Bob", RsvpStatus::In, PaymentStatus::Pending, None),
            rsvp(3, "Cara", RsvpStatus::In, PaymentStatus::Pending, None),
        ];
        let view = SessionView::build(&s, &rsvps);
        // ceil(3200 / 3)
        assert_eq!(view.per_head_cost, 1067);
        assert_eq!(view.collected, 0);
    }

    #[test]
    fn view_falls_back_to_full_cost_without_confirmations() {
        let s = session(SessionStatus::Open, None);
        let rsvps = vec![rsvp(1, "Dev", RsvpStatus::Maybe, PaymentStatus::Pending, None)];
        let view = SessionView::build(&s, &rsvps);
        assert_eq!(view.per_head_cost, 3200);
    }
}
