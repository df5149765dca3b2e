use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    In,
    Maybe,
    Out,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::In => "in",
            RsvpStatus::Maybe => "maybe",
            RsvpStatus::Out => "out",
        }
    }
}

impl TryFrom<String> for RsvpStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "in" => Ok(RsvpStatus::In),
            "maybe" => Ok(RsvpStatus::Maybe),
            "out" => Ok(RsvpStatus::Out),
            other => Err(format!("unknown rsvp_status: {other}")),
        }
    }
}

/// Payment state only ever advances from `pending`; the one sanctioned
/// exception is the admin cash override, which may overwrite `paid_online`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    PaidOnline,
    PaidCash,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::PaidOnline => "paid_online",
            PaymentStatus::PaidCash => "paid_cash",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::PaidOnline | PaymentStatus::PaidCash)
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "paid_online" => Ok(PaymentStatus::PaidOnline),
            "paid_cash" => Ok(PaymentStatus::PaidCash),
            other => Err(format!("unknown payment_status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Rsvp {
    pub id: i32,
    pub session_id: String,
    pub player_name: String,
    pub phone: Option<String>,
    #[sqlx(try_from = "String")]
    pub rsvp_status: RsvpStatus,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    pub amount_due: Option<i64>,
    pub cashfree_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RsvpRequest {
    pub player_name: String,
    pub phone: Option<String>,
    #[serde(default = "default_rsvp_status")]
    pub rsvp_status: RsvpStatus,
}

fn default_rsvp_status() -> RsvpStatus {
    RsvpStatus::In
}

impl RsvpRequest {
    /// Phone as stored: an empty submission counts as absent.
    pub fn normalized_phone(&self) -> Option<&str> {
        self.phone.as_deref().filter(|p| !p.is_empty())
    }
}

/// Resolved write for an RSVP submission, carrying the final field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RsvpUpsert {
    Update {
        id: i32,
        rsvp_status: RsvpStatus,
        phone: Option<String>,
    },
    Insert {
        rsvp_status: RsvpStatus,
        phone: Option<String>,
    },
}

/// Resolves a submission against the player's existing RSVP, if any. The
/// same name always lands on one row, taking the latest rsvp_status and
/// the last non-empty phone.
pub fn resolve_upsert(existing: Option<&Rsvp>, req: &RsvpRequest) -> RsvpUpsert {
    let phone = req.normalized_phone().map(str::to_string);
    match existing {
        Some(r) => RsvpUpsert::Update {
            id: r.id,
            rsvp_status: req.rsvp_status,
            phone: phone.or_else(|| r.phone.clone()),
        },
        None => RsvpUpsert::Insert {
            rsvp_status: req.rsvp_status,
            phone,
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct PayCreateRequest {
    pub rsvp_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct PayVerifyRequest {
    pub order_id: String,
    pub rsvp_id: i32,
}

#[derive(Debug, Serialize)]
pub struct RsvpView {
    pub id: i32,
    pub player_name: String,
    pub phone: Option<String>,
    pub rsvp_status: RsvpStatus,
    pub payment_status: PaymentStatus,
    pub amount_due: Option<i64>,
}

impl From<&Rsvp> for RsvpView {
    fn from(r: &Rsvp) -> Self {
        Self {
            id: r.id,
            player_name: r.player_name.clone(),
            phone: r.phone.clone(),
            rsvp_status: r.rsvp_status,
            payment_status: r.payment_status,
            amount_due: r.amount_due,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for s in [RsvpStatus::In, RsvpStatus::Maybe, RsvpStatus::Out] {
            assert_eq!(RsvpStatus::try_from(s.as_str().to_string()), Ok(s));
        }
        for s in [
            PaymentStatus::Pending,
            PaymentStatus::PaidOnline,
            PaymentStatus::PaidCash,
        ] {
            assert_eq!(PaymentStatus::try_from(s.as_str().to_string()), Ok(s));
        }
        assert!(RsvpStatus::try_from("yes".to_string()).is_err());
        assert!(PaymentStatus::try_from("paid".to_string()).is_err());
    }

    #[test]
    fn only_paid_statuses_count_as_paid() {
        assert!(!PaymentStatus::Pending.is_paid());
        assert!(PaymentStatus::PaidOnline.is_paid());
        assert!(PaymentStatus::PaidCash.is_paid());
    }

    fn request(name: &str, phone: Option<&str>, status: RsvpStatus) -> RsvpRequest {
        RsvpRequest {
            player_name: name.into(),
            phone: phone.map(str::to_string),
            rsvp_status: status,
        }
    }

    fn existing_rsvp(id: i32, name: &str, phone: Option<&str>, status: RsvpStatus) -> Rsvp {
        Rsvp {
            id,
            session_id: "ab12cd34".into(),
            player_name: name.into(),
            phone: phone.map(str::to_string),
            rsvp_status: status,
            payment_status: PaymentStatus::Pending,
            amount_due: None,
            cashfree_order_id: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn first_submission_inserts() {
        let req = request("Alice", Some("12345"), RsvpStatus::In);
        assert_eq!(
            resolve_upsert(None, &req),
            RsvpUpsert::Insert {
                rsvp_status: RsvpStatus::In,
                phone: Some("12345".into()),
            }
        );
    }

    #[test]
    fn repeat_submission_updates_in_place_with_latest_status() {
        // Alice joins as `in`, then edits to `maybe`: one row, newest status.
        let alice = existing_rsvp(7, "Alice", Some("12345"), RsvpStatus::In);
        let req = request("Alice", None, RsvpStatus::Maybe);
        assert_eq!(
            resolve_upsert(Some(&alice), &req),
            RsvpUpsert::Update {
                id: 7,
                rsvp_status: RsvpStatus::Maybe,
                phone: Some("12345".into()),
            }
        );
    }

    #[test]
    fn update_keeps_last_non_empty_phone() {
        let alice = existing_rsvp(7, "Alice", Some("12345"), RsvpStatus::In);

        // Empty or missing phone never clobbers the stored one.
        let req = request("Alice", Some(""), RsvpStatus::In);
        let RsvpUpsert::Update { phone, .. } = resolve_upsert(Some(&alice), &req) else {
            panic!("expected update");
        };
        assert_eq!(phone.as_deref(), Some("12345"));

        // A non-empty phone replaces it.
        let req = request("Alice", Some("67890"), RsvpStatus::In);
        let RsvpUpsert::Update { phone, .. } = resolve_upsert(Some(&alice), &req) else {
            panic!("expected update");
        };
        assert_eq!(phone.as_deref(), Some("67890"));
    }

    #[test]
    fn insert_treats_empty_phone_as_absent() {
        let req = request("Bob", Some(""), RsvpStatus::In);
        assert_eq!(
            resolve_upsert(None, &req),
            RsvpUpsert::Insert {
                rsvp_status: RsvpStatus::In,
                phone: None,
            }
        );
    }

    #[test]
    fn rsvp_request_defaults_to_in() {
        let req: RsvpRequest = serde_json::from_str(r#"{"player_name": "Alice"}"#).unwrap();
        assert_eq!(req.player_name, "Alice");
        assert_eq!(req.rsvp_status, RsvpStatus::In);
        assert!(req.phone.is_none());

        let req: RsvpRequest =
            serde_json::from_str(r#"{"player_name": "Bob", "rsvp_status": "maybe"}"#).unwrap();
        assert_eq!(req.rsvp_status, RsvpStatus::Maybe);
    }
}
