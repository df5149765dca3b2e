//! Cost-split engine: pure derivations over a session's RSVP set.
//!
//! Rounding policy: the per-head share is the ceiling of turf_cost over the
//! confirmed count, so the total collectible is at least the turf cost and
//! the overshoot is strictly less than the number of confirmed players.

use crate::models::rsvp::{Rsvp, RsvpStatus};

/// Integer ceiling division, ceil(a/b) = -floor(-a/b).
pub fn ceil_div(a: i64, b: i64) -> i64 {
    -((-a).div_euclid(b))
}

pub fn count_with_status(rsvps: &[Rsvp], status: RsvpStatus) -> usize {
    rsvps.iter().filter(|r| r.rsvp_status == status).count()
}

/// Display per-head value: the frozen split once the session is locked,
/// otherwise a live preview over the current confirmed set, falling back to
/// the full turf cost when nobody has confirmed.
pub fn per_head_cost(stored: Option<i64>, turf_cost: i64, rsvps: &[Rsvp]) -> i64 {
    if let Some(v) = stored {
        return v;
    }
    match count_with_status(rsvps, RsvpStatus::In) {
        0 => turf_cost,
        n => ceil_div(turf_cost, n as i64),
    }
}

/// Sum of amount_due over RSVPs that have paid (online or cash). An RSVP
/// with no amount stamped contributes zero.
pub fn collected(rsvps: &[Rsvp]) -> i64 {
    rsvps
        .iter()
        .filter(|r| r.payment_status.is_paid())
        .map(|r| r.amount_due.unwrap_or(0))
        .sum()
}
