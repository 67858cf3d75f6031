//! The persistence boundary: fetching a tutor's calendar and committing sessions.
//!
//! Everything behind [`SessionStore`] is owned by the caller. The scheduling
//! core only reads through it before planning and writes through it after the
//! booking decision resolves.
//!
//! Implementations must re-check each insert against the live calendar.
//! Another booking can land between [`SessionStore::fetch_availability`] and a
//! commit, and the client-side conflict check will not have seen it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::model::AvailabilitySnapshot;

pub type SessionId = u64;

/// A single session to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub subscription_id: String,
    pub tutor_id: String,
    pub parent_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
}

/// A series of sessions to persist in one call, in series order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringSessions {
    pub subscription_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    pub tutor_id: String,
    pub parent_id: String,
    pub occurrences: Vec<DateTime<Utc>>,
    pub duration_minutes: u32,
}

/// Per-item result of a batch commit.
///
/// A batch whose items partly fail is still a success at the call level. The
/// succeeded subset stays booked; nothing is retried or rolled back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub total_booked: usize,
    pub total_failed: usize,
    pub session_ids: Vec<SessionId>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.total_failed == 0
    }
}

pub trait SessionStore {
    /// Current windows, bookings and time blocks for a tutor. Must not be
    /// served from a cache shared with an earlier request.
    fn fetch_availability(&self, tutor_id: &str) -> Result<AvailabilitySnapshot>;

    /// Persist one session if its time range is still free.
    ///
    /// # Errors
    ///
    /// Any rejection, including the slot having been taken since it was shown.
    fn create_session(&mut self, session: &NewSession) -> Result<SessionId>;

    /// Persist each occurrence that is still free.
    ///
    /// # Errors
    ///
    /// Only when the whole batch is rejected (unknown subscription or tutor).
    /// Individual occurrences that fail are counted in the outcome instead.
    fn create_recurring_sessions(&mut self, batch: &RecurringSessions) -> Result<BatchOutcome>;
}
