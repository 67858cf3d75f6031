//! An in-process [`SessionStore`].
//!
//! Inserts are conditional on the tutor's live calendar: a session is stored
//! only if its range overlaps no stored session and no time block for the
//! same tutor at the moment of the insert. Batches apply that check per
//! occurrence, so a batch can partly succeed.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::calendar::TutorCalendar;
use crate::error::{Result, ScheduleError};
use crate::model::{AvailabilitySnapshot, BookedSession};
use crate::overlap::{Occupied, Span};
use crate::store::{BatchOutcome, NewSession, RecurringSessions, SessionId, SessionStore};

/// A persisted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub id: SessionId,
    pub subscription_id: String,
    pub tutor_id: String,
    pub parent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: u32,
}

impl Occupied for StoredSession {
    fn span(&self) -> Span {
        Span::from_minutes(self.scheduled_at, self.duration_minutes)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    calendars: HashMap<String, TutorCalendar>,
    subscriptions: HashSet<String>,
    sessions: BTreeMap<SessionId, StoredSession>,
    next_id: SessionId,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tutor(&mut self, tutor_id: impl Into<String>, calendar: TutorCalendar) {
        self.calendars.insert(tutor_id.into(), calendar);
    }

    pub fn add_subscription(&mut self, subscription_id: impl Into<String>) {
        self.subscriptions.insert(subscription_id.into());
    }

    /// Mutable access for window and time-block CRUD.
    pub fn calendar_mut(&mut self, tutor_id: &str) -> Result<&mut TutorCalendar> {
        self.calendars
            .get_mut(tutor_id)
            .ok_or_else(|| ScheduleError::UnknownTutor(tutor_id.to_string()))
    }

    pub fn sessions(&self) -> impl Iterator<Item = &StoredSession> {
        self.sessions.values()
    }

    pub fn bookings_for(&self, tutor_id: &str) -> Vec<BookedSession> {
        self.sessions
            .values()
            .filter(|s| s.tutor_id == tutor_id)
            .map(|s| BookedSession {
                scheduled_at: s.scheduled_at,
                duration: s.duration_minutes,
            })
            .collect()
    }

    fn check_batch_target(&self, subscription_id: &str, tutor_id: &str) -> Result<()> {
        if !self.subscriptions.contains(subscription_id) {
            return Err(ScheduleError::InvalidSubscription(subscription_id.to_string()));
        }
        if !self.calendars.contains_key(tutor_id) {
            return Err(ScheduleError::UnknownTutor(tutor_id.to_string()));
        }
        Ok(())
    }

    /// Store `session` unless its range is taken for `session.tutor_id`.
    fn insert_if_free(&mut self, mut session: StoredSession) -> Result<SessionId> {
        if session.duration_minutes == 0 {
            return Err(ScheduleError::InvalidTimeRange(
                "session duration must be positive".to_string(),
            ));
        }
        let span = session.span();
        let calendar = self
            .calendars
            .get(&session.tutor_id)
            .ok_or_else(|| ScheduleError::UnknownTutor(session.tutor_id.clone()))?;

        let booked = self
            .sessions
            .values()
            .filter(|s| s.tutor_id == session.tutor_id)
            .any(|s| s.span().overlaps(&span));
        let blocked = calendar.time_blocks().any(|(_, b)| b.span().overlaps(&span));
        if booked || blocked {
            return Err(ScheduleError::SlotTaken(format!(
                "tutor {} is not free at {}",
                session.tutor_id,
                session.scheduled_at.to_rfc3339()
            )));
        }

        self.next_id += 1;
        session.id = self.next_id;
        let id = session.id;
        self.sessions.insert(id, session);
        Ok(id)
    }
}

impl SessionStore for InMemoryStore {
    fn fetch_availability(&self, tutor_id: &str) -> Result<AvailabilitySnapshot> {
        let calendar = self
            .calendars
            .get(tutor_id)
            .ok_or_else(|| ScheduleError::UnknownTutor(tutor_id.to_string()))?;
        Ok(calendar.snapshot(self.bookings_for(tutor_id)))
    }

    fn create_session(&mut self, session: &NewSession) -> Result<SessionId> {
        self.check_batch_target(&session.subscription_id, &session.tutor_id)?;
        let id = self.insert_if_free(StoredSession {
            id: 0,
            subscription_id: session.subscription_id.clone(),
            tutor_id: session.tutor_id.clone(),
            parent_id: session.parent_id.clone(),
            course_id: None,
            scheduled_at: session.scheduled_at,
            duration_minutes: session.duration_minutes,
        })?;
        tracing::info!(session_id = id, tutor_id = %session.tutor_id, scheduled_at = %session.scheduled_at, "created session");
        Ok(id)
    }

    fn create_recurring_sessions(&mut self, batch: &RecurringSessions) -> Result<BatchOutcome> {
        self.check_batch_target(&batch.subscription_id, &batch.tutor_id)?;
        if batch.occurrences.is_empty() {
            return Err(ScheduleError::InvalidRecurrence(
                "batch has no occurrences".to_string(),
            ));
        }

        let mut outcome = BatchOutcome::default();
        for &scheduled_at in &batch.occurrences {
            let result = self.insert_if_free(StoredSession {
                id: 0,
                subscription_id: batch.subscription_id.clone(),
                tutor_id: batch.tutor_id.clone(),
                parent_id: batch.parent_id.clone(),
                course_id: batch.course_id.clone(),
                scheduled_at,
                duration_minutes: batch.duration_minutes,
            });
            match result {
                Ok(id) => {
                    outcome.total_booked += 1;
                    outcome.session_ids.push(id);
                }
                Err(e) => {
                    tracing::warn!(tutor_id = %batch.tutor_id, %scheduled_at, error = %e, "occurrence rejected at commit");
                    outcome.total_failed += 1;
                }
            }
        }

        tracing::info!(
            tutor_id = %batch.tutor_id,
            total_booked = outcome.total_booked,
            total_failed = outcome.total_failed,
            "created recurring sessions"
        );
        Ok(outcome)
    }
}
