//! The booking decision flow.
//!
//! ```text
//! Idle ──submit──▶ Preview ──▶ NoConflict ──commit──▶ Committed
//!   │                  ├─────▶ AllConflict ─────────▶ Aborted
//!   │                  └─────▶ PartialConflict ─confirm─▶ Committed
//!   │                                   └──────cancel──▶ Aborted
//!   └──(single session)──commit──▶ Committed
//! ```
//!
//! A single session skips conflict analysis and goes straight to the store,
//! which re-checks the slot. A series is planned, partitioned against a fresh
//! read of the tutor's calendar, and then:
//!
//! - committed whole if nothing collides,
//! - aborted without touching the store if everything collides,
//! - held for an explicit [`BookingFlow::confirm`] or [`BookingFlow::cancel`]
//!   if only some occurrences collide.
//!
//! Nothing is written until the flow reaches a commit-eligible state, so
//! conflicting occurrences are never dropped without the user seeing them.
//! A store error on commit returns the flow to [`Phase::Idle`]; nothing was
//! written, so the request can be submitted again.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::SchedulingConfig;
use crate::error::{Result, ScheduleError};
use crate::recurrence::{
    partition_by_conflict, ConflictSet, Frequency, Occurrence, RecurrencePlan, Resolution,
};
use crate::store::{BatchOutcome, NewSession, RecurringSessions, SessionId, SessionStore};
use crate::time_label::parse_time_label;

/// What the user asked to book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub subscription_id: String,
    pub tutor_id: String,
    pub parent_id: String,
    pub course_id: Option<String>,
    /// First session's date in the tutor's zone.
    pub date: NaiveDate,
    /// 12-hour label as shown in the slot picker, e.g. `"2:00 PM"`.
    pub time_label: String,
    pub frequency: Frequency,
    pub count: u32,
    pub duration_minutes: u32,
}

/// The flow's position, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Idle,
    Preview,
    NoConflict,
    AllConflict,
    PartialConflict,
    Committed,
    Aborted,
}

impl From<Resolution> for Phase {
    fn from(r: Resolution) -> Self {
        match r {
            Resolution::NoConflict => Phase::NoConflict,
            Resolution::AllConflict => Phase::AllConflict,
            Resolution::PartialConflict => Phase::PartialConflict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CommitOutcome {
    Single {
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
    Batch(BatchOutcome),
}

impl CommitOutcome {
    pub fn total_booked(&self) -> usize {
        match self {
            CommitOutcome::Single { .. } => 1,
            CommitOutcome::Batch(b) => b.total_booked,
        }
    }

    pub fn total_failed(&self) -> usize {
        match self {
            CommitOutcome::Single { .. } => 0,
            CommitOutcome::Batch(b) => b.total_failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// Every occurrence collided; the user must choose another time.
    AllConflict(ConflictSet),
    /// The user declined to book the non-conflicting subset.
    Cancelled(ConflictSet),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingState {
    Idle,
    Preview(Vec<Occurrence>),
    NoConflict(ConflictSet),
    AllConflict(ConflictSet),
    PartialConflict(ConflictSet),
    Committed(CommitOutcome),
    Aborted(AbortReason),
}

impl BookingState {
    pub fn phase(&self) -> Phase {
        match self {
            BookingState::Idle => Phase::Idle,
            BookingState::Preview(_) => Phase::Preview,
            BookingState::NoConflict(_) => Phase::NoConflict,
            BookingState::AllConflict(_) => Phase::AllConflict,
            BookingState::PartialConflict(_) => Phase::PartialConflict,
            BookingState::Committed(_) => Phase::Committed,
            BookingState::Aborted(_) => Phase::Aborted,
        }
    }
}

#[derive(Debug)]
pub struct BookingFlow {
    request: BookingRequest,
    config: SchedulingConfig,
    state: BookingState,
    history: Vec<Phase>,
}

impl BookingFlow {
    pub fn new(request: BookingRequest, config: SchedulingConfig) -> Self {
        Self {
            request,
            config,
            state: BookingState::Idle,
            history: vec![Phase::Idle],
        }
    }

    pub fn request(&self) -> &BookingRequest {
        &self.request
    }

    pub fn state(&self) -> &BookingState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Every phase entered so far, in order.
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    fn enter(&mut self, state: BookingState) {
        let from = self.state.phase();
        let to = state.phase();
        tracing::debug!(tutor_id = %self.request.tutor_id, ?from, ?to, "booking transition");
        self.history.push(to);
        self.state = state;
    }

    fn expect_phase(&self, expected: Phase, action: &str) -> Result<()> {
        if self.phase() == expected {
            Ok(())
        } else {
            Err(ScheduleError::InvalidState(format!(
                "cannot {action} while {:?}",
                self.phase()
            )))
        }
    }

    /// Plan the request against a fresh read of the tutor's calendar and
    /// advance as far as possible without user input.
    ///
    /// # Errors
    ///
    /// - Validation errors (zero duration, time label, count bounds, timezone)
    ///   leave the flow in [`Phase::Idle`].
    /// - A store error during fetch or commit returns the flow to
    ///   [`Phase::Idle`] and is passed through unchanged.
    /// - [`ScheduleError::InvalidState`] if the flow is not idle.
    pub fn submit<S: SessionStore>(&mut self, store: &mut S) -> Result<&BookingState> {
        self.expect_phase(Phase::Idle, "submit")?;
        if self.request.duration_minutes == 0 {
            return Err(ScheduleError::InvalidTimeRange(
                "session duration must be positive".to_string(),
            ));
        }

        let base_time = parse_time_label(&self.request.time_label)?;
        let plan = RecurrencePlan::with_max(
            self.request.date,
            base_time,
            self.request.frequency,
            self.request.count,
            self.config.max_occurrences,
        )?;

        let snapshot = store.fetch_availability(&self.request.tutor_id)?;
        let tz = snapshot.timezone_or(&self.config.timezone)?;
        let occurrences = plan.expand(&tz);

        if !plan.is_recurring() {
            let Some(first) = occurrences.first() else {
                return Err(ScheduleError::InvalidRecurrence("empty plan".to_string()));
            };
            let session = NewSession {
                subscription_id: self.request.subscription_id.clone(),
                tutor_id: self.request.tutor_id.clone(),
                parent_id: self.request.parent_id.clone(),
                scheduled_at: first.start,
                duration_minutes: self.request.duration_minutes,
            };
            let session_id = self.commit(|s: &mut S| s.create_session(&session), store)?;
            self.enter(BookingState::Committed(CommitOutcome::Single { session_id }));
            return Ok(&self.state);
        }

        self.enter(BookingState::Preview(occurrences.clone()));
        let set = partition_by_conflict(
            &occurrences,
            &snapshot.occupied(),
            self.request.duration_minutes,
        );

        match set.resolution() {
            Resolution::NoConflict => {
                self.enter(BookingState::NoConflict(set.clone()));
                self.commit_batch(store, &set.valid_sessions)?;
            }
            Resolution::AllConflict => {
                self.enter(BookingState::AllConflict(set.clone()));
                tracing::info!(
                    tutor_id = %self.request.tutor_id,
                    conflicts = set.conflicts.len(),
                    "every occurrence conflicts; booking aborted"
                );
                self.enter(BookingState::Aborted(AbortReason::AllConflict(set)));
            }
            Resolution::PartialConflict => {
                self.enter(BookingState::PartialConflict(set));
            }
        }
        Ok(&self.state)
    }

    /// Book only the non-conflicting occurrences of a partial conflict.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::InvalidState`] unless the flow is at
    /// [`Phase::PartialConflict`]; otherwise any total store failure.
    pub fn confirm<S: SessionStore>(&mut self, store: &mut S) -> Result<&BookingState> {
        let BookingState::PartialConflict(set) = &self.state else {
            return Err(ScheduleError::InvalidState(format!(
                "cannot confirm while {:?}",
                self.phase()
            )));
        };
        let valid = set.valid_sessions.clone();
        self.commit_batch(store, &valid)?;
        Ok(&self.state)
    }

    /// Drop a partially conflicting plan without writing anything.
    pub fn cancel(&mut self) -> Result<&BookingState> {
        let BookingState::PartialConflict(set) = &self.state else {
            return Err(ScheduleError::InvalidState(format!(
                "cannot cancel while {:?}",
                self.phase()
            )));
        };
        let set = set.clone();
        self.enter(BookingState::Aborted(AbortReason::Cancelled(set)));
        Ok(&self.state)
    }

    fn commit_batch<S: SessionStore>(&mut self, store: &mut S, valid: &[Occurrence]) -> Result<()> {
        let batch = RecurringSessions {
            subscription_id: self.request.subscription_id.clone(),
            course_id: self.request.course_id.clone(),
            tutor_id: self.request.tutor_id.clone(),
            parent_id: self.request.parent_id.clone(),
            occurrences: valid.iter().map(|o| o.start).collect(),
            duration_minutes: self.request.duration_minutes,
        };
        let outcome = self.commit(|s: &mut S| s.create_recurring_sessions(&batch), store)?;
        if !outcome.is_complete() {
            tracing::warn!(
                tutor_id = %self.request.tutor_id,
                total_booked = outcome.total_booked,
                total_failed = outcome.total_failed,
                "recurring booking partly failed at commit"
            );
        }
        self.enter(BookingState::Committed(CommitOutcome::Batch(outcome)));
        Ok(())
    }

    /// Run a store write; on failure fall back to idle.
    fn commit<S, T, F>(&mut self, write: F, store: &mut S) -> Result<T>
    where
        S: SessionStore,
        F: FnOnce(&mut S) -> Result<T>,
    {
        match write(store) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(tutor_id = %self.request.tutor_id, error = %e, "commit failed");
                self.enter(BookingState::Idle);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::TutorCalendar;
    use crate::memory::InMemoryStore;
    use chrono::{DateTime, TimeZone, Utc};

    fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, h, 0, 0).unwrap()
    }

    fn store() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store.add_tutor("tutor-1", TutorCalendar::new("UTC").unwrap());
        store.add_subscription("sub-1");
        store
    }

    fn request(frequency: Frequency, count: u32) -> BookingRequest {
        BookingRequest {
            subscription_id: "sub-1".into(),
            tutor_id: "tutor-1".into(),
            parent_id: "parent-1".into(),
            course_id: None,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            time_label: "2:00 PM".into(),
            frequency,
            count,
            duration_minutes: 60,
        }
    }

    fn book(store: &mut InMemoryStore, at: DateTime<Utc>) {
        store
            .create_session(&NewSession {
                subscription_id: "sub-1".into(),
                tutor_id: "tutor-1".into(),
                parent_id: "other".into(),
                scheduled_at: at,
                duration_minutes: 60,
            })
            .unwrap();
    }

    #[test]
    fn test_single_session_commits_directly() {
        let mut store = store();
        let mut flow = BookingFlow::new(request(Frequency::Once, 1), SchedulingConfig::default());
        let state = flow.submit(&mut store).unwrap();
        assert!(matches!(state, BookingState::Committed(CommitOutcome::Single { .. })));
        assert_eq!(flow.history(), &[Phase::Idle, Phase::Committed]);
        assert_eq!(store.bookings_for("tutor-1")[0].scheduled_at, utc(2, 14));
    }

    #[test]
    fn test_single_session_failure_returns_to_idle() {
        let mut store = store();
        book(&mut store, utc(2, 14));
        let mut flow = BookingFlow::new(request(Frequency::Weekly, 1), SchedulingConfig::default());
        let err = flow.submit(&mut store).unwrap_err();
        assert!(matches!(err, ScheduleError::SlotTaken(_)));
        assert_eq!(flow.phase(), Phase::Idle);
    }

    #[test]
    fn test_no_conflict_commits_all() {
        let mut store = store();
        let mut flow = BookingFlow::new(request(Frequency::Weekly, 3), SchedulingConfig::default());
        let state = flow.submit(&mut store).unwrap();
        let BookingState::Committed(outcome) = state else {
            panic!("expected commit, got {state:?}");
        };
        assert_eq!(outcome.total_booked(), 3);
        assert_eq!(
            flow.history(),
            &[Phase::Idle, Phase::Preview, Phase::NoConflict, Phase::Committed]
        );
    }

    #[test]
    fn test_all_conflict_aborts_without_commit() {
        let mut store = store();
        book(&mut store, utc(2, 14));
        book(&mut store, utc(9, 14));
        let mut flow = BookingFlow::new(request(Frequency::Weekly, 2), SchedulingConfig::default());
        let state = flow.submit(&mut store).unwrap();
        assert!(matches!(state, BookingState::Aborted(AbortReason::AllConflict(_))));
        assert_eq!(
            flow.history(),
            &[Phase::Idle, Phase::Preview, Phase::AllConflict, Phase::Aborted]
        );
        assert_eq!(store.sessions().count(), 2);
    }

    #[test]
    fn test_partial_conflict_waits_then_confirms() {
        let mut store = store();
        book(&mut store, utc(9, 14));
        let mut flow = BookingFlow::new(request(Frequency::Weekly, 4), SchedulingConfig::default());
        let state = flow.submit(&mut store).unwrap();
        let BookingState::PartialConflict(set) = state else {
            panic!("expected partial conflict, got {state:?}");
        };
        assert_eq!(set.conflicts.len(), 1);
        assert_eq!(set.valid_sessions.len(), 3);
        assert_eq!(store.sessions().count(), 1);

        let state = flow.confirm(&mut store).unwrap();
        let BookingState::Committed(outcome) = state else {
            panic!("expected commit, got {state:?}");
        };
        assert_eq!(outcome.total_booked(), 3);
        assert_eq!(store.sessions().count(), 4);
    }

    #[test]
    fn test_partial_conflict_cancel_writes_nothing() {
        let mut store = store();
        book(&mut store, utc(9, 14));
        let mut flow = BookingFlow::new(request(Frequency::Weekly, 4), SchedulingConfig::default());
        flow.submit(&mut store).unwrap();
        let state = flow.cancel().unwrap();
        assert!(matches!(state, BookingState::Aborted(AbortReason::Cancelled(_))));
        assert_eq!(store.sessions().count(), 1);
    }

    #[test]
    fn test_confirm_and_cancel_only_from_partial_conflict() {
        let mut store = store();
        let mut flow = BookingFlow::new(request(Frequency::Weekly, 2), SchedulingConfig::default());
        assert!(matches!(flow.confirm(&mut store), Err(ScheduleError::InvalidState(_))));
        assert!(matches!(flow.cancel(), Err(ScheduleError::InvalidState(_))));
        flow.submit(&mut store).unwrap();
        assert!(matches!(flow.submit(&mut store), Err(ScheduleError::InvalidState(_))));
    }

    #[test]
    fn test_count_over_configured_max_rejected() {
        let mut store = store();
        let config = SchedulingConfig {
            max_occurrences: 4,
            ..Default::default()
        };
        let mut flow = BookingFlow::new(request(Frequency::Weekly, 5), config);
        let err = flow.submit(&mut store).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidRecurrence(_)));
        assert_eq!(flow.phase(), Phase::Idle);
        assert_eq!(store.sessions().count(), 0);
    }

    #[test]
    fn test_invalid_subscription_returns_to_idle() {
        let mut store = store();
        let mut req = request(Frequency::Weekly, 2);
        req.subscription_id = "expired".into();
        let mut flow = BookingFlow::new(req, SchedulingConfig::default());
        let err = flow.submit(&mut store).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidSubscription(_)));
        assert_eq!(flow.phase(), Phase::Idle);
        assert_eq!(
            flow.history(),
            &[Phase::Idle, Phase::Preview, Phase::NoConflict, Phase::Idle]
        );
    }

    #[test]
    fn test_zero_duration_rejected_before_planning() {
        let mut store = store();
        book(&mut store, utc(2, 14));
        let mut req = request(Frequency::Once, 1);
        req.duration_minutes = 0;
        let mut flow = BookingFlow::new(req, SchedulingConfig::default());
        let err = flow.submit(&mut store).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTimeRange(_)));
        assert_eq!(flow.history(), &[Phase::Idle]);
        assert_eq!(store.sessions().count(), 1);
    }

    #[test]
    fn test_config_max_above_hard_limit_does_not_raise_it() {
        let mut store = store();
        let config = SchedulingConfig {
            max_occurrences: 100,
            ..Default::default()
        };
        let mut flow = BookingFlow::new(request(Frequency::Weekly, 80), config);
        let err = flow.submit(&mut store).unwrap_err();
        assert!(err.to_string().contains("between 1 and 52"), "got: {err}");
        assert_eq!(flow.phase(), Phase::Idle);
        assert_eq!(store.sessions().count(), 0);
    }
}
