//! # tutor-schedule
//!
//! Availability resolution and recurring session planning for a tutoring
//! marketplace.
//!
//! Given a tutor's weekly availability windows, one-off time blocks and
//! existing bookings, this crate computes the bookable start times for a
//! date, expands a chosen start into a weekly or biweekly series, splits the
//! series into conflicting and free occurrences, and drives the decision of
//! what to commit.
//!
//! All computation is synchronous and takes "now" and the tutor's zone as
//! explicit inputs. Reads and writes go through [`SessionStore`].
//!
//! ## Modules
//!
//! - [`time_label`] — `ClockTime` and the shared 12-hour label parser
//! - [`overlap`] — Half-open interval overlap, shared by every conflict check
//! - [`model`] — Windows, time blocks, bookings, availability snapshots
//! - [`slots`] — Bookable start times for a date
//! - [`recurrence`] — Series expansion and conflict partitioning
//! - [`booking`] — The submit / confirm / cancel decision flow
//! - [`calendar`] — Validated window and time-block CRUD
//! - [`store`] — Persistence boundary
//! - [`memory`] — In-process store with conditional inserts
//! - [`config`] — Tunables
//! - [`error`] — Error types

pub mod booking;
pub mod calendar;
pub mod config;
pub mod error;
pub mod memory;
pub mod model;
pub mod overlap;
pub mod recurrence;
pub mod slots;
pub mod store;
pub mod time_label;

pub use booking::{AbortReason, BookingFlow, BookingRequest, BookingState, CommitOutcome, Phase};
pub use calendar::{BlockId, TutorCalendar, WindowId};
pub use config::SchedulingConfig;
pub use error::{Result, ScheduleError};
pub use memory::{InMemoryStore, StoredSession};
pub use model::{AvailabilitySnapshot, AvailabilityWindow, BookedSession, TimeBlock};
pub use overlap::{overlaps, Occupied, Span};
pub use recurrence::{
    partition_by_conflict, plan_recurrence, ConflictSet, Frequency, Occurrence, RecurrencePlan,
    Resolution, MAX_OCCURRENCES,
};
pub use slots::{compute_available_slots, compute_available_slots_with_step, slots_for_snapshot, AvailableSlot};
pub use store::{BatchOutcome, NewSession, RecurringSessions, SessionId, SessionStore};
pub use time_label::{format_time_label, parse_time_label, ClockTime};
