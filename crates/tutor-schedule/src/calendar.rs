//! Tutor-owned availability: weekly windows and one-off time blocks.
//!
//! Every mutation is validated before it is stored, so whatever the resolver
//! reads from a [`TutorCalendar`] satisfies `start < end`. Windows may
//! overlap one another; time blocks may not.

use std::collections::BTreeMap;

use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{Result, ScheduleError};
use crate::model::{parse_timezone, AvailabilitySnapshot, AvailabilityWindow, BookedSession, TimeBlock};
use crate::overlap::Occupied;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WindowId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BlockId(pub u64);

#[derive(Debug, Clone)]
pub struct TutorCalendar {
    timezone: String,
    windows: BTreeMap<WindowId, AvailabilityWindow>,
    blocks: BTreeMap<BlockId, TimeBlock>,
    next_id: u64,
}

impl TutorCalendar {
    /// An empty calendar in the given IANA zone.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::InvalidTimezone`] if the zone is unknown.
    pub fn new(timezone: &str) -> Result<Self> {
        parse_timezone(timezone)?;
        Ok(Self {
            timezone: timezone.to_string(),
            windows: BTreeMap::new(),
            blocks: BTreeMap::new(),
            next_id: 1,
        })
    }

    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.timezone)
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// # Errors
    ///
    /// The window's own validation error (day of week, time range).
    pub fn add_window(&mut self, window: AvailabilityWindow) -> Result<WindowId> {
        window.validate()?;
        let id = WindowId(self.allocate());
        tracing::debug!(
            window_id = id.0,
            day_of_week = window.day_of_week,
            start = %window.start_time,
            end = %window.end_time,
            "added availability window"
        );
        self.windows.insert(id, window);
        Ok(id)
    }

    pub fn remove_window(&mut self, id: WindowId) -> Result<AvailabilityWindow> {
        self.windows
            .remove(&id)
            .ok_or_else(|| ScheduleError::NotFound(format!("availability window {}", id.0)))
    }

    /// Toggle a window without deleting it.
    pub fn set_window_active(&mut self, id: WindowId, active: bool) -> Result<()> {
        let window = self
            .windows
            .get_mut(&id)
            .ok_or_else(|| ScheduleError::NotFound(format!("availability window {}", id.0)))?;
        window.is_active = active;
        Ok(())
    }

    pub fn windows(&self) -> impl Iterator<Item = (WindowId, &AvailabilityWindow)> {
        self.windows.iter().map(|(id, w)| (*id, w))
    }

    /// # Errors
    ///
    /// [`ScheduleError::InvalidTimeRange`] for an empty or inverted block, or
    /// [`ScheduleError::TimeBlockOverlap`] if it overlaps an existing block.
    /// Overlapping blocks are rejected, never merged.
    pub fn add_time_block(&mut self, block: TimeBlock) -> Result<BlockId> {
        block.validate()?;
        let span = block.span();
        if let Some((existing, _)) = self.blocks.iter().find(|(_, b)| b.span().overlaps(&span)) {
            return Err(ScheduleError::TimeBlockOverlap(format!(
                "{} - {} overlaps time block {}",
                block.start_time.to_rfc3339(),
                block.end_time.to_rfc3339(),
                existing.0
            )));
        }
        let id = BlockId(self.allocate());
        tracing::debug!(block_id = id.0, start = %block.start_time, end = %block.end_time, "added time block");
        self.blocks.insert(id, block);
        Ok(id)
    }

    pub fn remove_time_block(&mut self, id: BlockId) -> Result<TimeBlock> {
        self.blocks
            .remove(&id)
            .ok_or_else(|| ScheduleError::NotFound(format!("time block {}", id.0)))
    }

    pub fn time_blocks(&self) -> impl Iterator<Item = (BlockId, &TimeBlock)> {
        self.blocks.iter().map(|(id, b)| (*id, b))
    }

    /// The resolver's view of this calendar plus the given bookings.
    pub fn snapshot(&self, booked: Vec<BookedSession>) -> AvailabilitySnapshot {
        AvailabilitySnapshot {
            timezone: Some(self.timezone.clone()),
            availability: self.windows.values().cloned().collect(),
            booked,
            time_blocks: self.blocks.values().cloned().collect(),
        }
    }
}
