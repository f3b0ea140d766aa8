//! Today's reminder panel: resolved doses split into upcoming and past.

use chrono::NaiveDate;
use serde::Serialize;

use super::types::{DoseInstance, DoseStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodaySchedule {
    pub day: NaiveDate,
    /// Not yet scheduled, in time order.
    pub upcoming: Vec<DoseInstance>,
    /// Scheduled time has passed (due, taken, skipped or missed), in time order.
    pub past: Vec<DoseInstance>,
}

impl TodaySchedule {
    pub fn from_resolved(day: NaiveDate, resolved: &[DoseInstance]) -> Self {
        let (upcoming, past) = resolved
            .iter()
            .filter(|i| i.calendar_day == day)
            .cloned()
            .partition(|i| i.status == DoseStatus::Upcoming);

        Self { day, upcoming, past }
    }

    /// Doses waiting on a taken/skipped action from the user.
    pub fn awaiting_action(&self) -> impl Iterator<Item = &DoseInstance> {
        self.past.iter().filter(|i| i.status == DoseStatus::Due)
    }

    pub fn taken_count(&self) -> usize {
        self.past
            .iter()
            .filter(|i| i.status == DoseStatus::Taken)
            .count()
    }

    pub fn total(&self) -> usize {
        self.upcoming.len() + self.past.len()
    }

    /// Share of today's doses already taken, as a rounded percentage.
    pub fn progress_percent(&self) -> u32 {
        match self.total() {
            0 => 0,
            total => (self.taken_count() as f64 / total as f64 * 100.0).round() as u32,
        }
    }
}
