//! Dose Schedule Engine: pure computation over medications and the dose log.
//!
//! Three stages, leaves first:
//! - `generator`: expands frequency + dose times over a date range
//! - `resolver`: assigns upcoming/due/taken/skipped/missed from the event log
//! - `adherence`: counts and rates over a period, grouped by day
//!
//! `period` and `today` shape the output for history, calendar and
//! reminder views. Nothing here reads the clock or touches storage:
//! `now` is always a parameter and write-back belongs to the caller.

pub mod adherence;
pub mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod generator;
pub mod period;
pub mod resolver;
pub mod today;
pub mod types;

pub use adherence::{daily_summaries, group_by_day, summarize, summarize_by_medication};
pub use error::{ScheduleError, ScheduleWarning};
pub use generator::{generate_for_day, generate_schedule};
pub use period::{calendar_grid, Period, PeriodKind};
pub use resolver::{authoritative_event, resolve};
pub use today::TodaySchedule;
pub use types::*;
