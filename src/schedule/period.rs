//! Reporting periods for history and calendar views.

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Daily,
    Weekly,
    Monthly,
}

/// Inclusive calendar-day range of a given granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub kind: PeriodKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// The day, week or month containing `anchor`.
    pub fn containing(kind: PeriodKind, anchor: NaiveDate, week_start: Weekday) -> Self {
        let (start, end) = match kind {
            PeriodKind::Daily => (anchor, anchor),
            PeriodKind::Weekly => {
                let start = start_of_week(anchor, week_start);
                (start, start + Duration::days(6))
            }
            PeriodKind::Monthly => (start_of_month(anchor), end_of_month(anchor)),
        };
        Self { kind, start, end }
    }

    /// Move `steps` periods forward (negative = back).
    pub fn shift(&self, steps: i32, week_start: Weekday) -> Self {
        let anchor = match self.kind {
            PeriodKind::Daily => self.start.checked_add_signed(Duration::days(i64::from(steps))),
            PeriodKind::Weekly => self
                .start
                .checked_add_signed(Duration::weeks(i64::from(steps))),
            PeriodKind::Monthly => {
                let months = Months::new(steps.unsigned_abs());
                if steps >= 0 {
                    self.start.checked_add_months(months)
                } else {
                    self.start.checked_sub_months(months)
                }
            }
        };

        match anchor {
            Some(anchor) => Self::containing(self.kind, anchor, week_start),
            None => *self,
        }
    }
}

/// Whole weeks covering the month of `anchor`, as a month calendar renders it.
pub fn calendar_grid(anchor: NaiveDate, week_start: Weekday) -> (NaiveDate, NaiveDate) {
    let first = start_of_week(start_of_month(anchor), week_start);
    let last = start_of_week(end_of_month(anchor), week_start) + Duration::days(6);
    (first, last)
}

fn start_of_week(day: NaiveDate, week_start: Weekday) -> NaiveDate {
    let back = (7 + day.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    day - Duration::days(i64::from(back))
}

fn start_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn end_of_month(day: NaiveDate) -> NaiveDate {
    start_of_month(day)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(day)
}
