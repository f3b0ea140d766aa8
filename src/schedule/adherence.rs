//! Adherence aggregation over resolved dose instances.
//!
//! Only terminal doses count toward the rate. Upcoming and due doses are
//! reported in `pending_count` but never penalize the user.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;

use super::error::{check_range, ScheduleError};
use super::types::{AdherenceSummary, DoseInstance, DoseStatus, EmptyPeriodPolicy};

/// Summarize instances whose calendar day falls in `[period_start, period_end]`.
pub fn summarize(
    resolved: &[DoseInstance],
    period_start: NaiveDate,
    period_end: NaiveDate,
    policy: EmptyPeriodPolicy,
) -> Result<AdherenceSummary, ScheduleError> {
    check_range(period_start, period_end)?;

    let in_period = resolved
        .iter()
        .filter(|i| i.calendar_day >= period_start && i.calendar_day <= period_end);

    Ok(tally(period_start, period_end, in_period, policy))
}

/// Group by calendar day, ascending.
pub fn group_by_day(resolved: &[DoseInstance]) -> BTreeMap<NaiveDate, Vec<DoseInstance>> {
    let mut days: BTreeMap<NaiveDate, Vec<DoseInstance>> = BTreeMap::new();
    for instance in resolved {
        days.entry(instance.calendar_day)
            .or_default()
            .push(instance.clone());
    }
    days
}

/// One summary per day that has at least one instance.
pub fn daily_summaries(
    resolved: &[DoseInstance],
    policy: EmptyPeriodPolicy,
) -> Vec<AdherenceSummary> {
    group_by_day(resolved)
        .into_iter()
        .map(|(day, instances)| tally(day, day, instances.iter(), policy))
        .collect()
}

/// Per-medication breakdown for a period (medication detail view).
pub fn summarize_by_medication(
    resolved: &[DoseInstance],
    period_start: NaiveDate,
    period_end: NaiveDate,
    policy: EmptyPeriodPolicy,
) -> Result<BTreeMap<Uuid, AdherenceSummary>, ScheduleError> {
    check_range(period_start, period_end)?;

    let mut by_med: BTreeMap<Uuid, Vec<&DoseInstance>> = BTreeMap::new();
    for instance in resolved
        .iter()
        .filter(|i| i.calendar_day >= period_start && i.calendar_day <= period_end)
    {
        by_med.entry(instance.medication_id).or_default().push(instance);
    }

    Ok(by_med
        .into_iter()
        .map(|(id, instances)| {
            (
                id,
                tally(period_start, period_end, instances.into_iter(), policy),
            )
        })
        .collect())
}

fn tally<'a>(
    period_start: NaiveDate,
    period_end: NaiveDate,
    instances: impl Iterator<Item = &'a DoseInstance>,
    policy: EmptyPeriodPolicy,
) -> AdherenceSummary {
    let (mut taken, mut skipped, mut missed, mut pending) = (0u32, 0u32, 0u32, 0u32);
    for instance in instances {
        match instance.status {
            DoseStatus::Taken => taken += 1,
            DoseStatus::Skipped => skipped += 1,
            DoseStatus::Missed => missed += 1,
            DoseStatus::Upcoming | DoseStatus::Due => pending += 1,
        }
    }

    let total = taken + skipped + missed;
    AdherenceSummary {
        period_start,
        period_end,
        total_doses: total,
        taken_count: taken,
        skipped_count: skipped,
        missed_count: missed,
        pending_count: pending,
        adherence_rate: rate(taken, total, policy),
    }
}

fn rate(taken: u32, total: u32, policy: EmptyPeriodPolicy) -> u32 {
    if total == 0 {
        return policy.rate();
    }
    (f64::from(taken) / f64::from(total) * 100.0).round() as u32
}
