//! Schedule generation: medications × days × dose times.

use chrono::NaiveDate;

use super::error::{check_range, ScheduleError, ScheduleWarning};
use super::types::{DoseInstance, GeneratedSchedule, MedicationSnapshot};
use crate::models::Medication;

/// Expand every active medication over `[range_start, range_end]`
/// (inclusive calendar days), clipped to the medication's own date range.
///
/// Output is sorted by `scheduled_at`, then `medication_id`. A medication
/// whose dose times contradict its frequency is skipped with a warning.
pub fn generate_schedule(
    medications: &[Medication],
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Result<GeneratedSchedule, ScheduleError> {
    check_range(range_start, range_end)?;

    let mut instances = Vec::new();
    let mut warnings = Vec::new();

    for med in medications.iter().filter(|m| m.is_active()) {
        if let Err(reason) = med.validate() {
            tracing::warn!(medication_id = %med.id, %reason, "Skipping medication with invalid schedule");
            warnings.push(ScheduleWarning::InvalidMedication {
                medication_id: med.id,
                reason,
            });
            continue;
        }

        let first = range_start.max(med.start_date);
        let last = med.end_date.map_or(range_end, |end| end.min(range_end));
        if first > last {
            continue;
        }

        let snapshot = MedicationSnapshot::from(med);
        for day in first.iter_days().take_while(|d| *d <= last) {
            for dose_time in &med.dose_times {
                instances.push(DoseInstance::scheduled(
                    med.id,
                    day,
                    *dose_time,
                    snapshot.clone(),
                ));
            }
        }
    }

    // sort_by is stable: equal keys keep input order
    instances.sort_by(|a, b| {
        a.scheduled_at
            .cmp(&b.scheduled_at)
            .then_with(|| a.medication_id.cmp(&b.medication_id))
    });

    tracing::debug!(
        instances = instances.len(),
        skipped = warnings.len(),
        %range_start,
        %range_end,
        "Generated dose schedule"
    );

    Ok(GeneratedSchedule { instances, warnings })
}

/// Single-day convenience wrapper.
pub fn generate_for_day(medications: &[Medication], day: NaiveDate) -> GeneratedSchedule {
    // A one-day range can never be inverted.
    generate_schedule(medications, day, day).unwrap_or_default()
}
