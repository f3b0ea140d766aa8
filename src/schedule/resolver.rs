//! Dose status resolution: event log + clock + grace window → status.
//!
//! Precedence, per instance:
//! 1. A recorded event for the instance key wins (latest timestamp).
//! 2. Otherwise `upcoming` before the scheduled time,
//!    `due` inside the grace window, `missed` after it.
//!
//! Inferred misses are returned in `newly_missed` for the caller to
//! persist. Once those events are folded back into the log the next call
//! reports them as recorded misses, so nothing is synthesized twice.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};

use super::error::ScheduleWarning;
use super::types::{DoseInstance, DoseStatus, Resolution};
use crate::models::{DoseEvent, DoseKey};

pub fn resolve(
    instances: &[DoseInstance],
    events: &[DoseEvent],
    now: NaiveDateTime,
    grace_period_minutes: u32,
) -> Resolution {
    let grace = Duration::minutes(i64::from(grace_period_minutes));
    let (latest, warnings) = latest_events(events);

    let mut resolved = Vec::with_capacity(instances.len());
    let mut newly_missed = Vec::new();

    for instance in instances {
        let mut instance = instance.clone();
        let deadline = instance.scheduled_at.checked_add_signed(grace);
        instance.status = match latest.get(&instance.key()) {
            Some(event) => event.status.into(),
            None if now < instance.scheduled_at => DoseStatus::Upcoming,
            // A deadline past chrono's range never closes
            None if deadline.map_or(true, |d| now < d) => DoseStatus::Due,
            None => {
                newly_missed.push(DoseInstance {
                    status: DoseStatus::Missed,
                    ..instance.clone()
                });
                DoseStatus::Missed
            }
        };
        resolved.push(instance);
    }

    tracing::debug!(
        instances = resolved.len(),
        events = events.len(),
        newly_missed = newly_missed.len(),
        ignored_events = warnings.len(),
        "Resolved dose statuses"
    );

    Resolution {
        resolved,
        newly_missed,
        warnings,
    }
}

/// Last-write-wins index over the log. Equal timestamps keep the entry
/// that appears later in the slice.
fn latest_events(events: &[DoseEvent]) -> (HashMap<DoseKey, &DoseEvent>, Vec<ScheduleWarning>) {
    let mut latest: HashMap<DoseKey, &DoseEvent> = HashMap::new();
    let mut warnings = Vec::new();

    for event in events {
        if let Some(reason) = malformed_reason(event) {
            tracing::warn!(event_id = %event.id, reason, "Ignoring malformed dose event");
            warnings.push(ScheduleWarning::MalformedEvent {
                event_id: event.id,
                reason: reason.into(),
            });
            continue;
        }

        latest
            .entry(event.key())
            .and_modify(|current| {
                if event.timestamp >= current.timestamp {
                    *current = event;
                }
            })
            .or_insert(event);
    }

    (latest, warnings)
}

/// The event that decides `key`'s status under the same last-write-wins
/// rule `resolve` applies.
pub fn authoritative_event<'a>(events: &'a [DoseEvent], key: &DoseKey) -> Option<&'a DoseEvent> {
    events
        .iter()
        .filter(|e| malformed_reason(e).is_none() && e.key() == *key)
        .fold(None, |best, event| match best {
            Some(current) if event.timestamp < current.timestamp => Some(current),
            _ => Some(event),
        })
}

fn malformed_reason(event: &DoseEvent) -> Option<&'static str> {
    if event.medication_id.is_nil() {
        Some("missing medication id")
    } else if event.user_id.trim().is_empty() {
        Some("missing user id")
    } else {
        None
    }
}
