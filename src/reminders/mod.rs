//! Reminder service: wires repositories into the schedule engine.
//!
//! Every read runs the same pipeline: active medications → generator →
//! events for the range → resolver. Only `today` writes inferred misses
//! back to the log; history and calendar views are read-only.

pub mod background;

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ScheduleConfig;
use crate::db::{
    DatabaseError, DoseEventRepository, MedicationRepository, RenewalRepository, SqliteStore,
};
use crate::medications::{MedicationInput, MedicationInputError};
use crate::models::enums::DoseEventStatus;
use crate::models::{DoseEvent, DoseTime, Medication, RenewalRequest};
use crate::renewal::{self, RenewalError};
use crate::schedule::{
    authoritative_event, calendar_grid, daily_summaries, generate_schedule, group_by_day,
    resolve, summarize, summarize_by_medication, AdherenceSummary, DoseInstance, Period,
    PeriodKind, Resolution, ScheduleError, ScheduleWarning, TodaySchedule,
};

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Invalid medication: {0}")]
    Medication(#[from] MedicationInputError),

    #[error("Renewal error: {0}")]
    Renewal(#[from] RenewalError),

    #[error("Medication not found: {0}")]
    MedicationNotFound(Uuid),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayReport {
    pub schedule: TodaySchedule,
    /// Misses inferred on this call and written to the log.
    pub newly_missed: Vec<DoseInstance>,
    pub warnings: Vec<ScheduleWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdherenceReport {
    pub period: Period,
    /// Neighbouring periods for history navigation.
    pub previous: Period,
    pub next: Period,
    pub summary: AdherenceSummary,
    /// Per-day breakdown, only days with scheduled doses.
    pub days: Vec<AdherenceSummary>,
    pub by_medication: BTreeMap<Uuid, AdherenceSummary>,
    pub warnings: Vec<ScheduleWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarMonth {
    pub grid_start: NaiveDate,
    pub grid_end: NaiveDate,
    pub days: BTreeMap<NaiveDate, Vec<DoseInstance>>,
    pub warnings: Vec<ScheduleWarning>,
}

pub struct ReminderService<'a> {
    medications: &'a dyn MedicationRepository,
    events: &'a dyn DoseEventRepository,
    renewals: &'a dyn RenewalRepository,
    config: ScheduleConfig,
}

impl<'a> ReminderService<'a> {
    pub fn new(
        medications: &'a dyn MedicationRepository,
        events: &'a dyn DoseEventRepository,
        renewals: &'a dyn RenewalRepository,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            medications,
            events,
            renewals,
            config,
        }
    }

    pub fn from_store(store: &'a SqliteStore, config: ScheduleConfig) -> Self {
        Self::new(store, store, store, config)
    }

    /// Resolve today's doses and persist any newly inferred misses.
    pub fn today(&self, user_id: &str, now: NaiveDateTime) -> Result<TodayReport, ReminderError> {
        let day = now.date();
        let (resolution, warnings) = self.resolve_range(user_id, day, day, now)?;

        for instance in &resolution.newly_missed {
            self.events.append(&instance.missed_event(user_id, now))?;
        }
        if !resolution.newly_missed.is_empty() {
            tracing::info!(
                user_id,
                count = resolution.newly_missed.len(),
                "Recorded missed doses"
            );
        }

        Ok(TodayReport {
            schedule: TodaySchedule::from_resolved(day, &resolution.resolved),
            newly_missed: resolution.newly_missed,
            warnings,
        })
    }

    /// Log a taken/skipped/missed action for one scheduled dose.
    ///
    /// A dose becoming taken consumes one unit of stock; a taken dose
    /// corrected to skipped or missed returns it. Repeating the current
    /// status leaves stock alone.
    #[allow(clippy::too_many_arguments)]
    pub fn record_dose(
        &self,
        user_id: &str,
        medication_id: Uuid,
        calendar_day: NaiveDate,
        dose_time: DoseTime,
        status: DoseEventStatus,
        now: NaiveDateTime,
        notes: Option<String>,
    ) -> Result<DoseEvent, ReminderError> {
        let medication = self.owned_medication(user_id, &medication_id)?;

        if !medication.dose_times.contains(&dose_time) {
            return Err(ReminderError::InvalidInput(format!(
                "{} is not a dose time of {}",
                dose_time, medication.name
            )));
        }
        if !medication.is_scheduled_on(calendar_day) {
            return Err(ReminderError::InvalidInput(format!(
                "{} is not scheduled on {calendar_day}",
                medication.name
            )));
        }

        let event = DoseEvent {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            medication_id,
            dose_time,
            scheduled_date: Some(calendar_day),
            timestamp: now,
            status,
            notes: notes.filter(|n| !n.trim().is_empty()),
        };

        // Stock follows the authoritative status, not the raw log
        let logged = self.events.list_in_range(user_id, calendar_day, calendar_day)?;
        let previous = authoritative_event(&logged, &event.key());
        let was_taken = previous.is_some_and(|e| e.status == DoseEventStatus::Taken);
        let supersedes = previous.map_or(true, |e| event.timestamp >= e.timestamp);
        let is_taken = if supersedes {
            status == DoseEventStatus::Taken
        } else {
            was_taken
        };
        let stock_delta = match (was_taken, is_taken) {
            (false, true) => -1,
            (true, false) => 1,
            _ => 0,
        };

        let remaining = self.events.append_with_stock_change(&event, stock_delta)?;
        if stock_delta < 0 && remaining <= medication.refill_threshold {
            tracing::info!(
                medication_id = %medication_id,
                remaining,
                "Medication at refill threshold"
            );
        }

        tracing::debug!(
            medication_id = %medication_id,
            day = %calendar_day,
            dose_time = %dose_time,
            status = %status,
            stock_delta,
            "Dose recorded"
        );
        Ok(event)
    }

    pub fn adherence(
        &self,
        user_id: &str,
        kind: PeriodKind,
        anchor: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<AdherenceReport, ReminderError> {
        let week_start = self.config.week_start;
        let period = Period::containing(kind, anchor, week_start);
        let (resolution, warnings) = self.resolve_range(user_id, period.start, period.end, now)?;
        let policy = self.config.empty_period_policy;

        Ok(AdherenceReport {
            period,
            previous: period.shift(-1, week_start),
            next: period.shift(1, week_start),
            summary: summarize(&resolution.resolved, period.start, period.end, policy)?,
            days: daily_summaries(&resolution.resolved, policy),
            by_medication: summarize_by_medication(
                &resolution.resolved,
                period.start,
                period.end,
                policy,
            )?,
            warnings,
        })
    }

    /// Resolved doses over the whole-week grid around `anchor`'s month.
    pub fn calendar(
        &self,
        user_id: &str,
        anchor: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<CalendarMonth, ReminderError> {
        let (grid_start, grid_end) = calendar_grid(anchor, self.config.week_start);
        let (resolution, warnings) = self.resolve_range(user_id, grid_start, grid_end, now)?;

        Ok(CalendarMonth {
            grid_start,
            grid_end,
            days: group_by_day(&resolution.resolved),
            warnings,
        })
    }

    pub fn renewal_candidates(&self, user_id: &str) -> Result<Vec<Medication>, ReminderError> {
        let medications = self.medications.list_active(user_id)?;
        Ok(renewal::renewal_candidates(&medications)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn request_renewal(
        &self,
        user_id: &str,
        medication_ids: &[Uuid],
        now: NaiveDateTime,
    ) -> Result<RenewalRequest, ReminderError> {
        let medications = self.medications.list_active(user_id)?;
        let request = renewal::build_request(user_id, &medications, medication_ids, now)?;

        self.renewals.insert_request(&request)?;
        for item in &request.items {
            self.medications
                .mark_renewal_requested(&item.medication_id, now)?;
        }

        tracing::info!(
            request_id = %request.id,
            items = request.items.len(),
            "Renewal requested"
        );
        Ok(request)
    }

    pub fn add_medication(
        &self,
        user_id: &str,
        input: MedicationInput,
    ) -> Result<Medication, ReminderError> {
        let medication = input.into_medication(user_id)?;
        self.medications.insert(&medication)?;
        tracing::info!(medication_id = %medication.id, "Medication added");
        Ok(medication)
    }

    /// Discontinue one of `user_id`'s medications. History is kept.
    pub fn deactivate_medication(
        &self,
        user_id: &str,
        medication_id: Uuid,
    ) -> Result<(), ReminderError> {
        self.owned_medication(user_id, &medication_id)?;
        self.medications.deactivate(&medication_id)?;
        tracing::info!(medication_id = %medication_id, "Medication deactivated");
        Ok(())
    }

    fn owned_medication(
        &self,
        user_id: &str,
        medication_id: &Uuid,
    ) -> Result<Medication, ReminderError> {
        self.medications
            .get(medication_id)?
            .filter(|m| m.user_id == user_id)
            .ok_or(ReminderError::MedicationNotFound(*medication_id))
    }

    /// Returned warnings cover both generation and resolution.
    fn resolve_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<(Resolution, Vec<ScheduleWarning>), ReminderError> {
        let medications = self.medications.list_active(user_id)?;
        let generated = generate_schedule(&medications, start, end)?;
        let events = self.events.list_in_range(user_id, start, end)?;

        let resolution = resolve(
            &generated.instances,
            &events,
            now,
            self.config.grace_period_minutes,
        );
        tracing::debug!(
            user_id,
            %start,
            %end,
            medications = medications.len(),
            instances = resolution.resolved.len(),
            events = events.len(),
            "Resolved dose schedule"
        );
        let mut warnings = generated.warnings;
        warnings.extend(resolution.warnings.iter().cloned());
        Ok((resolution, warnings))
    }
}
