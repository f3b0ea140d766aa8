//! Repository layer: the storage seams the reminder service depends on.
//!
//! Three traits define the boundaries:
//! - MedicationRepository: medication definitions and stock counts
//! - DoseEventRepository: the append-only dose log
//! - RenewalRepository: prescription renewal requests
//!
//! `SqliteStore` implements all three over a single connection.

mod dose_event;
mod medication;
mod renewal;

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use uuid::Uuid;

use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::models::{DoseEvent, Medication, RenewalRequest};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub trait MedicationRepository: Send {
    /// Active medications owned by `user_id`.
    fn list_active(&self, user_id: &str) -> Result<Vec<Medication>, DatabaseError>;

    /// Reduce the remaining stock, floored at zero. Returns the new count.
    fn decrement_quantity(&self, medication_id: &Uuid, amount: u32) -> Result<u32, DatabaseError>;

    fn insert(&self, medication: &Medication) -> Result<(), DatabaseError>;

    fn get(&self, medication_id: &Uuid) -> Result<Option<Medication>, DatabaseError>;

    /// Discontinue without deleting: history keeps referring to it.
    fn deactivate(&self, medication_id: &Uuid) -> Result<(), DatabaseError>;

    fn mark_renewal_requested(
        &self,
        medication_id: &Uuid,
        at: NaiveDateTime,
    ) -> Result<(), DatabaseError>;
}

pub trait DoseEventRepository: Send {
    /// Events whose calendar day falls in `[start, end]`, oldest first.
    fn list_in_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DoseEvent>, DatabaseError>;

    fn append(&self, event: &DoseEvent) -> Result<(), DatabaseError>;

    /// Append `event` and shift its medication's stock by `stock_delta`
    /// (floored at zero) as one unit. Returns the remaining quantity.
    fn append_with_stock_change(
        &self,
        event: &DoseEvent,
        stock_delta: i64,
    ) -> Result<u32, DatabaseError>;
}

pub trait RenewalRepository: Send {
    fn insert_request(&self, request: &RenewalRequest) -> Result<(), DatabaseError>;

    /// Most recent first.
    fn list_requests(&self, user_id: &str) -> Result<Vec<RenewalRequest>, DatabaseError>;
}

/// SQLite-backed store for medications, dose events and renewals.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: open_database(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: open_memory_database()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| DatabaseError::InvalidValue {
        field: field.into(),
        value: value.into(),
    })
}

pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| DatabaseError::InvalidValue {
        field: field.into(),
        value: value.into(),
    })
}

pub(crate) fn parse_datetime(field: &str, value: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).map_err(|_| {
        DatabaseError::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    })
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn format_datetime(at: NaiveDateTime) -> String {
    at.format(DATETIME_FORMAT).to_string()
}
