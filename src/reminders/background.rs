//! Background reminder poller: periodic "today" refresh.
//!
//! Spawns a thread that resolves today's schedule right away and then
//! once per poll interval. Each pass persists newly inferred misses and
//! hands the report to a callback (notification layer, UI refresh).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;

use super::{ReminderService, TodayReport};
use crate::config::ScheduleConfig;
use crate::db::{DoseEventRepository, MedicationRepository, RenewalRepository};

/// Sleep granularity for shutdown responsiveness.
const SLEEP_GRANULARITY_MILLIS: u64 = 200;

pub type TickCallback = Box<dyn Fn(&TodayReport) + Send>;

/// Handle for the poller thread. Dropping it stops and joins the thread.
pub struct ReminderPollerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ReminderPollerHandle {
    /// Request shutdown. A pass already in progress completes first.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for ReminderPollerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Start polling on a dedicated thread that owns `store`.
pub fn start_reminder_poller<S>(
    store: S,
    user_id: String,
    config: ScheduleConfig,
    on_tick: TickCallback,
) -> ReminderPollerHandle
where
    S: MedicationRepository + DoseEventRepository + RenewalRepository + 'static,
{
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    let handle = std::thread::spawn(move || {
        tracing::info!(
            user_id = %user_id,
            interval_secs = config.poll_interval_secs,
            "Reminder poller started"
        );
        let interval = Duration::from_secs(config.poll_interval_secs.max(1));
        let service = ReminderService::new(&store, &store, &store, config);
        poller_loop(&service, &user_id, interval, &on_tick, &flag);
        tracing::info!("Reminder poller shutting down");
    });

    ReminderPollerHandle {
        shutdown,
        handle: Some(handle),
    }
}

fn poller_loop(
    service: &ReminderService<'_>,
    user_id: &str,
    interval: Duration,
    on_tick: &TickCallback,
    shutdown: &AtomicBool,
) {
    let granularity = Duration::from_millis(SLEEP_GRANULARITY_MILLIS);

    while !shutdown.load(Ordering::Relaxed) {
        match service.today(user_id, Local::now().naive_local()) {
            Ok(report) => {
                for warning in &report.warnings {
                    tracing::warn!(%warning, "Schedule warning");
                }
                on_tick(&report);
            }
            Err(e) => tracing::warn!(error = %e, "Reminder pass failed"),
        }

        // Sleep in small increments for responsive shutdown
        let mut slept = Duration::ZERO;
        while slept < interval {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            std::thread::sleep(granularity);
            slept += granularity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::medications::MedicationInput;
    use crate::models::enums::Frequency;
    use std::sync::mpsc;

    fn store_with_medication() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        let service = ReminderService::from_store(&store, ScheduleConfig::default());
        service
            .add_medication(
                "user-1",
                MedicationInput {
                    name: "Atorvastatin".into(),
                    dosage: "20mg".into(),
                    frequency: Frequency::Once,
                    dose_times: vec!["21:00".into()],
                    start_date: Local::now().date_naive() - chrono::Duration::days(3),
                    end_date: None,
                    instructions: None,
                    prescribed_by: None,
                    remaining_quantity: 30,
                    refill_threshold: None,
                },
            )
            .unwrap();
        store
    }

    #[test]
    fn first_pass_runs_immediately() {
        let (tx, rx) = mpsc::channel();
        let handle = start_reminder_poller(
            store_with_medication(),
            "user-1".into(),
            ScheduleConfig::default(),
            Box::new(move |report: &TodayReport| {
                let _ = tx.send(report.clone());
            }),
        );

        let report = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(report.schedule.total(), 1);
        assert!(report.warnings.is_empty());
        drop(handle);
    }

    #[test]
    fn shutdown_stops_thread() {
        let (tx, rx) = mpsc::channel();
        let handle = start_reminder_poller(
            store_with_medication(),
            "user-1".into(),
            ScheduleConfig {
                poll_interval_secs: 3600,
                ..ScheduleConfig::default()
            },
            Box::new(move |_: &TodayReport| {
                let _ = tx.send(());
            }),
        );

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        handle.shutdown();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !handle.is_finished() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(handle.is_finished());
        // One pass only: the hour-long wait was interrupted
        assert!(rx.try_recv().is_err());
    }
}
