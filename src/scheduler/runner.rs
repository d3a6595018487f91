use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use utoipa::ToSchema;

use crate::notify::Dispatcher;
use crate::policy::PolicyEngine;
use crate::scheduler::location::NotificationEvent;
use crate::scheduler::storage::LocationStore;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler already running")]
    AlreadyRunning,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub enum SchedulerMode {
    Idle,
    Running { since: DateTime<Utc> },
}

/// Outcome of one scan over the notifiable locations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct TickReport {
    pub visited: usize,
    pub notified: usize,
    /// No qualifying pass, including when the oracle was unavailable.
    pub skipped: usize,
    /// Unusable lead time, unknown owner or undelivered mail.
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TickSummary {
    pub completed_at: DateTime<Utc>,
    pub report: TickReport,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SchedulerStatus {
    pub mode: SchedulerMode,
    pub last_tick: Option<TickSummary>,
}

#[derive(Debug)]
struct Shared {
    status: SchedulerStatus,
}

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// The collaborators one tick needs.
struct Scan {
    store: Arc<dyn LocationStore>,
    policy: PolicyEngine,
    dispatcher: Dispatcher,
}

impl Scan {
    async fn run(&self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();

        let locations = match self.store.list_notifiable_locations() {
            Ok(locations) => locations,
            Err(e) => {
                log::error!("Tick aborted, could not load locations: {}", e);
                return report;
            }
        };

        log::info!("Tick started at {} with {} locations", now, locations.len());

        for location in locations {
            report.visited += 1;

            let pass = match self.policy.evaluate(&location, now).await {
                Ok(Some(pass)) => pass,
                Ok(None) => {
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    log::warn!("Location {}: {}", location.id, e);
                    report.failed += 1;
                    continue;
                }
            };

            let recipient = match self.store.owner_email(&location) {
                Ok(recipient) => recipient,
                Err(e) => {
                    log::warn!("Location {}: {}", location.id, e);
                    report.failed += 1;
                    continue;
                }
            };

            let event = NotificationEvent {
                location,
                pass,
                recipient,
            };

            match self.dispatcher.dispatch(&event).await {
                Ok(()) => report.notified += 1,
                Err(e) => {
                    log::warn!(
                        "Location {}: alert for pass {} not delivered: {}",
                        event.location.id,
                        event.pass,
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "Tick finished: {} visited, {} notified, {} skipped, {} failed",
            report.visited,
            report.notified,
            report.skipped,
            report.failed
        );
        report
    }
}

/// Runs the location scan on a fixed interval in a background task.
pub struct NotificationScheduler {
    scan: Arc<Scan>,
    interval: Duration,
    run_on_start: bool,
    shared: Arc<StdMutex<Shared>>,
    worker: Option<WorkerHandle>,
}

impl NotificationScheduler {
    pub fn new(
        store: Arc<dyn LocationStore>,
        policy: PolicyEngine,
        dispatcher: Dispatcher,
        interval: Duration,
        run_on_start: bool,
    ) -> Self {
        Self {
            scan: Arc::new(Scan {
                store,
                policy,
                dispatcher,
            }),
            interval,
            run_on_start,
            shared: Arc::new(StdMutex::new(Shared {
                status: SchedulerStatus {
                    mode: SchedulerMode::Idle,
                    last_tick: None,
                },
            })),
            worker: None,
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        self.shared.lock().unwrap().status.clone()
    }

    /// Scan every notifiable location once.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> TickReport {
        let report = self.scan.run(now).await;
        record_tick(&self.shared, report);
        report
    }

    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.worker.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_scheduler_loop(
            self.scan.clone(),
            self.shared.clone(),
            self.interval,
            self.run_on_start,
            stop_rx,
        ));

        self.worker = Some(WorkerHandle { stop_tx, join });

        let mut locked = self.shared.lock().unwrap();
        locked.status.mode = SchedulerMode::Running { since: Utc::now() };
        log::info!("Scheduler started, interval {:?}", self.interval);
        Ok(())
    }

    /// Cancels future ticks and waits for an in-flight tick to finish.
    pub async fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            match worker.join.await {
                Ok(()) => log::info!("Scheduler stopped"),
                Err(e) => log::error!("Scheduler task ended abnormally: {}", e),
            }
        }
        let mut locked = self.shared.lock().unwrap();
        locked.status.mode = SchedulerMode::Idle;
    }
}

async fn run_scheduler_loop(
    scan: Arc<Scan>,
    shared: Arc<StdMutex<Shared>>,
    period: Duration,
    run_on_start: bool,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let now = Instant::now();
    let first = if run_on_start {
        now
    } else {
        now.checked_add(period).unwrap_or(now)
    };
    let mut ticker = interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let should_stop = tokio::select! {
            _ = ticker.tick() => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            break;
        }

        // Not raced against the stop signal, so shutdown waits for the tick.
        let report = scan.run(Utc::now()).await;
        record_tick(&shared, report);
    }

    let mut locked = shared.lock().unwrap();
    locked.status.mode = SchedulerMode::Idle;
}

fn record_tick(shared: &StdMutex<Shared>, report: TickReport) {
    let mut locked = shared.lock().unwrap();
    locked.status.last_tick = Some(TickSummary {
        completed_at: Utc::now(),
        report,
    });
}
