//! Dashboard refresh worker

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use openapi_client::models::{AttendanceRecord, DailyStatsRow, EmployeeRecord};

use crate::dashboard::snapshot::{attendance_rows, attendance_stats, ChartPoint, DashboardSnapshot};
use crate::door::DoorController;
use crate::errors::DashboardError;
use crate::http::client::HttpClient;

/// Dashboard poller options
#[derive(Debug, Clone)]
pub struct Options {
    /// Refresh interval
    pub interval: Duration,

    /// Check-ins after this time count as late
    pub late_after: NaiveTime,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            late_after: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
        }
    }
}

/// Read-only data sources behind the dashboard
#[async_trait]
pub trait DashboardFeed: Send + Sync {
    async fn employees(&self) -> Result<Vec<EmployeeRecord>, DashboardError>;

    async fn daily_attendance(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, DashboardError>;

    async fn chart_stats(&self) -> Result<Vec<DailyStatsRow>, DashboardError>;
}

#[async_trait]
impl DashboardFeed for HttpClient {
    async fn employees(&self) -> Result<Vec<EmployeeRecord>, DashboardError> {
        self.get_employees().await
    }

    async fn daily_attendance(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, DashboardError> {
        self.get_daily_attendance(date).await
    }

    async fn chart_stats(&self) -> Result<Vec<DailyStatsRow>, DashboardError> {
        self.get_dashboard_stats().await
    }
}

/// Run one refresh tick. Every source is fetched independently; a failing
/// source keeps its previous data and records its error.
pub async fn refresh_once(
    options: &Options,
    door: &DoorController,
    feed: &dyn DashboardFeed,
    store: &watch::Sender<DashboardSnapshot>,
) {
    let today = Utc::now().date_naive();
    let (door_snapshot, employees, attendance, chart) = futures::join!(
        door.refresh_status(),
        feed.employees(),
        feed.daily_attendance(today),
        feed.chart_stats(),
    );

    store.send_modify(|snapshot| {
        snapshot.door = Some(door_snapshot);

        match employees {
            Ok(employees) => {
                snapshot.employees = employees;
                snapshot.errors.employees = None;
            }
            Err(e) => {
                warn!("Dashboard employees fetch failed: {}", e);
                snapshot.errors.employees = Some(e.to_string());
            }
        }

        match attendance {
            Ok(records) => {
                snapshot.attendance =
                    attendance_rows(&records, &snapshot.employees, today, options.late_after);
                snapshot.errors.attendance = None;
            }
            Err(e) => {
                warn!("Dashboard attendance fetch failed: {}", e);
                snapshot.errors.attendance = Some(e.to_string());
            }
        }

        match chart {
            Ok(rows) => {
                snapshot.chart = rows.iter().map(ChartPoint::from).collect();
                snapshot.errors.chart = None;
            }
            Err(e) => {
                warn!("Dashboard chart fetch failed: {}", e);
                snapshot.errors.chart = Some(e.to_string());
            }
        }

        snapshot.stats = attendance_stats(snapshot.employees.len(), &snapshot.attendance);
        snapshot.refreshed_at = Some(Utc::now());
        snapshot.ticks += 1;
    });
}

/// Run the dashboard poller worker: one tick immediately, then one per interval
pub async fn run<S, F>(
    options: &Options,
    door: &DoorController,
    feed: &dyn DashboardFeed,
    store: &watch::Sender<DashboardSnapshot>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Dashboard poller starting...");

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Dashboard poller shutting down...");
                return;
            }
            _ = refresh_once(options, door, feed, store) => {
                debug!("Dashboard refreshed");
            }
        }

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Dashboard poller shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {}
        }
    }
}

/// Owns a running dashboard poller. [`stop`](Self::stop) ends it; dropping
/// the handle aborts it.
pub struct DashboardPoller {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    snapshots: watch::Receiver<DashboardSnapshot>,
}

impl DashboardPoller {
    /// Spawn the worker
    pub fn start(
        options: Options,
        door: Arc<DoorController>,
        feed: Arc<dyn DashboardFeed>,
    ) -> Self {
        let (store, snapshots) = watch::channel(DashboardSnapshot::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            run(
                &options,
                door.as_ref(),
                feed.as_ref(),
                &store,
                tokio::time::sleep,
                Box::pin(async move {
                    let _ = shutdown_rx.await;
                }),
            )
            .await;
        });

        Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
            snapshots,
        }
    }

    /// Subscribe to snapshot updates
    pub fn snapshots(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }

    pub fn latest(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Signal shutdown and wait for the worker to exit
    pub async fn stop(&mut self) -> Result<(), DashboardError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle
                .await
                .map_err(|e| DashboardError::Shutdown(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for DashboardPoller {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
