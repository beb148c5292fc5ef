//! Dashboard poller scenario tests

mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use tokio::sync::watch;
use tokio::time::Instant;

use common::StubDevice;
use fingerdoor::dashboard::poller::{refresh_once, run, Options};
use fingerdoor::dashboard::{DashboardFeed, DashboardPoller, DashboardSnapshot};
use fingerdoor::door::{DoorController, DoorState};
use fingerdoor::errors::DashboardError;
use openapi_client::models::{AttendanceRecord, DailyStatsRow, EmployeeRecord};

#[derive(Default)]
struct FakeFeed {
    attendance_fails: AtomicBool,
    chart_calls: AtomicUsize,
    chart_times: Mutex<Vec<Instant>>,
}

#[async_trait]
impl DashboardFeed for FakeFeed {
    async fn employees(&self) -> Result<Vec<EmployeeRecord>, DashboardError> {
        Ok((1..=4)
            .map(|id| EmployeeRecord {
                id: json!(id),
                emp_code: Some(format!("NV{:03}", id)),
                full_name: Some(format!("Employee {}", id)),
                position: None,
                active: Some(true),
            })
            .collect())
    }

    async fn daily_attendance(
        &self,
        _date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, DashboardError> {
        if self.attendance_fails.load(Ordering::SeqCst) {
            return Err(DashboardError::Connectivity("backend down".to_string()));
        }
        Ok(vec![
            AttendanceRecord {
                employee_id: json!(1),
                full_name: None,
                work_date: Some("2025-03-14".to_string()),
                check_in: Some("08:40:00".to_string()),
                check_out: None,
                created_at: None,
            },
            AttendanceRecord {
                employee_id: json!(2),
                full_name: None,
                work_date: Some("2025-03-14".to_string()),
                check_in: Some("09:05:00".to_string()),
                check_out: None,
                created_at: None,
            },
        ])
    }

    async fn chart_stats(&self) -> Result<Vec<DailyStatsRow>, DashboardError> {
        let n = self.chart_calls.fetch_add(1, Ordering::SeqCst) as u32 + 1;
        self.chart_times.lock().unwrap().push(Instant::now());
        Ok(vec![DailyStatsRow {
            date: "Mon".to_string(),
            on_time: n,
            late: 1,
            absent: 0,
        }])
    }
}

fn door(stub: &Arc<StubDevice>) -> Arc<DoorController> {
    Arc::new(DoorController::new(
        "esp32-test",
        stub.clone(),
        Default::default(),
    ))
}

#[tokio::test(start_paused = true)]
async fn test_failed_source_does_not_block_others() {
    let stub = Arc::new(StubDevice::new());
    let door = door(&stub);
    let feed = FakeFeed::default();
    let (store, snapshots) = watch::channel(DashboardSnapshot::default());
    let options = Options::default();

    refresh_once(&options, &door, &feed, &store).await;
    {
        let snapshot = snapshots.borrow();
        assert_eq!(snapshot.employee_count(), 4);
        assert_eq!(snapshot.attendance.len(), 2);
        assert_eq!(snapshot.stats.present, 2);
        assert_eq!(snapshot.stats.absent, 2);
        assert_eq!(snapshot.stats.late, 1);
        assert!(snapshot.errors.messages().is_empty());
    }

    feed.attendance_fails.store(true, Ordering::SeqCst);
    stub.report(Some(DoorState::Open));
    refresh_once(&options, &door, &feed, &store).await;

    let snapshot = snapshots.borrow();
    assert_eq!(snapshot.chart[0].present, 2);
    // previous rows are kept
    assert_eq!(snapshot.attendance.len(), 2);
    assert!(snapshot.errors.attendance.is_some());
    assert!(snapshot.errors.chart.is_none());
    assert_eq!(snapshot.door.as_ref().map(|d| d.state), Some(DoorState::Open));
    assert_eq!(snapshot.ticks, 2);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_follow_fixed_interval() {
    let stub = Arc::new(StubDevice::new());
    let feed = Arc::new(FakeFeed::default());
    feed.attendance_fails.store(true, Ordering::SeqCst);

    let mut poller = DashboardPoller::start(Options::default(), door(&stub), feed.clone());
    let mut snapshots = poller.snapshots();

    for _ in 0..3 {
        snapshots.changed().await.unwrap();
    }
    assert!(poller.is_running());

    let times = feed.chart_times.lock().unwrap().clone();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1] - times[0], Duration::from_secs(5));
    assert_eq!(times[2] - times[1], Duration::from_secs(5));

    let latest = poller.latest();
    assert_eq!(latest.chart[0].present, 3);
    assert!(latest.errors.attendance.is_some());

    poller.stop().await.unwrap();
    assert!(!poller.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_ticks() {
    let stub = Arc::new(StubDevice::new());
    let feed = Arc::new(FakeFeed::default());

    let mut poller = DashboardPoller::start(Options::default(), door(&stub), feed.clone());
    let mut snapshots = poller.snapshots();
    snapshots.changed().await.unwrap();

    poller.stop().await.unwrap();
    let calls = feed.chart_calls.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(feed.chart_calls.load(Ordering::SeqCst), calls);
}

#[tokio::test(start_paused = true)]
async fn test_run_uses_sleep_fn_and_shutdown() {
    let stub = Arc::new(StubDevice::new());
    let door = door(&stub);
    let feed = FakeFeed::default();
    let (store, snapshots) = watch::channel(DashboardSnapshot::default());
    let options = Options {
        interval: Duration::from_secs(7),
        ..Default::default()
    };

    let sleeps = Arc::new(Mutex::new(Vec::new()));
    let sleep_fn = {
        let sleeps = sleeps.clone();
        move |wait: Duration| {
            sleeps.lock().unwrap().push(wait);
            tokio::time::sleep(wait)
        }
    };

    run(
        &options,
        &door,
        &feed,
        &store,
        sleep_fn,
        Box::pin(tokio::time::sleep(Duration::from_secs(15))),
    )
    .await;

    // ticks at 0s, 7s and 14s, then shutdown at 15s
    assert_eq!(snapshots.borrow().ticks, 3);
    assert!(sleeps
        .lock()
        .unwrap()
        .iter()
        .all(|wait| *wait == Duration::from_secs(7)));
}
