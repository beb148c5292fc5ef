//! Enrollment poller scenario tests

mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::StubDevice;
use fingerdoor::device::EnrollStatusReport;
use fingerdoor::enroll::board::ProgressBoard;
use fingerdoor::enroll::poller::Options;
use fingerdoor::enroll::{EnrollmentPoller, EnrollmentSession, EnrollmentStatus};
use fingerdoor::errors::DashboardError;

fn poller(stub: &Arc<StubDevice>) -> Arc<EnrollmentPoller> {
    Arc::new(EnrollmentPoller::new(stub.clone(), Options::default()))
}

/// Collects every progress callback
#[derive(Clone, Default)]
struct Recorder {
    seen: Arc<Mutex<Vec<EnrollmentSession>>>,
}

impl Recorder {
    fn callback(&self) -> impl Fn(&EnrollmentSession) + Send + Sync + 'static {
        let seen = self.seen.clone();
        move |session: &EnrollmentSession| seen.lock().unwrap().push(session.clone())
    }

    fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn last_status(&self) -> Option<EnrollmentStatus> {
        self.seen.lock().unwrap().last().map(|s| s.status)
    }
}

#[tokio::test(start_paused = true)]
async fn test_times_out_after_thirty_polls() {
    let stub = Arc::new(StubDevice::new());
    let poller = poller(&stub);
    let recorder = Recorder::default();

    let started = tokio::time::Instant::now();
    let err = poller
        .start("esp32-test", "7", recorder.callback())
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::Timeout(_)));
    assert_eq!(StubDevice::count(&stub.enroll_polls), 30);
    assert_eq!(started.elapsed(), Duration::from_secs(60));
    assert_eq!(recorder.last_status(), Some(EnrollmentStatus::TimedOut));
    assert!(!poller.is_polling("7"));

    // nothing keeps polling afterwards
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(StubDevice::count(&stub.enroll_polls), 30);
}

#[tokio::test(start_paused = true)]
async fn test_success_after_pending() {
    let stub = Arc::new(StubDevice::new());
    stub.queue_enroll(Ok(EnrollStatusReport::new("pending", Some("place finger"))));
    stub.queue_enroll(Ok(EnrollStatusReport::new("SUCCESS", None)));
    let poller = poller(&stub);
    let recorder = Recorder::default();

    let session = poller
        .start("esp32-test", "7", recorder.callback())
        .await
        .unwrap();

    assert_eq!(session.status, EnrollmentStatus::Success);
    assert_eq!(session.attempts_made, 2);
    assert_eq!(session.fingerprint_id.as_deref(), Some("fp-7-1"));
    assert_eq!(recorder.last_status(), Some(EnrollmentStatus::Success));
    assert_eq!(StubDevice::count(&stub.enroll_polls), 2);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_fingerprint_is_distinct() {
    let stub = Arc::new(StubDevice::new());
    stub.queue_enroll(Ok(EnrollStatusReport::new(
        "failed",
        Some("duplicate fingerprint detected"),
    )));
    let poller = poller(&stub);
    let recorder = Recorder::default();

    let err = poller
        .start("esp32-test", "7", recorder.callback())
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::DuplicateFingerprint(_)));
    assert_eq!(err.kind(), "duplicate_fingerprint");
    assert_eq!(StubDevice::count(&stub.enroll_polls), 1);
    assert_eq!(recorder.last_status(), Some(EnrollmentStatus::Failed));
}

#[tokio::test(start_paused = true)]
async fn test_generic_failure() {
    let stub = Arc::new(StubDevice::new());
    stub.queue_enroll(Ok(EnrollStatusReport::new("error", Some("sensor fault"))));
    let poller = poller(&stub);

    let err = poller
        .start("esp32-test", "7", |_: &EnrollmentSession| {})
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::EnrollmentFailed(ref m) if m == "sensor fault"));
}

#[tokio::test(start_paused = true)]
async fn test_start_failure_reports_failed() {
    let stub = Arc::new(StubDevice::new());
    stub.start_fails.store(true, Ordering::SeqCst);
    let poller = poller(&stub);
    let recorder = Recorder::default();

    let err = poller
        .start("esp32-test", "7", recorder.callback())
        .await
        .unwrap_err();

    assert!(matches!(err, DashboardError::Validation(_)));
    assert_eq!(recorder.len(), 1);
    assert_eq!(recorder.last_status(), Some(EnrollmentStatus::Failed));
    assert_eq!(StubDevice::count(&stub.enroll_polls), 0);
    assert_eq!(poller.active_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_transient_poll_error_keeps_polling() {
    let stub = Arc::new(StubDevice::new());
    stub.queue_enroll(Err(DashboardError::Connectivity("timeout".to_string())));
    stub.queue_enroll(Ok(EnrollStatusReport::new("ok", None)));
    let poller = poller(&stub);

    let session = poller
        .start("esp32-test", "7", |_: &EnrollmentSession| {})
        .await
        .unwrap();
    assert_eq!(session.attempts_made, 2);
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_poll_error_fails() {
    let stub = Arc::new(StubDevice::new());
    stub.queue_enroll(Err(DashboardError::NotFound("fingerprint".to_string())));
    let poller = poller(&stub);
    let recorder = Recorder::default();

    let err = poller
        .start("esp32-test", "7", recorder.callback())
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::NotFound(_)));
    assert_eq!(recorder.last_status(), Some(EnrollmentStatus::Failed));
}

#[tokio::test(start_paused = true)]
async fn test_second_start_replaces_first() {
    let stub = Arc::new(StubDevice::new());
    let poller = poller(&stub);
    let first = Recorder::default();
    let second = Recorder::default();

    let first_task = tokio::spawn({
        let poller = poller.clone();
        let callback = first.callback();
        async move { poller.start("esp32-test", "7", callback).await }
    });
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(poller.is_polling("7"));
    let first_seen = first.len();
    assert!(first_seen > 1);

    let second_task = tokio::spawn({
        let poller = poller.clone();
        let callback = second.callback();
        async move { poller.start("esp32-test", "7", callback).await }
    });

    let first_result = first_task.await.unwrap();
    assert!(matches!(first_result, Err(DashboardError::Cancelled)));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(first.len(), first_seen);
    assert!(second.len() > 1);
    assert_eq!(poller.active_count(), 1);

    assert!(poller.cancel("7"));
    let second_result = second_task.await.unwrap();
    assert!(matches!(second_result, Err(DashboardError::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn test_conflict_when_replacement_disabled() {
    let stub = Arc::new(StubDevice::new());
    let poller = Arc::new(EnrollmentPoller::new(
        stub.clone(),
        Options {
            replace_active: false,
            ..Default::default()
        },
    ));

    let running = tokio::spawn({
        let poller = poller.clone();
        async move { poller.start("esp32-test", "7", |_: &EnrollmentSession| {}).await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;

    let err = poller
        .start("esp32-test", "7", |_: &EnrollmentSession| {})
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::Conflict(_)));
    assert!(poller.is_polling("7"));

    poller.cancel("7");
    assert!(matches!(running.await.unwrap(), Err(DashboardError::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_polling_without_callback() {
    let stub = Arc::new(StubDevice::new());
    let poller = poller(&stub);
    let recorder = Recorder::default();

    let task = tokio::spawn({
        let poller = poller.clone();
        let callback = recorder.callback();
        async move { poller.start("esp32-test", "7", callback).await }
    });
    tokio::time::sleep(Duration::from_secs(3)).await;
    let seen = recorder.len();
    let polls = StubDevice::count(&stub.enroll_polls);

    assert!(poller.cancel("7"));
    assert!(!poller.cancel("7"));
    assert!(matches!(task.await.unwrap(), Err(DashboardError::Cancelled)));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(recorder.len(), seen);
    assert_eq!(StubDevice::count(&stub.enroll_polls), polls);
}

#[tokio::test(start_paused = true)]
async fn test_board_tracks_latest_session() {
    let stub = Arc::new(StubDevice::new());
    stub.queue_enroll(Ok(EnrollStatusReport::new(
        "failed",
        Some("fingerprint already exists"),
    )));
    let poller = poller(&stub);
    let board = Arc::new(ProgressBoard::new());

    let progress = board.clone();
    let result = poller
        .start("esp32-test", "9", move |s: &EnrollmentSession| progress.update(s))
        .await;
    board.finish("9", &result);

    let entry = board.get("9").unwrap();
    assert_eq!(entry.session.status, EnrollmentStatus::Failed);
    let failure = entry.failure.unwrap();
    assert_eq!(failure.kind, "duplicate_fingerprint");
}

#[tokio::test(start_paused = true)]
async fn test_claimed_session_is_cancellable_before_run() {
    let stub = Arc::new(StubDevice::new());
    let poller = poller(&stub);
    let recorder = Recorder::default();

    let ticket = poller.claim("esp32-test", "7").unwrap();
    assert_eq!(ticket.employee_id(), "7");
    assert!(poller.is_polling("7"));
    assert!(poller.cancel("7"));

    let err = poller.run(ticket, recorder.callback()).await.unwrap_err();
    assert!(matches!(err, DashboardError::Cancelled));
    assert_eq!(recorder.len(), 0);
    assert_eq!(StubDevice::count(&stub.start_calls), 0);
    assert!(!poller.is_polling("7"));
}
