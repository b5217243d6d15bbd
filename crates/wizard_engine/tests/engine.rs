use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use pretty_assertions::assert_eq;
use wizard_engine::{
    ApiError, EngineEvent, EngineHandle, GradeClient, GradeEndpoint, GradeQuery, SubmitFile,
    SubmitRequest, SubmitResponse, Submitter,
};

const WAIT: Duration = Duration::from_secs(2);

struct SlowGrader {
    delay: Duration,
    grade: u32,
}

#[async_trait::async_trait]
impl GradeClient for SlowGrader {
    async fn grade(&self, _query: &GradeQuery) -> Result<u32, ApiError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.grade)
    }
}

#[derive(Default)]
struct RecordingSubmitter {
    seen: Mutex<Vec<SubmitRequest>>,
}

#[async_trait::async_trait]
impl Submitter for RecordingSubmitter {
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitResponse, ApiError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.seen.lock().unwrap().push(request);
        Ok(SubmitResponse {
            status: 201,
            ..SubmitResponse::default()
        })
    }
}

fn engine(grade_delay: Duration) -> (EngineHandle, wizard_engine::EngineEvents, Arc<RecordingSubmitter>) {
    let submitter = Arc::new(RecordingSubmitter::default());
    let (handle, events) = EngineHandle::with_clients(
        Arc::new(SlowGrader {
            delay: grade_delay,
            grade: 72,
        }),
        submitter.clone(),
    )
    .expect("engine");
    (handle, events, submitter)
}

fn query() -> GradeQuery {
    GradeQuery {
        endpoint: GradeEndpoint::JobPosting,
        params: vec![
            ("description".to_string(), "Answer phones".to_string()),
            ("location".to_string(), "Chicago".to_string()),
        ],
    }
}

fn request() -> SubmitRequest {
    SubmitRequest {
        path: "/api/jobs/".to_string(),
        fields: vec![("title".to_string(), "Receptionist".to_string())],
        files: vec![SubmitFile {
            name: "logo".to_string(),
            file_name: "logo.png".to_string(),
            mime: "image/png".to_string(),
            bytes: Bytes::from_static(b"png"),
        }],
    }
}

#[test]
fn restarted_timer_reports_only_the_latest_token() {
    let (handle, events, _) = engine(Duration::ZERO);
    handle.start_timer(0, 1, Duration::from_millis(100));
    handle.start_timer(0, 2, Duration::from_millis(100));

    assert_eq!(
        events.recv_timeout(WAIT),
        Some(EngineEvent::QuietPeriodElapsed { key: 0, token: 2 })
    );
    assert_eq!(events.recv_timeout(Duration::from_millis(300)), None);
}

#[test]
fn grade_result_is_reported_with_its_request_id() {
    let (handle, events, _) = engine(Duration::from_millis(10));
    handle.grade(7, query());
    assert_eq!(
        events.recv_timeout(WAIT),
        Some(EngineEvent::ScoreCompleted {
            request_id: 7,
            result: Ok(72),
        })
    );
}

#[test]
fn cancel_scoring_silences_timers_and_in_flight_requests() {
    let (handle, events, _) = engine(Duration::from_millis(200));
    handle.start_timer(0, 1, Duration::from_millis(100));
    handle.grade(1, query());
    handle.cancel_scoring();

    assert_eq!(events.recv_timeout(Duration::from_millis(500)), None);
}

#[test]
fn submission_is_not_tied_to_scoring() {
    let (handle, events, submitter) = engine(Duration::from_millis(500));
    handle.grade(1, query());
    handle.submit(request());
    handle.cancel_scoring();

    assert_eq!(
        events.recv_timeout(WAIT),
        Some(EngineEvent::SubmissionCompleted {
            result: Ok(SubmitResponse {
                status: 201,
                ..SubmitResponse::default()
            }),
        })
    );
    assert_eq!(submitter.seen.lock().unwrap().as_slice(), &[request()]);
}

#[test]
fn dropping_the_handle_stops_pending_work() {
    let (handle, events, _) = engine(Duration::from_millis(100));
    handle.start_timer(0, 1, Duration::from_millis(100));
    handle.grade(1, query());
    drop(handle);

    assert_eq!(events.recv_timeout(Duration::from_millis(400)), None);
}
