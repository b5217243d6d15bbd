use std::time::Duration;

use bytes::Bytes;
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wizard_engine::{
    ApiSettings, FailureKind, GradeClient, GradeEndpoint, GradeQuery, ReqwestApi, SubmitFile,
    SubmitRequest, Submitter,
};

fn api_for(server: &MockServer) -> ReqwestApi {
    ReqwestApi::new(ApiSettings {
        base_url: server.uri(),
        ..ApiSettings::default()
    })
    .expect("client")
}

fn posting_query() -> GradeQuery {
    GradeQuery {
        endpoint: GradeEndpoint::JobPosting,
        params: vec![
            ("description".to_string(), "Answer phones".to_string()),
            ("location".to_string(), "Chicago".to_string()),
        ],
    }
}

#[tokio::test]
async fn grade_sends_both_fields_and_reads_the_grade() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/live-grade/"))
        .and(query_param("description", "Answer phones"))
        .and(query_param("location", "Chicago"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"grade": 72}"#))
        .expect(1)
        .mount(&server)
        .await;

    let grade = api_for(&server).grade(&posting_query()).await.expect("grade");
    assert_eq!(grade, 72);
}

#[tokio::test]
async fn grade_uses_the_application_endpoint_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/applications/live-grade/"))
        .and(query_param("resume_url", "https://cdn.example.com/cv.pdf"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"grade": 55.5}"#))
        .mount(&server)
        .await;

    let api = ReqwestApi::new(ApiSettings {
        base_url: format!("{}/", server.uri()),
        auth_token: Some("secret".to_string()),
        ..ApiSettings::default()
    })
    .unwrap();
    let query = GradeQuery {
        endpoint: GradeEndpoint::Application,
        params: vec![
            (
                "resume_url".to_string(),
                "https://cdn.example.com/cv.pdf".to_string(),
            ),
            ("description".to_string(), "Answer phones".to_string()),
        ],
    };
    assert_eq!(api.grade(&query).await.unwrap(), 56);
}

#[tokio::test]
async fn grade_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/live-grade/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = api_for(&server).grade(&posting_query()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
}

#[tokio::test]
async fn grade_fails_on_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/live-grade/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"score": 10}"#))
        .mount(&server)
        .await;

    let err = api_for(&server).grade(&posting_query()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidResponse);
}

#[tokio::test]
async fn grade_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/live-grade/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string(r#"{"grade": 1}"#),
        )
        .mount(&server)
        .await;

    let api = ReqwestApi::new(ApiSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ApiSettings::default()
    })
    .unwrap();
    let err = api.grade(&posting_query()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn grade_rejects_oversized_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/live-grade/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"grade": 12345}"#))
        .mount(&server)
        .await;

    let api = ReqwestApi::new(ApiSettings {
        base_url: server.uri(),
        max_response_bytes: 8,
        ..ApiSettings::default()
    })
    .unwrap();
    let err = api.grade(&posting_query()).await.unwrap_err();
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 8, .. }));
}

fn application_request() -> SubmitRequest {
    SubmitRequest {
        path: "/api/jobs/42/apply/".to_string(),
        fields: vec![
            ("email".to_string(), "ada@example.com".to_string()),
            (
                "references".to_string(),
                r#"[{"name":"Charles","relation":"","contact":"c@example.com"}]"#.to_string(),
            ),
        ],
        files: vec![SubmitFile {
            name: "resume".to_string(),
            file_name: "cv.pdf".to_string(),
            mime: "application/pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF-1.4 resume"),
        }],
    }
}

#[tokio::test]
async fn submit_posts_one_multipart_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/42/apply/"))
        .and(body_string_contains("name=\"email\""))
        .and(body_string_contains("ada@example.com"))
        .and(body_string_contains("filename=\"cv.pdf\""))
        .and(body_string_contains("%PDF-1.4 resume"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_string(r#"{"id": 17, "redirect": "/applications/17"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = api_for(&server)
        .submit(application_request())
        .await
        .expect("submitted");
    assert_eq!(response.status, 201);
    assert_eq!(response.id.as_deref(), Some("17"));
    assert_eq!(response.redirect.as_deref(), Some("/applications/17"));

    let requests = server.received_requests().await.expect("recording on");
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));
}

#[tokio::test]
async fn submit_surfaces_the_backend_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/42/apply/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"detail": "You already applied to this job."}"#),
        )
        .mount(&server)
        .await;

    let err = api_for(&server)
        .submit(application_request())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(400));
    assert_eq!(err.message, "You already applied to this job.");
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = ReqwestApi::new(ApiSettings {
        base_url: "not a url".to_string(),
        ..ApiSettings::default()
    })
    .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
