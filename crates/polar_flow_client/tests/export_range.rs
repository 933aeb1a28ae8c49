use async_trait::async_trait;
use polar_flow_client::{
    ActivityRecord, ActivitySink, Config, Credentials, Exporter, FailedDownload, FailureReason,
    PolarFlowError,
};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn exporter_for(server: &MockServer) -> Exporter {
    let cfg = Config {
        base_url: server.uri(),
        throttle_seconds: 0.0,
        ..Config::default()
    };
    Exporter::new(&cfg, Credentials::new("me@example.com", "s3cret")).expect("exporter")
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).append_header("set-cookie", "PLAY_SESSION=abc; Path=/"),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_calendar(server: &MockServer, start: &str, end: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/training/getCalendarEvents"))
        .and(query_param("start", start))
        .and(query_param("end", end))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_export(server: &MockServer, activity_path: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("{activity_path}/export/tcx/false")))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn exports_supported_activity_and_skips_fitness_test() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_calendar(
        &server,
        "1.8.2015",
        "2.8.2015",
        serde_json::json!([
            {"listItemId": 111, "datetime": "2015-08-01T10:00:00.000", "url": "/training/analysis/111"},
            {"listItemId": 222, "datetime": "2015-08-02T07:30:00.000", "url": "/test/fitness/222"}
        ]),
    )
    .await;
    mount_export(
        &server,
        "/training/analysis/111",
        ResponseTemplate::new(200).set_body_bytes(b"<TrainingCenterDatabase/>".to_vec()),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/test/fitness/222/export/tcx/false"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut exporter = exporter_for(&server);
    let mut sink: Vec<ActivityRecord> = Vec::new();
    let records = exporter
        .export_range("2015-08-01", "2015-08-02", &mut sink)
        .await
        .expect("export");

    let expected = ActivityRecord {
        workout_id: "111".into(),
        date_str: "2015-08-01T10:00:00.000".into(),
        content: b"<TrainingCenterDatabase/>".to_vec(),
    };
    assert_eq!(records, vec![expected.clone()]);
    assert_eq!(sink, vec![expected]);
    assert_eq!(
        exporter.failures(),
        &[FailedDownload {
            url: "/test/fitness/222".into(),
            reason: FailureReason::Unsupported,
        }]
    );
}

#[tokio::test]
async fn login_posts_credentials_and_return_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("email=me%40example.com"))
        .and(body_string_contains("password=s3cret"))
        .and(body_string_contains("returnUrl="))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut exporter = exporter_for(&server);
    exporter.login().await.expect("login");
    assert!(exporter.is_logged_in());
}

#[tokio::test]
async fn login_happens_once_across_exports() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_calendar(&server, "1.8.2015", "2.8.2015", serde_json::json!([])).await;
    mount_calendar(&server, "3.8.2015", "9.8.2015", serde_json::json!([])).await;

    let mut exporter = exporter_for(&server);
    let mut sink: Vec<ActivityRecord> = Vec::new();
    exporter
        .export_range("2015-08-01", "2015-08-02", &mut sink)
        .await
        .expect("first export");
    exporter
        .export_range("2015-08-03", "2015-08-09", &mut sink)
        .await
        .expect("second export");
    assert!(exporter.is_logged_in());
    assert!(sink.is_empty());
    // `expect(1)` on the login mocks is verified when the server drops.
}

#[tokio::test]
async fn session_cookie_reaches_calendar_query() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/training/getCalendarEvents"))
        .and(header("cookie", "PLAY_SESSION=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut exporter = exporter_for(&server);
    let mut sink: Vec<ActivityRecord> = Vec::new();
    exporter
        .export_range("2015-08-01", "2015-08-01", &mut sink)
        .await
        .expect("export");
    assert!(exporter.failures().is_empty());
}

#[tokio::test]
async fn not_found_download_is_recorded_and_run_continues() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_calendar(
        &server,
        "1.8.2015",
        "2.8.2015",
        serde_json::json!([
            {"listItemId": "1", "datetime": "2015-08-01T10:00:00.000", "url": "/training/analysis/1"},
            {"listItemId": "2", "datetime": "2015-08-02T10:00:00.000", "url": "/training/analysis/2"}
        ]),
    )
    .await;
    mount_export(&server, "/training/analysis/1", ResponseTemplate::new(404)).await;
    mount_export(
        &server,
        "/training/analysis/2",
        ResponseTemplate::new(200).set_body_bytes(b"two".to_vec()),
    )
    .await;

    let mut exporter = exporter_for(&server);
    let mut sink: Vec<ActivityRecord> = Vec::new();
    let records = exporter
        .export_range("2015-08-01", "2015-08-02", &mut sink)
        .await
        .expect("export");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].workout_id, "2");
    assert_eq!(
        exporter.failures(),
        &[FailedDownload {
            url: "/training/analysis/1".into(),
            reason: FailureReason::HttpStatus(404),
        }]
    );
}

#[tokio::test]
async fn server_error_aborts_remaining_downloads() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_calendar(
        &server,
        "1.8.2015",
        "2.8.2015",
        serde_json::json!([
            {"listItemId": "1", "datetime": "2015-08-01T10:00:00.000", "url": "/training/analysis/1"},
            {"listItemId": "2", "datetime": "2015-08-02T10:00:00.000", "url": "/training/analysis/2"}
        ]),
    )
    .await;
    mount_export(&server, "/training/analysis/1", ResponseTemplate::new(500)).await;
    Mock::given(method("GET"))
        .and(path("/training/analysis/2/export/tcx/false"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"two".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let mut exporter = exporter_for(&server);
    let mut sink: Vec<ActivityRecord> = Vec::new();
    let err = exporter
        .export_range("2015-08-01", "2015-08-02", &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, PolarFlowError::Status { status: 500, .. }));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn calendar_not_found_yields_empty_export() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/training/getCalendarEvents"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut exporter = exporter_for(&server);
    let mut sink: Vec<ActivityRecord> = Vec::new();
    let records = exporter
        .export_range("2015-08-01", "2015-08-02", &mut sink)
        .await
        .expect("404 calendar is not fatal");
    assert!(records.is_empty());
    assert_eq!(exporter.failures().len(), 1);
    assert!(exporter.failures()[0].url.contains("/training/getCalendarEvents"));
}

#[tokio::test]
async fn empty_calendar_body_yields_empty_export() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/training/getCalendarEvents"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut exporter = exporter_for(&server);
    let mut sink: Vec<ActivityRecord> = Vec::new();
    let records = exporter
        .export_range("2015-08-01", "2015-08-02", &mut sink)
        .await
        .expect("export");
    assert!(records.is_empty());
    assert!(exporter.failures().is_empty());
}

#[tokio::test]
async fn malformed_calendar_body_is_fatal() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/training/getCalendarEvents"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let mut exporter = exporter_for(&server);
    let mut sink: Vec<ActivityRecord> = Vec::new();
    let err = exporter
        .export_range("2015-08-01", "2015-08-02", &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, PolarFlowError::Decode(_)));
}

#[tokio::test]
async fn empty_download_is_recorded_as_failure() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_calendar(
        &server,
        "1.8.2015",
        "1.8.2015",
        serde_json::json!([
            {"listItemId": "1", "datetime": "2015-08-01T10:00:00.000", "url": "/training/analysis/1"}
        ]),
    )
    .await;
    mount_export(&server, "/training/analysis/1", ResponseTemplate::new(200)).await;

    let mut exporter = exporter_for(&server);
    let mut sink: Vec<ActivityRecord> = Vec::new();
    let records = exporter
        .export_range("2015-08-01", "2015-08-01", &mut sink)
        .await
        .expect("export");
    assert!(records.is_empty());
    assert_eq!(exporter.failures()[0].reason, FailureReason::EmptyContent);
}

#[tokio::test]
async fn invalid_date_issues_no_requests() {
    let server = MockServer::start().await;

    let mut exporter = exporter_for(&server);
    let mut sink: Vec<ActivityRecord> = Vec::new();
    let err = exporter
        .export_range("2015-08-01", "yesterday", &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, PolarFlowError::DateParse { ref input } if input == "yesterday"));
    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty());
}

struct FailingSink;

#[async_trait]
impl ActivitySink for FailingSink {
    async fn accept(&mut self, _record: &ActivityRecord) -> Result<(), PolarFlowError> {
        Err(PolarFlowError::Io(std::io::Error::other("disk full")))
    }
}

#[tokio::test]
async fn sink_error_aborts_export() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_calendar(
        &server,
        "1.8.2015",
        "2.8.2015",
        serde_json::json!([
            {"listItemId": "1", "datetime": "2015-08-01T10:00:00.000", "url": "/training/analysis/1"},
            {"listItemId": "2", "datetime": "2015-08-02T10:00:00.000", "url": "/training/analysis/2"}
        ]),
    )
    .await;
    mount_export(
        &server,
        "/training/analysis/1",
        ResponseTemplate::new(200).set_body_bytes(b"one".to_vec()),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/training/analysis/2/export/tcx/false"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"two".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let mut exporter = exporter_for(&server);
    let err = exporter
        .export_range("2015-08-01", "2015-08-02", &mut FailingSink)
        .await
        .unwrap_err();
    assert!(matches!(err, PolarFlowError::Io(_)));
}
