//! End-to-end tests for the REDCap extract
//!
//! These tests validate the full extraction workflow including:
//! - Metadata then record export against a mock REDCap endpoint
//! - Field filtering and CSV layout seen by the sink
//! - Aborting on HTTP errors before anything is uploaded
//! - Binary exit behaviour for API and credential failures
//! - Logging misconfiguration never stopping a run

use assert_cmd::Command;
use async_trait::async_trait;
use predicates::prelude::*;
use redcap_extract::api::RedcapClient;
use redcap_extract::ftp::FtpConfig;
use redcap_extract::{pipeline, ExtractConfig, ExtractError, ExtractSink};
use serde_json::json;
use std::io::Write;
use std::sync::Mutex;
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

const API_PATH: &str = "/redcap/api/";

/// Sink that keeps every delivery in memory
#[derive(Default)]
struct RecordingSink {
    deliveries: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl RecordingSink {
    fn deliveries(&self) -> Vec<(String, String, Vec<u8>)> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtractSink for RecordingSink {
    async fn deliver(&self, project: &str, name: &str, data: Vec<u8>) -> redcap_extract::Result<()> {
        self.deliveries
            .lock()
            .unwrap()
            .push((project.to_string(), name.to_string(), data));
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

fn metadata_response() -> serde_json::Value {
    json!([
        {"field_name": "record_id", "form_name": "baseline", "field_type": "text", "field_label": "Record ID", "identifier": ""},
        {"field_name": "email", "form_name": "baseline", "field_type": "text", "field_label": "Email", "identifier": "y"},
        {"field_name": "landline", "form_name": "baseline", "field_type": "text", "field_label": "Landline", "identifier": ""},
        {"field_name": "comments", "form_name": "baseline", "field_type": "notes", "field_label": "Comments", "identifier": ""},
        {"field_name": "age", "form_name": "baseline", "field_type": "text", "field_label": "Age", "identifier": ""}
    ])
}

fn records_response() -> serde_json::Value {
    json!([
        {
            "record_id": "1",
            "redcap_survey_identifier": "",
            "baseline_timestamp": "2023-05-01 10:00:00",
            "email": "a@example.org",
            "landline": "0123",
            "comments": "all good",
            "age": "34"
        },
        {
            "record_id": "2",
            "redcap_survey_identifier": "",
            "baseline_timestamp": "[not completed]",
            "email": "b@example.org",
            "landline": "",
            "comments": "line one\nline two",
            "age": "51"
        }
    ])
}

fn config(project: &str, exclude_notes: bool) -> ExtractConfig {
    ExtractConfig {
        project: project.to_string(),
        token: "ABCDEF0123456789".to_string(),
        redcap_url: String::new(),
        exclude_notes,
        ftp: FtpConfig::default(),
    }
}

async fn mount_redcap(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_string_contains("content=metadata"))
        .and(body_string_contains("token=ABCDEF0123456789"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metadata_response()))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_string_contains("content=record"))
        .and(body_string_contains("exportSurveyFields=true"))
        .and(body_string_contains("type=flat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records_response()))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[tokio::test]
async fn test_extract_filters_and_delivers_csv() {
    let server = MockServer::start().await;
    mount_redcap(&server).await;

    let client = RedcapClient::new(format!("{}{}", server.uri(), API_PATH)).unwrap();
    let sink = RecordingSink::default();

    let summary = pipeline::run(&config("RADAR", false), &client, &sink).await.unwrap();

    assert_eq!(
        summary.fields,
        vec!["record_id", "redcap_survey_identifier", "baseline_timestamp", "comments", "age"]
    );
    assert_eq!(summary.records, 2);

    let deliveries = sink.deliveries();
    assert_eq!(deliveries.len(), 1);
    let (project, name, data) = &deliveries[0];
    assert_eq!(project, "RADAR");
    assert_eq!(name, &summary.name);
    assert!(name.starts_with("REDCAP_RADAR_") && name.ends_with(".csv"));
    assert_eq!(data.len(), summary.bytes);

    let csv = String::from_utf8(data.clone()).unwrap();
    assert_eq!(
        csv,
        "record_id,redcap_survey_identifier,baseline_timestamp,comments,age\r\n\
         1,,2023-05-01 10:00:00,all good,34\r\n\
         2,,[not completed],\"line one\nline two\",51\r\n"
    );
    assert!(!csv.contains("example.org"));
    assert!(!csv.contains("0123"));
}

#[tokio::test]
async fn test_extract_excluding_notes() {
    let server = MockServer::start().await;
    mount_redcap(&server).await;

    let client = RedcapClient::new(format!("{}{}", server.uri(), API_PATH)).unwrap();
    let sink = RecordingSink::default();

    let summary = pipeline::run(&config("RADAR", true), &client, &sink).await.unwrap();

    assert_eq!(
        summary.fields,
        vec!["record_id", "redcap_survey_identifier", "baseline_timestamp", "age"]
    );
}

#[tokio::test]
async fn test_metadata_error_aborts_before_upload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("content=metadata"))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"error":"boom"}"#))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("content=record"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records_response()))
        .expect(0)
        .mount(&server)
        .await;

    let client = RedcapClient::new(format!("{}{}", server.uri(), API_PATH)).unwrap();
    let sink = RecordingSink::default();

    let err = pipeline::run(&config("RADAR", false), &client, &sink).await.unwrap_err();

    match err {
        ExtractError::ApiStatus { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert!(body.contains("boom"));
        },
        other => panic!("expected ApiStatus, got {:?}", other),
    }
    assert!(sink.deliveries().is_empty());
}

#[tokio::test]
async fn test_record_error_aborts_before_upload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("content=metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metadata_response()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("content=record"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = RedcapClient::new(format!("{}{}", server.uri(), API_PATH)).unwrap();
    let sink = RecordingSink::default();

    let result = pipeline::run(&config("RADAR", false), &client, &sink).await;

    assert!(matches!(result, Err(ExtractError::ApiStatus { .. })));
    assert!(sink.deliveries().is_empty());
}

#[tokio::test]
async fn test_empty_extract_is_not_uploaded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("content=metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metadata_response()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("content=record"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = RedcapClient::new(format!("{}{}", server.uri(), API_PATH)).unwrap();
    let sink = RecordingSink::default();

    let result = pipeline::run(&config("RADAR", false), &client, &sink).await;

    assert!(matches!(result, Err(ExtractError::EmptyExtract)));
    assert!(sink.deliveries().is_empty());
}

#[tokio::test]
async fn test_malformed_dictionary_row_aborts_before_export() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("content=metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"field_name": "record_id", "field_type": "text", "identifier": ""},
            {"field_name": "email", "field_type": "text"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("content=record"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records_response()))
        .expect(0)
        .mount(&server)
        .await;

    let client = RedcapClient::new(format!("{}{}", server.uri(), API_PATH)).unwrap();
    let sink = RecordingSink::default();

    let result = pipeline::run(&config("RADAR", false), &client, &sink).await;

    assert!(matches!(result, Err(ExtractError::Json(_))));
    assert!(sink.deliveries().is_empty());
}

#[tokio::test]
async fn test_non_array_response_is_json_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "You do not have permissions"})))
        .mount(&server)
        .await;

    let client = RedcapClient::new(format!("{}{}", server.uri(), API_PATH)).unwrap();
    let result = client.get_metadata("ABCDEF0123456789").await;

    assert!(matches!(result, Err(ExtractError::Json(_))));
}

// ============================================================================
// Binary Tests
// ============================================================================

#[tokio::test]
async fn test_cli_http_error_exits_non_zero() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("content=metadata"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("content=record"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records_response()))
        .expect(0)
        .mount(&server)
        .await;

    let mut cmd = Command::cargo_bin("redcap-extract").unwrap();
    cmd.arg("RADAR")
        .arg("ABCDEF0123456789")
        .arg("--redcap-url")
        .arg(format!("{}{}", server.uri(), API_PATH))
        .arg("--ftp-user")
        .arg("radar")
        .arg("--ftp-password")
        .arg("secret");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("500"));
}

#[tokio::test]
async fn test_cli_missing_credentials_entry_exits_before_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let mut netrc = tempfile::NamedTempFile::new().unwrap();
    writeln!(netrc, "machine 10.9.9.9 login other password other").unwrap();

    let mut cmd = Command::cargo_bin("redcap-extract").unwrap();
    cmd.arg("RADAR")
        .arg("ABCDEF0123456789")
        .arg("--redcap-url")
        .arg(format!("{}{}", server.uri(), API_PATH))
        .arg("--ftp-ip")
        .arg("127.0.0.1")
        .arg("--netrc")
        .arg(netrc.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no FTP credentials for '127.0.0.1'"));
}

#[tokio::test]
async fn test_cli_invalid_log_env_falls_back_to_flags() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = Command::cargo_bin("redcap-extract").unwrap();
    cmd.env("LOG_LEVEL", "chatty")
        .arg("RADAR")
        .arg("ABCDEF0123456789")
        .arg("--redcap-url")
        .arg(format!("{}{}", server.uri(), API_PATH))
        .arg("--ftp-user")
        .arg("radar")
        .arg("--ftp-password")
        .arg("secret");

    // The run still reaches the API; the failure is the HTTP one
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("500"))
        .stderr(predicate::str::contains("logging").not());
}

#[tokio::test]
async fn test_cli_unusable_log_dir_runs_without_logging() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    // A regular file where the log directory should be
    let not_a_dir = tempfile::NamedTempFile::new().unwrap();

    let mut cmd = Command::cargo_bin("redcap-extract").unwrap();
    cmd.env("LOG_OUTPUT", "file")
        .env("LOG_DIR", not_a_dir.path().join("logs"))
        .arg("RADAR")
        .arg("ABCDEF0123456789")
        .arg("--redcap-url")
        .arg(format!("{}{}", server.uri(), API_PATH))
        .arg("--ftp-user")
        .arg("radar")
        .arg("--ftp-password")
        .arg("secret");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Warning: logging disabled"))
        .stderr(predicate::str::contains("500"));
}

#[test]
fn test_cli_requires_project_and_token() {
    let mut cmd = Command::cargo_bin("redcap-extract").unwrap();
    cmd.arg("RADAR");

    cmd.assert().failure().code(2);
}
