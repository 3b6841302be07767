//! Integration tests for the `squash` binary
//!
//! These tests run the compiled binary against a mock SquashTM server and
//! check:
//! - configuration layering (file, environment, flags)
//! - token inspection without network access
//! - tree and test-case output
//! - fallback data when the service is down

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};
use std::process::Output;
use tempfile::TempDir;
use tokio::process::Command;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Unsigned compact token expiring `offset_secs` from now
fn token_expiring_in(offset_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + offset_secs;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS512"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({"sub": "7", "permissions": "READ", "iat": exp - 3600, "exp": exp}).to_string(),
    );
    format!("{}.{}.c2lnbmF0dXJl", header, payload)
}

/// The binary with a clean `SQUASH_*` environment and fast retries
fn squash(base_url: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_squash"));
    for (key, _) in std::env::vars() {
        if key.starts_with("SQUASH_") {
            cmd.env_remove(key);
        }
    }
    cmd.env("RUST_LOG", "error")
        .env("SQUASH_BASE_URL", base_url)
        .env("SQUASH_MAX_ATTEMPTS", "1")
        .env("SQUASH_BASE_DELAY_MS", "10")
        .env("SQUASH_MAX_DELAY_MS", "20")
        .env("SQUASH_JITTER", "false");
    cmd
}

async fn run(cmd: &mut Command) -> Output {
    cmd.output().await.expect("Failed to run squash binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[tokio::test]
async fn test_missing_token_is_reported() {
    let output = run(squash("http://127.0.0.1:9").arg("tree")).await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SQUASH_API_TOKEN"), "stderr: {}", stderr);
}

#[tokio::test]
async fn test_token_set_is_decoded_offline() {
    let token = token_expiring_in(-120);
    let output = run(squash("http://127.0.0.1:9").args(["token", "--json", "--set", &token])).await;

    assert!(output.status.success());
    let status = stdout_json(&output);
    assert_eq!(status["subject"], "7");
    assert_eq!(status["permissions"], "READ");
    assert_eq!(status["isExpired"], true);
}

#[tokio::test]
async fn test_undecodable_token_counts_as_expired() {
    let output = run(squash("http://127.0.0.1:9")
        .env("SQUASH_API_TOKEN", "not-a-jwt")
        .arg("token"))
    .await;

    assert!(output.status.success());
    assert!(stdout(&output).contains("undecodable"));
}

#[tokio::test]
async fn test_tree_expands_to_requested_depth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"projects": [{"id": 1, "name": "Sample Project 1"}]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/1/test-case-folders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"folders": [{"id": 101, "name": "Authentication Tests"}]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/test-case-folders/101/folders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_links": {}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/test-case-folders/101/test-cases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"testCases": [
                {"id": 1001, "name": "Login with valid credentials", "reference": "TC-001", "importance": "HIGH"}
            ]}
        })))
        .mount(&server)
        .await;

    let token = token_expiring_in(3600);
    let output = run(squash(&server.uri())
        .env("SQUASH_API_TOKEN", &token)
        .args(["tree", "--depth", "2"]))
    .await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout(&output),
        "v Sample Project 1 [project-1]\n  v Authentication Tests [folder-101]\n    - Login with valid credentials [testcase-1001] TC-001 HIGH\n"
    );

    let output = run(squash(&server.uri())
        .env("SQUASH_API_TOKEN", &token)
        .args(["tree", "--depth", "0"]))
    .await;
    assert_eq!(stdout(&output), "> Sample Project 1 [project-1]\n");
}

#[tokio::test]
async fn test_test_cases_page_from_config_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test-cases"))
        .and(query_param("page", "2"))
        .and(query_param("size", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": {"test-cases": [
                {"id": 1011, "name": "Logout", "reference": "TC-011", "status": "APPROVED"}
            ]},
            "page": {"size": 5, "totalElements": 11, "totalPages": 3, "number": 2}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("squash.toml");
    std::fs::write(
        &file,
        format!(
            "base_url = \"{}\"\n\n[page_sizes]\ntest_cases = 5\n",
            server.uri()
        ),
    )
    .unwrap();

    let mut cmd = squash(&server.uri());
    cmd.env_remove("SQUASH_BASE_URL")
        .env("SQUASH_API_TOKEN", token_expiring_in(3600))
        .arg("--config")
        .arg(&file)
        .args(["test-cases", "--page", "2"]);
    let output = run(&mut cmd).await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let text = stdout(&output);
    assert!(text.starts_with("page 2 (1 of 11 test cases)\n"));
    assert!(text.contains("TC-011"));
    assert!(text.contains("APPROVED"));
}

#[tokio::test]
async fn test_fallback_flag_serves_sample_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let output = run(squash(&server.uri())
        .env("SQUASH_API_TOKEN", token_expiring_in(3600))
        .args(["--fallback", "test-case", "1001", "--json"]))
    .await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let case = stdout_json(&output);
    assert_eq!(case["reference"], "TC-001");
    assert_eq!(case["steps"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_health_fails_when_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let output = run(squash(&server.uri())
        .env("SQUASH_API_TOKEN", token_expiring_in(3600))
        .arg("health"))
    .await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("did not answer"));
}

#[tokio::test]
async fn test_status_reports_expired_token_without_network() {
    let server = MockServer::start().await;

    let output = run(squash(&server.uri())
        .env("SQUASH_API_TOKEN", token_expiring_in(-60))
        .args(["status", "--json"]))
    .await;

    assert!(output.status.success());
    let status = stdout_json(&output);
    assert_eq!(status["connection"], "token-expired");
    assert_eq!(status["circuit"]["isOpen"], false);
    assert!(server.received_requests().await.unwrap().is_empty());
}
