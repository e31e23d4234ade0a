use std::process::{Command, Output};

use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn run(args: Vec<String>) -> Output {
    tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_retrieve"))
            .args(&args)
            .env_remove("RETRIEVE_BASE_URL")
            .env_remove("RETRIEVE_TIMEOUT_MS")
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn prints_json_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"[{"id":1}]"#, "application/json"))
        .mount(&mock_server)
        .await;

    let output = run(args(&[
        "/items",
        "--base-url",
        &mock_server.uri(),
        "--param",
        "page=2",
        "--output",
        "json",
    ]))
    .await;

    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["status"], 200);
    assert_eq!(value["data"], json!([{"id": 1}]));
}

#[tokio::test]
async fn posts_json_data_with_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/items"))
        .and(header("authorization", "Bearer token"))
        .and(body_json(json!({"name": "Widget"})))
        .respond_with(ResponseTemplate::new(201).set_body_raw("created", "text/plain"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/items", mock_server.uri());
    let output = run(args(&[
        &url,
        "-X",
        "POST",
        "-H",
        "Authorization: Bearer token",
        "-d",
        r#"{"name":"Widget"}"#,
    ]))
    .await;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("HTTP 201 Created\n"));
    assert!(stdout.ends_with("\ncreated\n"));
}

#[tokio::test]
async fn failure_status_exits_non_zero() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let output = run(args(&["/missing", "--base-url", &mock_server.uri()])).await;

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("error: 404 Not Found"));
}

#[tokio::test]
async fn relative_url_without_base_fails() {
    let output = run(args(&["/items"])).await;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("needs a base url"));
}
