#[path = "common/mod.rs"]
mod common;

use common::{ConsoleTest, assert_success};
use httpmock::prelude::*;
use serde_json::{Value, json};

fn audience(id: u64, name: &str) -> Value {
    json!({
        "audience_id": id,
        "name": name,
        "type": "STATIC",
        "verified": false,
        "user_count": 950,
        "expire_date": 1767225600,
        "created_by": "sam"
    })
}

fn page(records: Vec<Value>, has_more: bool) -> Value {
    json!({"data": {"page_info": {"has_more": has_more}, "data": records}})
}

// ============================================================================
// List commands
// ============================================================================

#[test]
fn test_audiences_json_sends_filters() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/audiences")
            .header("service", "audience")
            .query_param("page", "0")
            .query_param("pageSize", "20")
            .query_param("nameSearch", "churn")
            .query_param("status", "LIVE")
            .query_param("createdBy", "sam");
        then.status(200)
            .json_body(page(vec![audience(1, "churn risk")], true));
    });

    let console = ConsoleTest::new().with_api(server.base_url());
    let output = console.run_success(&[
        "audiences",
        "--search",
        "churn",
        "--status",
        "live",
        "--created-by",
        "sam",
        "--json",
    ]);

    mock.assert();
    let json: Value = serde_json::from_str(&output).expect("valid JSON");
    assert_eq!(json["collection"], "audiences");
    assert_eq!(json["count"], 1);
    assert_eq!(json["has_more"], true);
    assert_eq!(json["filters"]["search"], "churn");
    assert_eq!(json["records"][0]["audience_id"], 1);
    assert_eq!(json["records"][0]["type"], "STATIC");
}

#[test]
fn test_limit_loads_pages_and_truncates() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(GET)
            .path("/datasources")
            .query_param("pageNum", "0");
        then.status(200).json_body(page(
            vec![
                json!({"id": 1, "name": "clicks"}),
                json!({"id": 2, "name": "orders"}),
            ],
            true,
        ));
    });
    let second = server.mock(|when, then| {
        when.method(GET)
            .path("/datasources")
            .query_param("pageNum", "1");
        then.status(200).json_body(page(
            vec![
                json!({"id": 3, "name": "sessions"}),
                json!({"id": 4, "name": "refunds"}),
            ],
            true,
        ));
    });

    let console = ConsoleTest::new().with_api(server.base_url());
    let output = console.run_success(&["datasources", "-n", "3", "--page-size", "2", "--json"]);

    first.assert();
    second.assert();
    let json: Value = serde_json::from_str(&output).expect("valid JSON");
    assert_eq!(json["count"], 3);
    assert_eq!(json["pages_loaded"], 2);
    assert_eq!(json["has_more"], true);
    assert_eq!(json["records"][2]["name"], "sessions");
}

#[test]
fn test_all_loads_until_last_page() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/datasinks")
            .query_param("pageNum", "0");
        then.status(200).json_body(page(
            vec![json!({"id": 1, "name": "warehouse", "createdBy": "ops"})],
            true,
        ));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/datasinks")
            .query_param("pageNum", "1");
        then.status(200).json_body(page(
            vec![
                json!({"id": 1, "name": "warehouse", "createdBy": "ops"}),
                json!({"id": 2, "name": "lake", "status": "LIVE"}),
            ],
            false,
        ));
    });

    let console = ConsoleTest::new().with_api(server.base_url());
    let output = console.run_success(&["datasinks", "--all"]);

    assert!(output.contains("warehouse"));
    assert!(output.contains("lake"));
    assert!(output.contains("Created by"));
    assert!(output.contains("Active"));
    assert!(output.contains("2 datasinks"));
    assert!(!output.contains("more available"));
}

#[test]
fn test_empty_collection() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/audiences");
        then.status(200).json_body(json!({"data": {"data": []}}));
    });

    let console = ConsoleTest::new().with_api(server.base_url());
    let output = console.run_success(&["audiences"]);
    assert!(output.contains("No audiences found"));
}

#[test]
fn test_server_error_fails_command() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/audiences");
        then.status(500)
            .json_body(json!({"message": "database offline", "code": "DB_DOWN"}));
    });

    let console = ConsoleTest::new().with_api(server.base_url());
    console.write_config("retry:\n  max_attempts: 1\n");
    let stderr = console.run_failure(&["audiences"]);

    mock.assert();
    assert!(stderr.contains("database offline"));
    assert!(stderr.contains("500"));
}

#[test]
fn test_missing_base_url() {
    let console = ConsoleTest::new();
    let stderr = console.run_failure(&["audiences"]);
    assert!(stderr.contains("no API base URL configured"));
}

#[test]
fn test_invalid_status_is_rejected_by_parser() {
    let console = ConsoleTest::new();
    let stderr = console.run_failure(&["audiences", "--status", "archived"]);
    assert!(stderr.contains("Invalid status"));
}

// ============================================================================
// Single-resource commands
// ============================================================================

#[test]
fn test_show_audience_text() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/audiences/42");
        then.status(200).json_body(json!({
            "data": {
                "audience_meta": {
                    "audienceId": 42,
                    "name": "churn risk",
                    "type": "CONDITIONAL",
                    "userCount": 48200,
                    "createdBy": "sam"
                },
                "sinks": [{"id": 7, "name": "warehouse", "type": "S3"}],
                "rules": []
            }
        }));
    });

    let console = ConsoleTest::new().with_api(server.base_url());
    let output = console.run_success(&["show", "42"]);
    assert!(output.contains("churn risk"));
    assert!(output.contains("48k"));
    assert!(output.contains("warehouse"));
    assert!(output.contains("Rules"));
}

#[test]
fn test_show_missing_audience_fails() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/audiences/404");
        then.status(404).json_body(json!({"message": "audience not found"}));
    });

    let console = ConsoleTest::new().with_api(server.base_url());
    let stderr = console.run_failure(&["show", "404"]);
    assert!(stderr.contains("audience not found"));
}

#[test]
fn test_connector_types_json() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/connector-types")
            .query_param("kind", "SOURCE");
        then.status(200).json_body(json!({
            "data": [{"id": 5, "kind": "SOURCE", "type": "KAFKA", "displayName": "Kafka", "active": true}]
        }));
    });

    let console = ConsoleTest::new().with_api(server.base_url());
    let output = console.run_success(&["connector-types", "--kind", "source", "--json"]);

    mock.assert();
    let json: Value = serde_json::from_str(&output).expect("valid JSON");
    assert_eq!(json["kind"], "SOURCE");
    assert_eq!(json["count"], 1);
    assert_eq!(json["connector_types"][0]["displayName"], "Kafka");
}

// ============================================================================
// Browse
// ============================================================================

#[test]
fn test_browse_loads_more_from_stdin() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/audiences").query_param("page", "0");
        then.status(200)
            .json_body(page(vec![audience(1, "first cohort")], true));
    });
    server.mock(|when, then| {
        when.method(GET).path("/audiences").query_param("page", "1");
        then.status(200)
            .json_body(page(vec![audience(2, "second cohort")], false));
    });

    let console = ConsoleTest::new().with_api(server.base_url());
    let args = ["browse", "audiences"];
    let output = console.run_with_input(&args, ":more\n:q\n");
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("first cohort"));
    assert!(stdout.contains("second cohort"));
    assert!(stdout.contains("end of list"));
}

#[test]
fn test_browse_search_refetches() {
    let server = MockServer::start();
    let searched = server.mock(|when, then| {
        when.method(GET)
            .path("/audiences")
            .query_param("nameSearch", "vip");
        then.status(200)
            .json_body(page(vec![audience(9, "vip buyers")], false));
    });
    server.mock(|when, then| {
        when.method(GET).path("/audiences");
        then.status(200)
            .json_body(page(vec![audience(1, "everyone")], false));
    });

    let console = ConsoleTest::new().with_api(server.base_url());
    console.write_config("lists:\n  debounce_ms: 10\n");
    let args = ["browse"];
    let output = console.run_with_input(&args, "vip\n:oops\n");
    assert_success(&args, &output);

    searched.assert();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("everyone"));
    assert!(stdout.contains("vip buyers"));
    assert!(stdout.contains("unknown command ':oops'"));
}

// ============================================================================
// Config commands
// ============================================================================

#[test]
fn test_config_show_defaults() {
    let console = ConsoleTest::new();
    let output = console.run_success(&["config", "show"]);
    assert!(output.contains("Configuration"));
    assert!(output.contains("page_size: 20"));
    assert!(output.contains("not configured"));
}

#[test]
fn test_config_set_and_get() {
    let console = ConsoleTest::new();
    console.run_success(&["config", "set", "lists.page_size", "50"]);
    console.run_success(&["config", "set", "api.base_url", "https://api.example.com/v2"]);

    let output = console.run_success(&["config", "get", "lists.page_size"]);
    assert_eq!(output.trim(), "50");

    let config = console.read_config().expect("config written");
    assert!(config.contains("page_size: 50"));
    assert!(config.contains("https://api.example.com/v2"));
}

#[test]
fn test_config_token_is_masked() {
    let console = ConsoleTest::new();
    let output = console.run_success(&["config", "set", "auth.token", "secret_token_value", "--json"]);
    let json: Value = serde_json::from_str(&output).expect("valid JSON");
    assert_eq!(json["value"], "se...ue");

    let shown = console.run_success(&["config", "show"]);
    assert!(!shown.contains("secret_token_value"));
    assert!(shown.contains("se...ue"));
}

#[test]
fn test_config_set_rejects_bad_input() {
    let console = ConsoleTest::new();
    let stderr = console.run_failure(&["config", "set", "page_size", "10"]);
    assert!(stderr.contains("lists.page_size"));

    let stderr = console.run_failure(&["config", "set", "lists.page_size", "zero"]);
    assert!(stderr.contains("invalid value"));

    let stderr = console.run_failure(&["config", "set", "api.timeout_secs", "0"]);
    assert!(stderr.contains("api.timeout_secs must be at least 1"));
    assert!(console.read_config().is_none());
}

#[test]
fn test_config_path() {
    let console = ConsoleTest::new();
    let output = console.run_success(&["config", "path", "--json"]);
    let json: Value = serde_json::from_str(&output).expect("valid JSON");
    assert!(json["path"].as_str().unwrap().ends_with("config.yaml"));
}
