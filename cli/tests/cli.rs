use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A `concierge` command isolated from any user or working-directory config
fn concierge(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("concierge").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("CONCIERGE_DATA_DIR")
        .env_remove("CONCIERGE_WEATHER_URL")
        .env_remove("RUST_LOG");
    cmd
}

fn write_events(dir: &Path) {
    fs::write(
        dir.join("events.csv"),
        "event_name,venue,start_date\n\
         Autumn Food Fair,Central Plaza,2025-10-01 10:00:00\n\
         Jazz Night,Rooftop Garden,2025-10-04 19:00:00\n",
    )
    .unwrap();
}

#[test]
fn tools_lists_registered_tools() {
    let home = TempDir::new().unwrap();

    concierge(home.path())
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("📦 search_events"))
        .stdout(predicate::str::contains("📦 get_weather"))
        .stdout(predicate::str::contains("📦 multiply"));
}

#[test]
fn call_multiply_prints_result() {
    let home = TempDir::new().unwrap();

    concierge(home.path())
        .args(["call", "multiply", "--args", r#"{"a": 6, "b": 7}"#])
        .assert()
        .success()
        .stdout(predicate::str::diff("42\n"));
}

#[test]
fn call_search_reads_csv_from_data_dir() {
    let home = TempDir::new().unwrap();
    let data = home.path().join("data");
    fs::create_dir(&data).unwrap();
    write_events(&data);

    concierge(home.path())
        .arg("--data-dir")
        .arg(&data)
        .args([
            "call",
            "search_events",
            "--args",
            r#"{"sql_query": "SELECT event_name FROM \"events.csv\" WHERE venue = 'Rooftop Garden'"}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Jazz Night"))
        .stdout(predicate::str::contains("\"count\": 1"));
}

#[test]
fn call_rejects_write_statements() {
    let home = TempDir::new().unwrap();

    concierge(home.path())
        .args([
            "call",
            "search_events",
            "--args",
            r#"{"sql_query": "DELETE FROM \"events.csv\""}"#,
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"error\""));
}

#[test]
fn call_unknown_tool_fails() {
    let home = TempDir::new().unwrap();

    concierge(home.path())
        .args(["call", "book_flight"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Tool not found: book_flight"));
}

#[test]
fn config_file_in_working_directory_is_used() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("concierge.json"),
        r#"{ "sandbox": { "max_rows": 0 } }"#,
    )
    .unwrap();

    concierge(home.path())
        .arg("tools")
        .assert()
        .failure()
        .stderr(predicate::str::contains("sandbox.max_rows"));
}

#[test]
fn replay_openai_style_transcript() {
    let home = TempDir::new().unwrap();
    let transcript = home.path().join("turn.jsonl");
    fs::write(
        &transcript,
        [
            r#"{"type": "AIMessageChunk", "content": "", "tool_call_chunks": [{"id": "call_1", "name": "multiply", "args": "{\"a\": 3", "index": 0}]}"#,
            r#"{"type": "AIMessageChunk", "content": "", "tool_call_chunks": [{"id": null, "name": null, "args": ", \"b\": 4}", "index": 0}]}"#,
            r#"{"type": "tool", "tool_call_id": "call_1", "name": "multiply", "content": "12"}"#,
            r#"{"type": "AIMessageChunk", "content": "The answer is 12."}"#,
        ]
        .join("\n"),
    )
    .unwrap();

    concierge(home.path())
        .arg("replay")
        .arg(&transcript)
        .assert()
        .success()
        .stdout(predicate::str::contains("multiply(3 × 4)"))
        .stdout(predicate::str::contains("  ⎿  Result: 12"))
        .stdout(predicate::str::contains("The answer is 12."));
}

#[test]
fn replay_anthropic_style_transcript_as_json() {
    let home = TempDir::new().unwrap();
    let transcript = home.path().join("turn.jsonl");
    fs::write(
        &transcript,
        [
            r#"{"type": "ai", "content": [{"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {}}]}"#,
            r#"{"type": "ai", "content": [{"type": "input_json_delta", "partial_json": "{\"locat"}]}"#,
            r#"{"type": "ai", "content": [{"type": "input_json_delta", "partial_json": "ion\": \"Tokyo\"}"}]}"#,
            r#"{"type": "tool", "tool_call_id": "toolu_1", "name": "get_weather", "content": "sunny"}"#,
        ]
        .join("\n"),
    )
    .unwrap();

    concierge(home.path())
        .args(["replay", "--json"])
        .arg(&transcript)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""kind":"tool""#))
        .stdout(predicate::str::contains(r#""tool_name":"get_weather""#))
        .stdout(predicate::str::contains("Tokyo"))
        .stdout(predicate::str::contains(r#""output_data":"sunny""#));
}

#[test]
fn replay_malformed_line_ends_with_error() {
    let home = TempDir::new().unwrap();
    let transcript = home.path().join("turn.jsonl");
    fs::write(
        &transcript,
        "{\"type\": \"ai\", \"content\": \"Checking\"}\n{broken\n{\"type\": \"ai\", \"content\": \"never\"}\n",
    )
    .unwrap();

    concierge(home.path())
        .args(["replay", "--json"])
        .arg(&transcript)
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""kind":"error""#))
        .stdout(predicate::str::contains("line 2"))
        .stdout(predicate::str::contains("never").not());
}
