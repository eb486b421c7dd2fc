mod backend_stub;

use backend_stub::BackendStub;
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradeviewd");
    let mut child = Command::new(exe)
        .env_remove("GRADEVIEWD_BASE_URL")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradeviewd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_reply(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let value = read_reply(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let backend = BackendStub::spawn();
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"], true);
    assert_eq!(health["result"]["backendUrl"], serde_json::Value::Null);
    assert_eq!(health["result"]["openViews"], 0);

    let no_backend = request(
        &mut stdin,
        &mut reader,
        "2",
        "view.open",
        json!({ "courseId": "bio101" }),
    );
    assert_eq!(error_code(&no_backend), Some("no_backend"));

    let bad_url = request(
        &mut stdin,
        &mut reader,
        "3",
        "backend.select",
        json!({ "baseUrl": "ftp://example.com" }),
    );
    assert_eq!(error_code(&bad_url), Some("bad_params"));

    let bad_timeout = request(
        &mut stdin,
        &mut reader,
        "4",
        "backend.select",
        json!({ "baseUrl": backend.base_url, "timeoutSecs": 0 }),
    );
    assert_eq!(error_code(&bad_timeout), Some("bad_params"));

    let selected = request(
        &mut stdin,
        &mut reader,
        "5",
        "backend.select",
        json!({ "baseUrl": backend.base_url, "timeoutSecs": 5 }),
    );
    assert_eq!(selected["ok"], true);

    let opened = request(
        &mut stdin,
        &mut reader,
        "6",
        "view.open",
        json!({ "courseId": "bio101" }),
    );
    assert_eq!(opened["result"]["status"], "ready");

    let health = request(&mut stdin, &mut reader, "7", "health", json!({}));
    assert_eq!(health["result"]["openViews"], 1);
    assert!(health["result"]["backendUrl"]
        .as_str()
        .map(|u| u.starts_with(&backend.base_url))
        .unwrap_or(false));

    let missing_course = request(&mut stdin, &mut reader, "8", "view.open", json!({}));
    assert_eq!(error_code(&missing_course), Some("bad_params"));

    let unknown = request(&mut stdin, &mut reader, "9", "grades.export", json!({}));
    assert_eq!(error_code(&unknown), Some("not_implemented"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn malformed_lines_get_bad_json_and_blank_lines_are_skipped() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin).expect("write blank line");
    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");

    let reply = read_reply(&mut reader);
    assert_eq!(reply["ok"], false);
    assert_eq!(error_code(&reply), Some("bad_json"));
    assert!(reply.get("id").is_none());

    // The loop keeps serving after a bad line.
    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"], true);

    stdin.write_all(b"\xff\xfe garbage\n").expect("write invalid utf-8");
    stdin.flush().expect("flush");
    let reply = read_reply(&mut reader);
    assert_eq!(error_code(&reply), Some("bad_json"));
    assert!(reply.get("id").is_none());

    let health = request(&mut stdin, &mut reader, "2", "health", json!({}));
    assert_eq!(health["ok"], true);

    drop(stdin);
    let _ = child.wait();
}
