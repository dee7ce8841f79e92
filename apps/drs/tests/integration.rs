//! Integration tests for the drs CLI

use httpmock::prelude::*;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

const ENV_VARS: [&str; 7] = [
    "DRS_WORKERS",
    "DRS_RETRIES",
    "DRS_SUPPRESS_SSL_VERIFY",
    "DRS_OUTPUT_DIR",
    "DRS_CHECKSUM",
    "DRS_AUTH_TOKEN",
    "RUST_LOG",
];

fn sha256_hex(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Scratch directory holding a config with fast, retry-free networking
fn workspace() -> TempDir {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[network]\nretries = 0\nretry_delay_ms = 1\n",
    )
    .unwrap();
    dir
}

fn drs(dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_drs"));
    for var in ENV_VARS {
        command.env_remove(var);
    }
    command
        .arg("--config")
        .arg(dir.join("config.toml"))
        .args(args)
        .output()
        .expect("Failed to execute drs")
}

fn blob_doc(server: &MockServer, id: &str, body: &[u8]) -> Value {
    json!({
        "id": id,
        "name": format!("{id}.txt"),
        "size": body.len(),
        "checksums": [{"type": "sha-256", "checksum": sha256_hex(body)}],
        "access_methods": [{"type": "https", "access_url": {"url": server.url(format!("/data/{id}"))}}]
    })
}

fn serve_blob(server: &MockServer, id: &str, declared: &[u8], served: &'static [u8]) {
    let doc = blob_doc(server, id, declared);
    server.mock(|when, then| {
        when.method(GET).path(format!("/ga4gh/drs/v1/objects/{id}"));
        then.status(200).json_body(doc);
    });
    server.mock(|when, then| {
        when.method(GET).path(format!("/data/{id}"));
        then.status(200).body(served);
    });
}

#[test]
fn test_schemes_lists_supported_schemes_and_algorithms() {
    let dir = workspace();
    let output = drs(dir.path(), &["schemes"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("http, https"), "{stdout}");
    for algorithm in ["sha-256", "sha-512", "md5"] {
        assert!(stdout.contains(algorithm), "{stdout}");
    }
}

#[test]
fn test_schemes_json_output() {
    let dir = workspace();
    let output = drs(dir.path(), &["--json", "schemes"]);

    assert!(output.status.success());
    let listed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed["url_schemes"], json!(["http", "https"]));
    assert_eq!(listed["checksum_algorithms"].as_array().unwrap().len(), 3);
}

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_drs"))
        .arg("--version")
        .output()
        .expect("Failed to execute drs");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("drs"));
}

#[test]
fn test_cli_help_lists_get() {
    let output = Command::new(env!("CARGO_BIN_EXE_drs"))
        .arg("--help")
        .output()
        .expect("Failed to execute drs");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("get"));
}

#[test]
fn test_unsupported_url_scheme_exits_with_one() {
    let dir = workspace();
    let output = drs(dir.path(), &["get", "ftp://example.org", "obj1"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_zero_workers_exits_with_one() {
    let dir = workspace();
    let output = drs(
        dir.path(),
        &["get", "https://example.org", "obj1", "--workers", "0"],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--workers"));
}

#[test]
fn test_metadata_is_printed_to_stdout() {
    let server = MockServer::start();
    serve_blob(&server, "obj2", b"hello", b"hello");
    let dir = workspace();

    let output = drs(dir.path(), &["get", &server.base_url(), "obj2"]);

    assert!(output.status.success());
    let printed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed["id"], "obj2");
}

#[test]
fn test_silent_metadata_to_file() {
    let server = MockServer::start();
    serve_blob(&server, "obj2", b"hello", b"hello");
    let dir = workspace();
    let metadata = dir.path().join("meta.json");

    let output = drs(
        dir.path(),
        &[
            "get",
            &server.base_url(),
            "obj2",
            "--silent",
            "--output-metadata",
            metadata.to_str().unwrap(),
        ],
    );

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&metadata).unwrap()).unwrap();
    assert_eq!(written["name"], "obj2.txt");
}

#[test]
fn test_download_writes_file_and_report() {
    let server = MockServer::start();
    serve_blob(&server, "obj2", b"hello", b"hello");
    let dir = workspace();
    let out = dir.path().join("out");
    let report = dir.path().join("report.json");

    let output = drs(
        dir.path(),
        &[
            "get",
            &server.base_url(),
            "obj2",
            "-d",
            "-o",
            out.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
            "--silent",
        ],
    );

    assert!(output.status.success());
    assert_eq!(std::fs::read(out.join("obj2")).unwrap(), b"hello");
    let report: Value = serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(report["succeeded"], 1);
    assert_eq!(report["failed"], 0);
}

#[test]
fn test_checksum_mismatch_exits_with_one() {
    let server = MockServer::start();
    serve_blob(&server, "obj4", b"BBB", b"XXX");
    let dir = workspace();
    let out = dir.path().join("out");

    let output = drs(
        dir.path(),
        &[
            "get",
            &server.base_url(),
            "obj4",
            "--download",
            "--output-dir",
            out.to_str().unwrap(),
            "--silent",
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    // Mismatched bytes are kept for inspection
    assert!(out.join("obj4").exists());
}

#[test]
fn test_unreachable_root_exits_with_one() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/ga4gh/drs/v1/objects/missing");
        then.status(404);
    });
    let dir = workspace();

    let output = drs(dir.path(), &["get", &server.base_url(), "missing", "-d"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing"));
}

#[test]
fn test_json_summary_for_bundle() {
    let server = MockServer::start();
    serve_blob(&server, "obj2", b"AAA", b"AAA");
    server.mock(|when, then| {
        when.method(GET).path("/ga4gh/drs/v1/objects/obj1");
        then.status(200)
            .json_body(json!({"id": "obj1", "contents": [{"id": "obj2", "name": "obj2"}]}));
    });
    let dir = workspace();
    let out = dir.path().join("out");
    let metadata = dir.path().join("meta.json");

    let output = drs(
        dir.path(),
        &[
            "get",
            &server.base_url(),
            "obj1",
            "-d",
            "-o",
            out.to_str().unwrap(),
            "--output-metadata",
            metadata.to_str().unwrap(),
            "--json",
        ],
    );

    assert!(output.status.success());
    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["entries"][0]["object_id"], "obj2");
    assert_eq!(summary["succeeded"], 1);
}
