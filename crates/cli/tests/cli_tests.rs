// Integration tests for the apiparity binary: exit codes, stdout contract,
// and end-to-end runs against mock targets.
//
// Run with: cargo test -p apiparity-cli --test cli_tests -- --nocapture

use std::path::Path;
use std::process::{Command, Output};

use httpmock::prelude::*;
use serde_json::json;

fn apiparity() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_apiparity"));
    cmd.env_remove("APIPARITY_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_config(dir: &Path, local: &str, reference: &str, extra: &str) -> std::path::PathBuf {
    let path = dir.join("apiparity.toml");
    std::fs::write(
        &path,
        format!(
            "[local]\nbase_url = \"{local}\"\n\n[reference]\nbase_url = \"{reference}\"\n\n{extra}"
        ),
    )
    .unwrap();
    path
}

fn report_with(
    results: serde_json::Value,
    matches: usize,
    differences: usize,
) -> serde_json::Value {
    json!({
        "timestamp": "2026-01-01T00:00:00.000Z",
        "summary": {
            "total_tests": matches + differences,
            "matches": matches,
            "differences": differences,
        },
        "results": results,
    })
}

// ===========================================================================
// apiparity analyze
// ===========================================================================

#[test]
fn analyze_missing_report_exits_6() {
    let dir = tempfile::tempdir().unwrap();
    let output = apiparity()
        .args(["analyze"])
        .arg(dir.path().join("nope.json"))
        .output()
        .expect("apiparity analyze");

    assert_eq!(output.status.code(), Some(6), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("apiparity run"));
}

#[test]
fn analyze_clean_report_says_no_issues() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    let results = json!([{
        "endpoint": "/workspaces",
        "method": "GET",
        "local_status": 200,
        "reference_status": 200,
        "status_match": true,
        "body_diff": [],
        "missing_fields": [],
        "extra_fields": [],
        "overall_match": true,
    }]);
    std::fs::write(&path, report_with(results, 1, 0).to_string()).unwrap();

    let output = apiparity().arg("analyze").arg(&path).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("No issues found"));
}

#[test]
fn analyze_json_lists_issues_and_writes_fix_request() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    let fix = dir.path().join("out/fix_request.md");
    let results = json!([{
        "endpoint": "/projects/1",
        "method": "GET",
        "local_status": 200,
        "reference_status": 200,
        "status_match": true,
        "body_diff": [],
        "missing_fields": ["data.notes"],
        "extra_fields": [],
        "overall_match": false,
    }]);
    std::fs::write(&path, report_with(results, 0, 1).to_string()).unwrap();

    let output = apiparity()
        .arg("analyze")
        .arg(&path)
        .arg("--json")
        .arg("--fix-request")
        .arg(&fix)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val: serde_json::Value = serde_json::from_str(stdout(&output).trim())
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {e}\n{}", stdout(&output)));
    assert_eq!(val["mismatches"], 1);
    assert_eq!(val["issues"][0]["endpoint"], "/projects/1");
    assert_eq!(val["issues"][0]["missing_fields"], json!(["data.notes"]));

    let text = std::fs::read_to_string(&fix).unwrap();
    assert!(text.contains("GET /projects/1"));
    assert!(text.contains("`data.notes`"));
}

// ===========================================================================
// apiparity validate
// ===========================================================================

#[test]
fn validate_accepts_good_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://localhost:8000", "https://ref.example.com", "");

    let output = apiparity().arg("validate").arg("--config").arg(&config).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Config OK"));
    assert!(out.contains("built-in catalog"));
}

#[test]
fn validate_rejects_bad_url_with_exit_3() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "not a url", "https://ref.example.com", "");

    let output = apiparity().arg("validate").arg("--config").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).starts_with("error:"));
}

#[test]
fn missing_config_exits_3_with_hint() {
    let dir = tempfile::tempdir().unwrap();
    let output = apiparity()
        .arg("validate")
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("hint:"));
}

// ===========================================================================
// apiparity run
// ===========================================================================

#[test]
fn run_matching_targets_exits_0_and_writes_report() {
    let local = MockServer::start();
    let reference = MockServer::start();
    for server in [&local, &reference] {
        server.mock(|when, then| {
            when.method(GET).path("/workspaces").query_param("limit", "5");
            then.status(200).json_body(json!({"data": [{"gid": "1", "name": "Acme"}]}));
        });
    }

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &local.base_url(),
        &reference.base_url(),
        "[[endpoints]]\nmethod = \"GET\"\npath = \"/workspaces\"\n",
    );

    let output = apiparity().arg("run").arg("--config").arg(&config).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Differences: 0"));

    let report: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("api_comparison_report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["summary"]["total_tests"], 1);
    assert_eq!(report["summary"]["matches"], 1);
    assert_eq!(report["results"][0]["overall_match"], true);
}

#[test]
fn run_with_differences_exits_1_and_writes_prompt() {
    let local = MockServer::start();
    let reference = MockServer::start();
    local.mock(|when, then| {
        when.method(GET).path("/projects/p1");
        then.status(200).json_body(json!({"data": {"name": "Launch"}}));
    });
    reference.mock(|when, then| {
        when.method(GET).path("/projects/p1");
        then.status(200).json_body(json!({"data": {"name": "Launch", "notes": ""}}));
    });

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &local.base_url(),
        &reference.base_url(),
        "[run]\nprobe_not_found = false\n\n\
         [samples.static]\nproject = [\"p1\"]\n\n\
         [[endpoints]]\nmethod = \"GET\"\npath = \"/projects/{project_gid}\"\n",
    );
    let report = dir.path().join("reports/run.json");
    let prompt = dir.path().join("prompt.md");

    let output = apiparity()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .arg("--report")
        .arg(&report)
        .arg("--prompt")
        .arg(&prompt)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("MISMATCH GET /projects/p1"));
    assert!(report.exists());
    let text = std::fs::read_to_string(&prompt).unwrap();
    assert!(text.contains("/projects/p1"));
}

#[test]
fn run_rejects_zero_workers_with_exit_2() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://localhost:8000", "https://ref.example.com", "");
    let output = apiparity()
        .args(["run", "--workers", "0", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn run_with_unopenable_sample_database_exits_5() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "http://localhost:8000",
        "https://ref.example.com",
        "[samples]\ndatabase = \"missing/samples.db\"\n",
    );
    let output = apiparity().arg("run").arg("--config").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(5), "stderr: {}", stderr(&output));
}

// ===========================================================================
// apiparity scenarios
// ===========================================================================

#[test]
fn scenarios_report_pass_and_fail() {
    let local = MockServer::start();
    let reference = MockServer::start();
    for server in [&local, &reference] {
        server.mock(|when, then| {
            when.method(GET).path("/users/me");
            then.status(200).json_body(json!({"data": {"name": "me"}}));
        });
    }
    local.mock(|when, then| {
        when.method(GET).path("/tasks/invalid-gid");
        then.status(500).json_body(json!({"errors": []}));
    });
    reference.mock(|when, then| {
        when.method(GET).path("/tasks/invalid-gid");
        then.status(404).json_body(json!({"errors": [{"message": "Not found"}]}));
    });

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &local.base_url(),
        &reference.base_url(),
        "[[scenarios]]\ndescription = \"me\"\nmethod = \"GET\"\n\
         path = \"/users/me\"\nexpected_status = 200\n\n\
         [[scenarios]]\ndescription = \"bad gid\"\nmethod = \"GET\"\n\
         path = \"/tasks/invalid-gid\"\nexpected_status = 404\n",
    );

    let output = apiparity().arg("scenarios").arg("--config").arg(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("PASS  me"));
    assert!(out.contains("FAIL  bad gid"));

    let report: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("status_scenarios_report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["total"], 2);
    assert_eq!(report["matches"], 1);
    assert_eq!(report["details"][1]["local_status"], 500);
}
