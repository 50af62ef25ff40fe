use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn assetsync(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("assetsync").expect("assetsync binary");
    cmd.current_dir(cwd)
        .env("NO_COLOR", "1")
        .env_remove("BUILD_NUMBER")
        .env_remove("RUST_LOG");
    cmd
}

fn source_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("css")).unwrap();
    fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
    fs::write(dir.path().join("css").join("site.css"), "body{}").unwrap();
    dir
}

#[test]
fn dry_run_lists_plan_and_writes_nothing() {
    let src = source_tree();
    let bucket = TempDir::new().unwrap();

    assetsync(src.path())
        .args(["deploy", "--dry-run", "--release", "3", "--source", "."])
        .arg("--bucket")
        .arg(bucket.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("+ app.js"))
        .stdout(predicate::str::contains("+ css/site.css"))
        .stdout(predicate::str::contains("[dry-run]"));

    assert_eq!(fs::read_dir(bucket.path()).unwrap().count(), 0);
}

#[test]
fn deploy_then_redeploy_reports_no_changes() {
    let src = source_tree();
    let bucket = TempDir::new().unwrap();

    assetsync(src.path())
        .args(["deploy", "--yes", "--release", "3"])
        .arg("--bucket")
        .arg(bucket.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("upload"));
    assert!(bucket.path().join("css").join("site.css").is_file());

    assetsync(src.path())
        .args(["deploy", "--yes", "--release", "3"])
        .arg("--bucket")
        .arg(bucket.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "No changes detected. All files up-to-date.",
        ));
}

#[test]
fn release_comes_from_build_number() {
    let src = source_tree();
    let bucket = TempDir::new().unwrap();

    assetsync(src.path())
        .env("BUILD_NUMBER", "42")
        .args(["plan", "--json"])
        .arg("--bucket")
        .arg(bucket.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"release\": 42"));
}

#[test]
fn missing_release_is_rejected() {
    let src = source_tree();
    let bucket = TempDir::new().unwrap();

    assetsync(src.path())
        .arg("deploy")
        .arg("--bucket")
        .arg(bucket.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("release number is required"));
}

#[test]
fn plan_json_counts_actions() {
    let src = source_tree();
    let bucket = TempDir::new().unwrap();

    let output = assetsync(src.path())
        .args(["plan", "--json", "--release", "7"])
        .arg("--bucket")
        .arg(bucket.path())
        .output()
        .expect("run assetsync plan");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["release"], 7);
    assert_eq!(json["counts"]["upload"], 2);
    assert_eq!(json["entries"]["app.js"]["action"], "upload");
    assert!(json["generated_at"].is_string());
}

#[test]
fn config_file_supplies_bucket_and_release() {
    let src = source_tree();
    let bucket = TempDir::new().unwrap();
    fs::write(
        src.path().join("assetsync.yaml"),
        format!("bucket: {}\nrelease: 9\npattern: \"**/*.js\"\n", bucket.path().display()),
    )
    .unwrap();

    assetsync(src.path())
        .args(["plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+ app.js"))
        .stdout(predicate::str::contains("css/site.css").not());
}

#[test]
fn default_config_file_is_not_uploaded() {
    let src = source_tree();
    let bucket = TempDir::new().unwrap();
    fs::write(
        src.path().join("assetsync.yaml"),
        format!("bucket: {}\nrelease: 3\n", bucket.path().display()),
    )
    .unwrap();

    assetsync(src.path())
        .args(["plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+ app.js"))
        .stdout(predicate::str::contains("assetsync.yaml").not())
        .stdout(predicate::str::contains("Plan: 2 to upload"));

    assetsync(src.path())
        .args(["deploy", "--yes"])
        .assert()
        .success();
    assert!(bucket.path().join("app.js").is_file());
    assert!(!bucket.path().join("assetsync.yaml").exists());
}

#[test]
fn quiet_yes_redeploy_prints_nothing() {
    let src = source_tree();
    let bucket = TempDir::new().unwrap();

    assetsync(src.path())
        .args(["deploy", "--yes", "--quiet", "--release", "3"])
        .arg("--bucket")
        .arg(bucket.path())
        .assert()
        .success();

    assetsync(src.path())
        .args(["deploy", "--yes", "--quiet", "--release", "3"])
        .arg("--bucket")
        .arg(bucket.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn unknown_bucket_scheme_fails() {
    let src = source_tree();

    assetsync(src.path())
        .args(["plan", "--release", "1", "--bucket", "s3://assets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported bucket locator"));
}
