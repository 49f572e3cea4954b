use assert_cmd::Command; // Bring Command into scope
use predicates::prelude::*; // Bring predicate traits into scope
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_health_json_default_is_healthy() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("detectviz")?;
    cmd.args(["health", "--json", "--details"]);

    let output = cmd.assert().success().get_output().stdout.clone();
    let report: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(report["status"], "healthy");
    assert_eq!(report["details"]["total_count"], 1);
    assert_eq!(report["plugins"]["core-environment-check"]["status"], "healthy");
    Ok(())
}

#[test]
fn test_health_text_output() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("detectviz")?;
    cmd.arg("health");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Overall: healthy"))
        .stdout(predicate::str::contains("core-environment-check").not());
    Ok(())
}

#[test]
fn test_health_unhealthy_exits_nonzero() -> Result<(), Box<dyn std::error::Error>> {
    let config = write_config(
        r#"{"plugins": [{"name": "core-environment-check", "type": "environment_check",
            "config": {"required_paths": ["/definitely/not/here/detectviz"]}}]}"#,
    );
    let mut cmd = Command::cargo_bin("detectviz")?;
    cmd.arg("--config").arg(config.path()).args(["health", "--details"]);

    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Overall: unhealthy"))
        .stdout(predicate::str::contains("core-environment-check: unhealthy"));
    Ok(())
}

#[test]
fn test_plugins_list() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("detectviz")?;
    cmd.args(["plugins", "list"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Name: core-logging"))
        .stdout(predicate::str::contains("Name: core-environment-check"))
        .stdout(predicate::str::contains("Status: initialized"));
    Ok(())
}

#[test]
fn test_disabled_plugin_not_listed() -> Result<(), Box<dyn std::error::Error>> {
    let config = write_config(
        r#"{"plugins": [{"name": "core-environment-check", "type": "environment_check", "enabled": false}]}"#,
    );
    let mut cmd = Command::cargo_bin("detectviz")?;
    cmd.arg("--config").arg(config.path()).args(["plugins", "list"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("core-logging"))
        .stdout(predicate::str::contains("core-environment-check").not());
    Ok(())
}

#[test]
fn test_run_for_fixed_time() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("detectviz")?;
    cmd.args(["run", "--seconds", "1"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("detectviz running with 2 plugins"))
        .stdout(predicate::str::contains("Last health status: healthy"))
        .stdout(predicate::str::contains("Stopped."));
    Ok(())
}

#[test]
fn test_invalid_config_reports_error() -> Result<(), Box<dyn std::error::Error>> {
    let config = write_config(r#"{"plugins": [{"name": "", "type": "x"}]}"#);
    let mut cmd = Command::cargo_bin("detectviz")?;
    cmd.arg("--config").arg(config.path()).arg("health");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
    Ok(())
}

#[test]
fn test_invalid_log_level_fails_init() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("detectviz")?;
    cmd.args(["--log-level", "foo=notalevel", "health"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("core-logging"));
    Ok(())
}
