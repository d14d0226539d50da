use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn loom() -> Command {
    let mut cmd = Command::cargo_bin("loom").unwrap();
    cmd.env_remove("LOOM_API_URL").env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    loom()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("projects"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_set_then_get() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    loom()
        .args(["--config", path.to_str().unwrap(), "config", "set", "ai-model", "gemini-2.5-pro"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Gemini 2.5 Pro"));

    loom()
        .args(["--config", path.to_str().unwrap(), "config", "get", "ai-model"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gemini-2.5-pro"));

    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("ai_model"));
}

#[test]
fn test_config_rejects_unknown_model() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    loom()
        .args(["--config", path.to_str().unwrap(), "config", "set", "ai-model", "gpt-4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid model 'gpt-4'"));
}

#[test]
fn test_config_get_defaults_without_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    loom()
        .args(["--config", path.to_str().unwrap(), "config", "get", "api-url"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://127.0.0.1:8000"));
}

#[test]
fn test_projects_reports_unreachable_server() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    loom()
        .args([
            "--config",
            path.to_str().unwrap(),
            "--api-url",
            "http://127.0.0.1:9",
            "projects",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_invalid_api_url_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    loom()
        .args(["--config", path.to_str().unwrap(), "--api-url", "ftp://x", "projects"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("http://"));
}
