//! CLI contract tests.

use assert_cmd::Command;

fn cupid() -> Command {
    let mut cmd = Command::cargo_bin("cupid").expect("binary should build");
    let tmp = std::env::temp_dir();
    // Keep a developer's .env and environment out of the run.
    cmd.current_dir(tmp)
        .env_remove("CUPID_TELEGRAM_TOKEN")
        .env_remove("CUPID_ADMIN_CHAT_ID")
        .env_remove("CUPID_CHANNEL_ID")
        .env_remove("CUPID_DATABASE_URL");
    cmd
}

#[test]
fn start_without_configuration_fails() {
    let output = cupid().arg("start").output().expect("binary should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("CUPID_TELEGRAM_TOKEN"), "stderr: {stderr}");
}

#[test]
fn invalid_admin_chat_fails() {
    let output = cupid()
        .arg("start")
        .env("CUPID_TELEGRAM_TOKEN", "123:abc")
        .env("CUPID_ADMIN_CHAT_ID", "admins")
        .env("CUPID_CHANNEL_ID", "@valentines")
        .output()
        .expect("binary should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("CUPID_ADMIN_CHAT_ID"), "stderr: {stderr}");
}

#[test]
fn init_db_creates_database_file() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let db = tmp.path().join("cupid.db");
    let url = format!("sqlite://{}", db.display());

    cupid()
        .arg("init-db")
        .env("CUPID_DATABASE_URL", &url)
        .assert()
        .success();
    assert!(db.exists());

    // Idempotent.
    cupid()
        .arg("init-db")
        .env("CUPID_DATABASE_URL", &url)
        .assert()
        .success();
}

#[test]
fn unknown_subcommand_is_rejected() {
    cupid().arg("serve").assert().failure();
}
