//! Binary-level tests: output, diagnostics and exit codes

use assert_cmd::Command;
use predicates::prelude::*;
use scriptgrab::test_utils::{TestEnvironment, TestGit};
use std::io::{BufRead, BufReader, Read};
use std::net::TcpListener;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

fn scriptgrab(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("scriptgrab").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("SCRIPTGRAB_CONFIG")
        .arg("--config")
        .arg(config);
    cmd
}

#[test]
fn test_install_then_status() {
    let env = TestEnvironment::new().unwrap();
    let config = env.write_config().unwrap();

    scriptgrab(&config)
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("$ git clone"))
        .stdout(predicate::str::contains("ScriptGrab installed"));

    scriptgrab(&config)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("executable"))
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn test_second_install_fails_with_hint() {
    let env = TestEnvironment::new().unwrap();
    let config = env.write_config().unwrap();
    scriptgrab(&config).arg("install").assert().success();
    let target = std::fs::read_link(env.link_path()).unwrap();

    scriptgrab(&config)
        .arg("install")
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("error: "))
        .stderr(predicate::str::contains("already exists"))
        .stderr(predicate::str::contains("hint: "));

    assert_eq!(std::fs::read_link(env.link_path()).unwrap(), target);
}

#[test]
fn test_update_before_install() {
    let env = TestEnvironment::new().unwrap();
    let config = env.write_config().unwrap();

    scriptgrab(&config)
        .arg("update")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not installed"))
        .stderr(predicate::str::contains("scriptgrab install"));
    assert!(!env.store_root().exists());
}

#[test]
fn test_update_reports_up_to_date() {
    let env = TestEnvironment::new().unwrap();
    let config = env.write_config().unwrap();
    scriptgrab(&config).arg("install").assert().success();

    scriptgrab(&config)
        .arg("update")
        .assert()
        .success()
        .stdout(predicate::str::contains("$ git"))
        .stdout(predicate::str::contains("already up to date"));
}

#[test]
fn test_diverged_update_exits_one() {
    let env = TestEnvironment::new().unwrap();
    let config = env.write_config().unwrap();
    scriptgrab(&config).arg("install").assert().success();

    env.remote.commit_file("tools/remote.sh", "remote\n", "Remote change").unwrap();
    let local = TestGit::new(env.store_root());
    local.config_user().unwrap();
    std::fs::write(env.store_root().join("local.txt"), "local\n").unwrap();
    local.add_all().unwrap();
    local.commit("Local change").unwrap();
    let head = local.rev_parse_head().unwrap();

    scriptgrab(&config)
        .arg("update")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("diverged"));
    assert_eq!(local.rev_parse_head().unwrap(), head);
}

#[test]
fn test_status_reports_stale_link() {
    let env = TestEnvironment::new().unwrap();
    let config = env.write_config().unwrap();
    scriptgrab(&config).arg("install").assert().success();

    std::fs::remove_file(env.link_path()).unwrap();
    std::os::unix::fs::symlink(env.root().join("moved-away.sh"), env.link_path()).unwrap();

    scriptgrab(&config)
        .arg("status")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("stale"))
        .stderr(predicate::str::contains("points to missing launcher"));
}

#[test]
fn test_status_when_not_installed() {
    let env = TestEnvironment::new().unwrap();
    let config = env.write_config().unwrap();

    scriptgrab(&config)
        .arg("status")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("not installed"));
}

#[test]
fn test_self_update_requires_trust() {
    let env = TestEnvironment::new().unwrap();
    let config = env.write_config().unwrap();

    scriptgrab(&config)
        .arg("self-update")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not authorized"))
        .stderr(predicate::str::contains("--trust-remote-code"));
}

#[test]
fn test_self_update_fetch_error_exits_one() {
    let mut env = TestEnvironment::new().unwrap();
    env.config.self_update.url = "http://example.com/update.py".to_string();
    let config = env.write_config().unwrap();

    scriptgrab(&config)
        .args(["self-update", "--trust-remote-code"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("warning: executing remote code"))
        .stderr(predicate::str::contains("invalid fetch URL"));
}

#[test]
fn test_invalid_config_is_reported() {
    let env = TestEnvironment::new().unwrap();
    let config = env.root().join("broken.toml");
    std::fs::write(&config, "link_path = \"relative/sg\"\n").unwrap();

    scriptgrab(&config)
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("link_path"))
        .stderr(predicate::str::contains("config init --force"));
}

#[test]
fn test_config_init_path_show() {
    let env = TestEnvironment::new().unwrap();
    let config = env.root().join("fresh").join("config.toml");

    scriptgrab(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(config.display().to_string()));

    scriptgrab(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found, using defaults"))
        .stdout(predicate::str::contains("/usr/local/bin/sg"));

    scriptgrab(&config).args(["config", "init"]).assert().success();
    assert!(config.is_file());

    scriptgrab(&config)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let env = TestEnvironment::new().unwrap();
    let config = env.write_config().unwrap();

    scriptgrab(&config).args(["-v", "-q", "status"]).assert().failure();
}

#[test]
fn test_interrupt_exits_130() {
    // Accepts connections but never answers, so the fetch blocks
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut env = TestEnvironment::new().unwrap();
    env.config.self_update.url = format!("https://127.0.0.1:{port}/update.sh");
    env.config.self_update.timeout_secs = 60;
    let config = env.write_config().unwrap();

    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("scriptgrab"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("SCRIPTGRAB_CONFIG")
        .arg("--config")
        .arg(&config)
        .args(["self-update", "--trust-remote-code"])
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let mut stderr = BufReader::new(child.stderr.take().unwrap());
    let mut line = String::new();
    while !line.contains("warning:") {
        line.clear();
        assert_ne!(stderr.read_line(&mut line).unwrap(), 0, "scriptgrab exited before fetching");
    }
    std::thread::sleep(Duration::from_millis(200));

    let status = std::process::Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let mut rest = String::new();
    stderr.read_to_string(&mut rest).unwrap();
    let exit = child.wait().unwrap();

    assert_eq!(exit.code(), Some(130));
    assert!(rest.contains("Aborted by user."), "stderr: {rest}");
    drop(listener);
}
