//! Update lifecycle tests

use scriptgrab::core::{EXIT_FAILURE, ScriptGrabError, exit_code};
use scriptgrab::installer::Installer;
use scriptgrab::publish::{GlobalCommandLink, LinkState};
use scriptgrab::updater::{UpdateResult, Updater};
use scriptgrab::test_utils::{TestEnvironment, TestGit};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

fn launcher_mode(env: &TestEnvironment) -> u32 {
    std::fs::metadata(env.launcher_path()).unwrap().permissions().mode() & 0o777
}

fn snapshot(root: &Path) -> Vec<(String, String, u32)> {
    let mut entries = Vec::new();
    for name in ["scriptgrab.sh", "tools/passgen.sh"] {
        let path = root.join(name);
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        entries.push((name.to_string(), std::fs::read_to_string(&path).unwrap(), mode));
    }
    entries
}

#[tokio::test]
async fn test_update_before_install_creates_nothing() {
    let env = TestEnvironment::new().unwrap();

    let err = Updater::from_config(&env.config).update().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ScriptGrabError>(),
        Some(ScriptGrabError::NotInstalled { .. })
    ));
    assert_eq!(exit_code(&err), EXIT_FAILURE);
    assert!(!env.store_root().exists());
}

#[tokio::test]
async fn test_repeated_update_is_a_noop() {
    let env = TestEnvironment::new().unwrap();
    Installer::from_config(&env.config).install().await.unwrap();
    let updater = Updater::from_config(&env.config);
    let head = env.remote.head().unwrap();

    let before = snapshot(&env.store_root());
    for _ in 0..2 {
        let result = updater.update().await.unwrap();
        assert_eq!(
            result,
            UpdateResult::UpToDate {
                commit: head.clone()
            }
        );
        assert_eq!(snapshot(&env.store_root()), before);
    }
}

#[tokio::test]
async fn test_update_fast_forwards_remote_changes() {
    let env = TestEnvironment::new().unwrap();
    Installer::from_config(&env.config).install().await.unwrap();
    let old_head = env.remote.head().unwrap();
    let new_head =
        env.remote.commit_file("tools/speedtest.sh", "#!/bin/sh\necho fast\n", "Add speed test").unwrap();

    let result = Updater::from_config(&env.config).update().await.unwrap();
    assert_eq!(
        result,
        UpdateResult::FastForwarded {
            from: old_head,
            to: new_head.clone()
        }
    );
    assert!(env.store_root().join("tools").join("speedtest.sh").is_file());
    assert_ne!(launcher_mode(&env) & 0o111, 0);

    // Nothing further to do
    let result = Updater::from_config(&env.config).update().await.unwrap();
    assert_eq!(
        result,
        UpdateResult::UpToDate {
            commit: new_head
        }
    );
}

#[tokio::test]
async fn test_update_replaces_launcher_changed_upstream() {
    let env = TestEnvironment::new().unwrap();
    Installer::from_config(&env.config).install().await.unwrap();
    let old_head = env.remote.head().unwrap();
    let new_body = "#!/bin/sh\necho v2\n";
    let new_head = env.remote.commit_file("scriptgrab.sh", new_body, "Launcher v2").unwrap();

    let result = Updater::from_config(&env.config).update().await.unwrap();
    assert_eq!(
        result,
        UpdateResult::FastForwarded {
            from: old_head,
            to: new_head
        }
    );
    assert_eq!(std::fs::read_to_string(env.launcher_path()).unwrap(), new_body);
    assert_ne!(launcher_mode(&env) & 0o111, 0);
    assert_eq!(TestGit::new(env.store_root()).status_porcelain().unwrap(), "");

    // A second launcher change still applies cleanly
    let newer = env.remote.commit_file("scriptgrab.sh", "#!/bin/sh\necho v3\n", "Launcher v3").unwrap();
    let result = Updater::from_config(&env.config).update().await.unwrap();
    assert!(matches!(result, UpdateResult::FastForwarded { to, .. } if to == newer));
    assert_ne!(launcher_mode(&env) & 0o111, 0);
}

#[tokio::test]
async fn test_install_leaves_clean_working_tree() {
    let env = TestEnvironment::new().unwrap();
    Installer::from_config(&env.config).install().await.unwrap();

    assert_ne!(launcher_mode(&env) & 0o111, 0);
    assert_eq!(TestGit::new(env.store_root()).status_porcelain().unwrap(), "");
}

#[tokio::test]
async fn test_update_reapplies_execute_bit() {
    let env = TestEnvironment::new().unwrap();
    Installer::from_config(&env.config).install().await.unwrap();
    std::fs::set_permissions(env.launcher_path(), std::fs::Permissions::from_mode(0o644)).unwrap();

    Updater::from_config(&env.config).update().await.unwrap();
    assert_eq!(launcher_mode(&env), 0o755);
}

#[tokio::test]
async fn test_diverged_history_scenario() {
    let env = TestEnvironment::new().unwrap();
    Installer::from_config(&env.config).install().await.unwrap();
    assert!(matches!(
        GlobalCommandLink::from_config(&env.config).resolve().await.unwrap(),
        LinkState::Valid { .. }
    ));

    // Remote and local both move on independently
    env.remote.commit_file("tools/remote.sh", "remote\n", "Remote change").unwrap();
    let local = TestGit::new(env.store_root());
    local.config_user().unwrap();
    std::fs::write(env.store_root().join("local.txt"), "local\n").unwrap();
    local.add_all().unwrap();
    local.commit("Local change").unwrap();
    let local_head = local.rev_parse_head().unwrap();
    let before = snapshot(&env.store_root());

    let err = Updater::from_config(&env.config).update().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ScriptGrabError>(),
        Some(ScriptGrabError::DivergedHistory { .. })
    ));
    assert_eq!(exit_code(&err), EXIT_FAILURE);

    assert_eq!(local.rev_parse_head().unwrap(), local_head);
    assert_eq!(local.status_porcelain().unwrap(), "");
    assert_eq!(snapshot(&env.store_root()), before);
    assert!(!env.store_root().join("tools").join("remote.sh").exists());
}
