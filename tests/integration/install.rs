//! Install lifecycle tests

use scriptgrab::core::ScriptGrabError;
use scriptgrab::installer::Installer;
use scriptgrab::publish::{GlobalCommandLink, LinkState};
use scriptgrab::store::StoreLock;
use scriptgrab::test_utils::{LAUNCHER_SCRIPT, TestEnvironment};
use std::os::unix::fs::PermissionsExt;

#[tokio::test]
async fn test_install_exposes_executable_launcher() {
    let env = TestEnvironment::new().unwrap();

    Installer::from_config(&env.config).install().await.unwrap();

    let resolved = std::fs::canonicalize(env.link_path()).unwrap();
    assert!(resolved.starts_with(std::fs::canonicalize(env.store_root()).unwrap()));

    let metadata = std::fs::metadata(&resolved).unwrap();
    assert!(metadata.is_file());
    assert_ne!(metadata.permissions().mode() & 0o111, 0);
    assert_eq!(std::fs::read_to_string(&resolved).unwrap(), LAUNCHER_SCRIPT);

    // The store is a full working tree tracking the remote
    assert!(env.store_root().join(".git").is_dir());
    assert!(env.store_root().join("tools").join("passgen.sh").is_file());
}

#[tokio::test]
async fn test_second_install_is_refused_and_link_untouched() {
    let env = TestEnvironment::new().unwrap();
    let installer = Installer::from_config(&env.config);
    installer.install().await.unwrap();

    let link = GlobalCommandLink::from_config(&env.config);
    let before = link.resolve().await.unwrap();
    let before_meta = std::fs::symlink_metadata(env.link_path()).unwrap();

    let err = installer.install().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ScriptGrabError>(),
        Some(ScriptGrabError::AlreadyInstalled { .. })
    ));

    assert_eq!(link.resolve().await.unwrap(), before);
    let after_meta = std::fs::symlink_metadata(env.link_path()).unwrap();
    assert_eq!(before_meta.modified().unwrap(), after_meta.modified().unwrap());
}

#[tokio::test]
async fn test_existing_store_directory_blocks_install() {
    let env = TestEnvironment::new().unwrap();
    std::fs::create_dir_all(env.store_root()).unwrap();
    std::fs::write(env.store_root().join("notes.txt"), "mine").unwrap();

    let err = Installer::from_config(&env.config).install().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ScriptGrabError>(),
        Some(ScriptGrabError::AlreadyInstalled { .. })
    ));
    assert_eq!(std::fs::read_to_string(env.store_root().join("notes.txt")).unwrap(), "mine");
    assert_eq!(
        GlobalCommandLink::from_config(&env.config).resolve().await.unwrap(),
        LinkState::Missing
    );
}

#[tokio::test]
async fn test_install_replaces_stale_link() {
    let env = TestEnvironment::new().unwrap();
    std::os::unix::fs::symlink(env.root().join("gone.sh"), env.link_path()).unwrap();

    Installer::from_config(&env.config).install().await.unwrap();

    assert_eq!(
        GlobalCommandLink::from_config(&env.config).resolve().await.unwrap(),
        LinkState::Valid {
            target: env.launcher_path()
        }
    );
}

#[tokio::test]
async fn test_concurrent_install_gets_store_locked() {
    let env = TestEnvironment::new().unwrap();
    let _held = StoreLock::acquire(&env.store_root()).await.unwrap();

    let err = Installer::from_config(&env.config).install().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ScriptGrabError>(),
        Some(ScriptGrabError::StoreLocked { .. })
    ));
    assert!(!env.store_root().exists());
}
