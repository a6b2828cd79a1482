//! Self-update tests against the real HTTP fetcher
//!
//! Every fetch here fails locally (bad scheme, refused connection), so no
//! script is ever executed and no network access is needed.

use scriptgrab::config::SelfUpdateSettings;
use scriptgrab::core::{FetchError, ScriptGrabError};
use scriptgrab::fetch::HttpFetcher;
use scriptgrab::upgrade::SelfUpdater;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn settings(url: String) -> SelfUpdateSettings {
    SelfUpdateSettings {
        url,
        interpreter: "sh".to_string(),
        timeout_secs: 5,
        ..SelfUpdateSettings::default()
    }
}

fn is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

#[tokio::test]
async fn test_refused_fetch_leaves_no_transient_file() {
    let temp = TempDir::new().unwrap();
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let settings = settings(format!("https://127.0.0.1:{port}/update.sh"));
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let err = SelfUpdater::new(fetcher, settings)
        .trust_remote_code(true)
        .with_temp_dir(temp.path())
        .run_self_update()
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ScriptGrabError>(),
        Some(ScriptGrabError::Fetch(FetchError::Transport { .. }))
    ));
    assert!(is_empty(temp.path()));
}

#[tokio::test]
async fn test_plain_http_is_rejected() {
    let temp = TempDir::new().unwrap();
    let settings = settings("http://example.com/update.sh".to_string());
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

    let err = SelfUpdater::new(fetcher, settings)
        .trust_remote_code(true)
        .with_temp_dir(temp.path())
        .run_self_update()
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ScriptGrabError>(),
        Some(ScriptGrabError::Fetch(FetchError::InvalidUrl { .. }))
    ));
    assert!(is_empty(temp.path()));
}
