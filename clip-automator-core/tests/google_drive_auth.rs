use std::io::Write;
use std::path::{Path, PathBuf};

use clip_automator_core::config::DriveSettings;
use clip_automator_core::contract::DriveError;
use clip_automator_core::google_drive::GoogleDriveClient;
use clip_automator_core::upload::upload_via_service_account;
use tempfile::{tempdir, NamedTempFile};

fn settings_with_key(key: &Path, staging: &Path) -> DriveSettings {
    DriveSettings {
        parent_folder_id: "parent-root".to_string(),
        subfolder: "TikTok Clips".to_string(),
        credentials_file: key.to_path_buf(),
        staging_dir: Some(staging.to_path_buf()),
    }
}

#[tokio::test]
async fn missing_credentials_file_is_an_auth_error() {
    let staging = tempdir().unwrap();
    let key = staging.path().join("creds.json");
    let settings = settings_with_key(&key, staging.path());

    let mut stream: &[u8] = b"payload";
    let err = upload_via_service_account(&settings, "clip.mp4", &mut stream)
        .await
        .unwrap_err();

    assert!(matches!(err, DriveError::Auth(_)), "got {err:?}");
    assert!(std::fs::read_dir(staging.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn non_key_json_is_an_auth_error() {
    let mut key = NamedTempFile::new().unwrap();
    write!(key, r#"{{"type": "authorized_user", "client_id": "x"}}"#).unwrap();

    let err = GoogleDriveClient::connect(key.path())
        .await
        .err()
        .expect("connect must fail");
    assert!(matches!(err, DriveError::Auth(_)), "got {err:?}");
}

/// Needs a real service-account key and a Drive folder shared with it:
/// `CLIP_AUTOMATOR_CREDS` and `CLIP_AUTOMATOR_PARENT_FOLDER_ID`.
#[tokio::test]
#[ignore = "talks to Google Drive"]
async fn uploads_small_file_to_drive() {
    let key = PathBuf::from(std::env::var("CLIP_AUTOMATOR_CREDS").expect("CLIP_AUTOMATOR_CREDS"));
    let parent = std::env::var("CLIP_AUTOMATOR_PARENT_FOLDER_ID")
        .expect("CLIP_AUTOMATOR_PARENT_FOLDER_ID");
    let staging = tempdir().unwrap();
    let mut settings = settings_with_key(&key, staging.path());
    settings.parent_folder_id = parent;

    let mut stream: &[u8] = b"clip-automator integration payload";
    let id = upload_via_service_account(&settings, "integration_test.txt", &mut stream)
        .await
        .expect("upload should succeed");
    assert!(!id.is_empty());
    assert!(std::fs::read_dir(staging.path()).unwrap().next().is_none());
}
