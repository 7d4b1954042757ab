use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clip_automator_core::config::DriveSettings;
use clip_automator_core::contract::{
    DriveError, DriveFile, MockDriveClient, NewDriveFile, FOLDER_MIME_TYPE,
};
use clip_automator_core::upload::{ensure_drive_subfolder, upload_to_drive};
use tempfile::{tempdir, TempDir};

fn folder(id: &str, name: &str) -> DriveFile {
    DriveFile {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: Some(FOLDER_MIME_TYPE.to_string()),
        parents: vec!["parent-root".to_string()],
    }
}

fn settings(staging: &TempDir) -> DriveSettings {
    DriveSettings {
        parent_folder_id: "parent-root".to_string(),
        subfolder: "TikTok Clips".to_string(),
        credentials_file: PathBuf::from("creds.json"),
        staging_dir: Some(staging.path().to_path_buf()),
    }
}

fn staging_is_empty(dir: &TempDir) -> bool {
    std::fs::read_dir(dir.path()).unwrap().next().is_none()
}

/// Yields `good` bytes, then fails.
struct BrokenReader {
    good: usize,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.good == 0 {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "stream dropped"));
        }
        let n = self.good.min(buf.len());
        buf[..n].fill(b'x');
        self.good -= n;
        Ok(n)
    }
}

#[tokio::test]
async fn existing_folder_is_reused_without_create() {
    let mut client = MockDriveClient::new();
    client
        .expect_list_files()
        .times(2)
        .withf(|q: &str| q.contains("name = 'Weekly'") && q.contains("'parent-root' in parents"))
        .returning(|_| Ok(vec![folder("folder-1", "Weekly"), folder("folder-2", "Weekly")]));
    client.expect_create_folder().never();

    let first = ensure_drive_subfolder(&client, "parent-root", "Weekly")
        .await
        .expect("lookup should succeed");
    let second = ensure_drive_subfolder(&client, "parent-root", "Weekly")
        .await
        .expect("lookup should succeed");

    assert_eq!(first, "folder-1", "first match wins");
    assert_eq!(first, second);
}

#[tokio::test]
async fn missing_folder_is_created_exactly_once() {
    let mut client = MockDriveClient::new();
    client.expect_list_files().times(1).returning(|_| Ok(vec![]));
    client
        .expect_create_folder()
        .times(1)
        .withf(|meta: &NewDriveFile| {
            meta.name == "Weekly"
                && meta.parents == vec!["parent-root".to_string()]
                && meta.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
        })
        .returning(|meta| Ok(folder("new-folder", &meta.name)));

    let id = ensure_drive_subfolder(&client, "parent-root", "Weekly")
        .await
        .expect("create should succeed");
    assert_eq!(id, "new-folder");
}

#[tokio::test]
async fn lookup_failure_surfaces_as_transport_error() {
    let mut client = MockDriveClient::new();
    client
        .expect_list_files()
        .returning(|_| Err(DriveError::Transport("503 backend unavailable".into())));
    client.expect_create_folder().never();

    let err = ensure_drive_subfolder(&client, "parent-root", "Weekly")
        .await
        .unwrap_err();
    assert!(matches!(err, DriveError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn successful_upload_returns_id_and_removes_staged_file() {
    let staging = tempdir().unwrap();
    let seen: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));

    let mut client = MockDriveClient::new();
    client
        .expect_list_files()
        .returning(|_| Ok(vec![folder("clips-folder", "TikTok Clips")]));
    let seen_in_mock = seen.clone();
    client
        .expect_upload_file()
        .times(1)
        .returning(move |path: &Path, meta: &NewDriveFile| {
            assert!(path.exists(), "staged file must exist during upload");
            assert_eq!(std::fs::read(path).unwrap(), b"\x89PNG fake image");
            assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
            assert_eq!(meta.name, "test_sample_image.png");
            assert_eq!(meta.parents, vec!["clips-folder".to_string()]);
            assert!(meta.mime_type.is_none());
            *seen_in_mock.lock().unwrap() = Some(path.to_path_buf());
            Ok(DriveFile {
                id: "uploaded-1".into(),
                name: meta.name.clone(),
                mime_type: Some("image/png".into()),
                parents: meta.parents.clone(),
            })
        });

    let mut stream: &[u8] = b"\x89PNG fake image";
    let id = upload_to_drive(&client, &settings(&staging), "test_sample_image.png", &mut stream)
        .await
        .expect("upload should succeed");

    assert_eq!(id, "uploaded-1");
    let staged = seen.lock().unwrap().clone().expect("upload_file was called");
    assert!(!staged.exists(), "staged file must be removed after success");
    assert!(staging_is_empty(&staging));
}

#[tokio::test]
async fn failed_upload_still_removes_staged_file() {
    let staging = tempdir().unwrap();
    let seen: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));

    let mut client = MockDriveClient::new();
    client
        .expect_list_files()
        .returning(|_| Ok(vec![folder("clips-folder", "TikTok Clips")]));
    let seen_in_mock = seen.clone();
    client.expect_upload_file().times(1).returning(move |path, _| {
        *seen_in_mock.lock().unwrap() = Some(path.to_path_buf());
        Err(DriveError::Transport("connection reset during chunk".into()))
    });

    let mut stream: &[u8] = b"video bytes";
    let err = upload_to_drive(&client, &settings(&staging), "clip.mp4", &mut stream)
        .await
        .unwrap_err();

    assert!(matches!(err, DriveError::Transport(_)), "got {err:?}");
    let staged = seen.lock().unwrap().clone().expect("upload_file was called");
    assert!(!staged.exists(), "staged file must be removed after failure");
    assert!(staging_is_empty(&staging));
}

#[tokio::test]
async fn stream_error_mid_copy_leaves_nothing_behind() {
    let staging = tempdir().unwrap();

    let mut client = MockDriveClient::new();
    client
        .expect_list_files()
        .returning(|_| Ok(vec![folder("clips-folder", "TikTok Clips")]));
    client.expect_upload_file().never();

    let mut stream = BrokenReader { good: 64 * 1024 };
    let err = upload_to_drive(&client, &settings(&staging), "clip.mp4", &mut stream)
        .await
        .unwrap_err();

    assert!(matches!(err, DriveError::Staging(_)), "got {err:?}");
    assert!(staging_is_empty(&staging));
}

#[tokio::test]
async fn folder_failure_aborts_before_staging() {
    let staging = tempdir().unwrap();

    let mut client = MockDriveClient::new();
    client.expect_list_files().returning(|_| Ok(vec![]));
    client
        .expect_create_folder()
        .returning(|_| Err(DriveError::Transport("403 insufficient permissions".into())));
    client.expect_upload_file().never();

    let mut stream: &[u8] = b"bytes";
    let err = upload_to_drive(&client, &settings(&staging), "clip.mp4", &mut stream)
        .await
        .unwrap_err();

    assert!(matches!(err, DriveError::Transport(_)));
    assert!(staging_is_empty(&staging));
}

#[tokio::test]
async fn subfolder_is_resolved_on_every_upload() {
    let staging = tempdir().unwrap();

    let mut client = MockDriveClient::new();
    client
        .expect_list_files()
        .times(2)
        .returning(|_| Ok(vec![folder("clips-folder", "TikTok Clips")]));
    client.expect_upload_file().times(2).returning(|_, meta| {
        Ok(DriveFile {
            id: format!("id-{}", meta.name),
            name: meta.name.clone(),
            mime_type: None,
            parents: meta.parents.clone(),
        })
    });

    let cfg = settings(&staging);
    let mut a: &[u8] = b"a";
    let mut b: &[u8] = b"b";
    assert_eq!(
        upload_to_drive(&client, &cfg, "a.mp4", &mut a).await.unwrap(),
        "id-a.mp4"
    );
    assert_eq!(
        upload_to_drive(&client, &cfg, "b.mp4", &mut b).await.unwrap(),
        "id-b.mp4"
    );
}
